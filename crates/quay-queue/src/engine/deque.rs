//! Double-ended operations.

use async_trait::async_trait;
use quay_constants::position::APPEND_FAILED_ID;
use quay_store::EntryFilter;
use quay_store::QueueEnd;
use quay_store::QueueProcessor;
use quay_store::QueueStore;
use tracing::debug;

use super::End;
use super::StoreQueue;
use crate::codec::ValueCodec;
use crate::error::Result;
use crate::iterator::PagedIterator;
use crate::traits::NamedDeque;
use crate::traits::QueueCursor;

impl<S, C> StoreQueue<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    async fn remove_occurrence(&self, value: &C::Value, end: QueueEnd) -> Result<bool> {
        if self.codec.is_null(value) {
            return Ok(false);
        }
        let payload = self.codec.encode(value)?;
        let results = self
            .store
            .invoke_filtered(self.hash, EntryFilter::ValueEquals(payload), QueueProcessor::RemoveOccurrence { end })
            .await?;

        let mut removed = false;
        for (key, result) in results {
            if result.into_removed()? {
                debug!(queue = %self.name, %key, ?end, "occurrence removed");
                removed = true;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl<S, C> NamedDeque for StoreQueue<S, C>
where
    S: QueueStore + ?Sized + 'static,
    C: ValueCodec,
{
    async fn prepend(&self, value: C::Value) -> Result<i64> {
        let result = self.offer_at(End::Head, &value, "prepend").await?;
        Ok(if result.is_success() { result.id } else { APPEND_FAILED_ID })
    }

    async fn add_first(&self, value: C::Value) -> Result<()> {
        self.add_at(End::Head, &value, "add_first").await
    }

    async fn add_last(&self, value: C::Value) -> Result<()> {
        self.add_at(End::Tail, &value, "add_last").await
    }

    async fn offer_first(&self, value: C::Value) -> Result<bool> {
        Ok(self.offer_at(End::Head, &value, "offer_first").await?.is_success())
    }

    async fn offer_last(&self, value: C::Value) -> Result<bool> {
        Ok(self.offer_at(End::Tail, &value, "offer_last").await?.is_success())
    }

    async fn peek_first(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Head, false).await
    }

    async fn peek_last(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Tail, false).await
    }

    async fn get_first(&self) -> Result<C::Value> {
        self.require_at(End::Head, false).await
    }

    async fn get_last(&self) -> Result<C::Value> {
        self.require_at(End::Tail, false).await
    }

    async fn poll_first(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Head, true).await
    }

    async fn poll_last(&self) -> Result<Option<C::Value>> {
        self.read_at(End::Tail, true).await
    }

    async fn remove_first(&self) -> Result<C::Value> {
        self.require_at(End::Head, true).await
    }

    async fn remove_last(&self) -> Result<C::Value> {
        self.require_at(End::Tail, true).await
    }

    async fn remove_first_occurrence(&self, value: &C::Value) -> Result<bool> {
        self.remove_occurrence(value, QueueEnd::Head).await
    }

    async fn remove_last_occurrence(&self, value: &C::Value) -> Result<bool> {
        self.remove_occurrence(value, QueueEnd::Tail).await
    }

    fn descending_iter(&self) -> Box<dyn QueueCursor<Item = C::Value>> {
        Box::new(PagedIterator::backward(
            self.store.clone(),
            self.codec.clone(),
            self.hash,
            self.options.page_size,
        ))
    }
}
