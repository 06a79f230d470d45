//! Element codecs.
//!
//! A codec maps client-visible elements to the opaque payloads stored in the
//! partitioned map. [`BinaryCodec`] passes payloads through untouched; the
//! typed codecs serialize with `serde_json` or `postcard`.
//!
//! Nullness is defined per codec: an empty payload for the binary codec, and a
//! value that serializes as `null` (for example `None`) for typed codecs.

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Converts elements to and from stored payloads.
pub trait ValueCodec: Send + Sync + 'static {
    /// Client-visible element type.
    type Value: Clone + Send + Sync + 'static;

    /// Encode an element.
    fn encode(&self, value: &Self::Value) -> Result<Bytes>;

    /// Decode a stored payload.
    fn decode(&self, bytes: &Bytes) -> Result<Self::Value>;

    /// Whether `value` is the null element, which queues refuse to store.
    fn is_null(&self, value: &Self::Value) -> bool;
}

/// Identity codec over raw payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl ValueCodec for BinaryCodec {
    type Value = Bytes;

    fn encode(&self, value: &Bytes) -> Result<Bytes> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &Bytes) -> Result<Bytes> {
        Ok(bytes.clone())
    }

    fn is_null(&self, value: &Bytes) -> bool {
        value.is_empty()
    }
}

fn serializes_as_null<T: Serialize>(value: &T) -> bool {
    matches!(serde_json::to_value(value), Ok(serde_json::Value::Null))
}

/// JSON codec for any serde type.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a JSON codec.
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> ValueCodec for JsonCodec<T>
where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, bytes: &Bytes) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn is_null(&self, value: &T) -> bool {
        serializes_as_null(value)
    }
}

/// Postcard codec for any serde type.
pub struct PostcardCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> PostcardCodec<T> {
    /// Create a postcard codec.
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for PostcardCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PostcardCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PostcardCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostcardCodec")
    }
}

impl<T> ValueCodec for PostcardCodec<T>
where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(postcard::to_stdvec(value)?))
    }

    fn decode(&self, bytes: &Bytes) -> Result<T> {
        Ok(postcard::from_bytes(bytes)?)
    }

    fn is_null(&self, value: &T) -> bool {
        serializes_as_null(value)
    }
}

/// Serialization format selector for typed queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// `serde_json`.
    #[default]
    Json,
    /// `postcard`.
    Postcard,
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Json => f.write_str("json"),
            CodecKind::Postcard => f.write_str("postcard"),
        }
    }
}

/// Typed codec whose format is chosen at runtime.
pub enum TypedCodec<T> {
    /// JSON encoding.
    Json(JsonCodec<T>),
    /// Postcard encoding.
    Postcard(PostcardCodec<T>),
}

impl<T> TypedCodec<T> {
    /// Codec for `kind`.
    pub const fn of(kind: CodecKind) -> Self {
        match kind {
            CodecKind::Json => TypedCodec::Json(JsonCodec::new()),
            CodecKind::Postcard => TypedCodec::Postcard(PostcardCodec::new()),
        }
    }

    /// Selected format.
    pub const fn kind(&self) -> CodecKind {
        match self {
            TypedCodec::Json(_) => CodecKind::Json,
            TypedCodec::Postcard(_) => CodecKind::Postcard,
        }
    }
}

impl<T> Default for TypedCodec<T> {
    fn default() -> Self {
        Self::of(CodecKind::default())
    }
}

impl<T> fmt::Debug for TypedCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedCodec({})", self.kind())
    }
}

impl<T> ValueCodec for TypedCodec<T>
where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Bytes> {
        match self {
            TypedCodec::Json(codec) => codec.encode(value),
            TypedCodec::Postcard(codec) => codec.encode(value),
        }
    }

    fn decode(&self, bytes: &Bytes) -> Result<T> {
        match self {
            TypedCodec::Json(codec) => codec.decode(bytes),
            TypedCodec::Postcard(codec) => codec.decode(bytes),
        }
    }

    fn is_null(&self, value: &T) -> bool {
        serializes_as_null(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u32,
        sku: String,
    }

    #[test]
    fn test_binary_null_is_empty() {
        assert!(BinaryCodec.is_null(&Bytes::new()));
        assert!(!BinaryCodec.is_null(&Bytes::from_static(b"x")));
    }

    #[test]
    fn test_typed_null_is_none() {
        let codec = TypedCodec::<Option<String>>::of(CodecKind::Postcard);
        assert!(codec.is_null(&None));
        assert!(!codec.is_null(&Some(String::new())));
    }

    #[test]
    fn test_structs_are_never_null() {
        let codec = JsonCodec::<Order>::new();
        assert!(!codec.is_null(&Order {
            id: 1,
            sku: "a".into()
        }));
    }

    #[test]
    fn test_formats_differ_on_the_wire() {
        let order = Order {
            id: 7,
            sku: "widget".into(),
        };
        let json = TypedCodec::<Order>::of(CodecKind::Json).encode(&order).unwrap();
        let postcard = TypedCodec::<Order>::of(CodecKind::Postcard).encode(&order).unwrap();
        assert_eq!(&json[..], br#"{"id":7,"sku":"widget"}"#);
        assert_ne!(json, postcard);
    }

    #[test]
    fn test_decode_garbage_is_a_representation_error() {
        let err = JsonCodec::<Order>::new().decode(&Bytes::from_static(b"{")).unwrap_err();
        assert!(err.is_representation());
    }

    #[test]
    fn test_codec_kind_serde_names() {
        assert_eq!(serde_json::to_string(&CodecKind::Postcard).unwrap(), r#""postcard""#);
        assert_eq!(CodecKind::Json.to_string(), "json");
    }
}
