use crate::{error::AnyError, wrappers};
use bytes::Bytes;
use prost::Message;
use serde::{Deserialize, Serialize};

// Minimal wire-compatible mirrors of google.protobuf's wrapper messages, used
// to encode primitives under the well-known wrapper type URLs without pulling
// in a full well-known-types crate.
#[derive(Clone, PartialEq, ::prost::Message)]
struct StringValue {
    #[prost(string, tag = "1")]
    value: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct Int32Value {
    #[prost(int32, tag = "1")]
    value: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct Int64Value {
    #[prost(int64, tag = "1")]
    value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct FloatValue {
    #[prost(float, tag = "1")]
    value: f32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct DoubleValue {
    #[prost(double, tag = "1")]
    value: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct BoolValue {
    #[prost(bool, tag = "1")]
    value: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct BytesValue {
    #[prost(bytes = "vec", tag = "1")]
    value: Vec<u8>,
}

/// A value tagged with its protobuf type URL, wire-encoded as bytes.
///
/// This is the unit of payload exchange between the host and user code: every
/// command payload, emitted event, reply message, and effect argument is an
/// `AnyValue`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyValue {
    pub type_url: String,
    #[serde(with = "serde_bytes_as_vec")]
    pub value: Bytes,
}

mod serde_bytes_as_vec {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(b: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        b.as_ref().to_vec().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        Ok(Bytes::from(Vec::<u8>::deserialize(d)?))
    }
}

impl AnyValue {
    pub fn new(type_url: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }

    /// Encode a generic prost message under its own full-name-derived type URL.
    pub fn encode<T: Message + prost::Name>(msg: &T) -> Self {
        Self {
            type_url: T::type_url(),
            value: Bytes::from(msg.encode_to_vec()),
        }
    }

    /// Decode into a generic prost message, failing if the type URL doesn't match.
    pub fn decode<T: Message + prost::Name + Default>(&self) -> Result<T, AnyError> {
        if self.type_url != T::type_url() {
            return Err(AnyError::UnknownType(self.type_url.clone()));
        }
        T::decode(self.value.clone()).map_err(|e| AnyError::SerializationError(e.to_string()))
    }

    pub fn encode_string(v: impl Into<String>) -> Self {
        let msg = StringValue { value: v.into() };
        Self::new(wrappers::STRING, msg.encode_to_vec())
    }

    pub fn decode_string(&self) -> Result<String, AnyError> {
        self.decode_wrapper(wrappers::STRING, |m: StringValue| m.value)
    }

    pub fn encode_i32(v: i32) -> Self {
        let msg = Int32Value { value: v };
        Self::new(wrappers::INT32, msg.encode_to_vec())
    }

    pub fn decode_i32(&self) -> Result<i32, AnyError> {
        self.decode_wrapper(wrappers::INT32, |m: Int32Value| m.value)
    }

    pub fn encode_i64(v: i64) -> Self {
        let msg = Int64Value { value: v };
        Self::new(wrappers::INT64, msg.encode_to_vec())
    }

    pub fn decode_i64(&self) -> Result<i64, AnyError> {
        self.decode_wrapper(wrappers::INT64, |m: Int64Value| m.value)
    }

    pub fn encode_f32(v: f32) -> Self {
        let msg = FloatValue { value: v };
        Self::new(wrappers::FLOAT, msg.encode_to_vec())
    }

    pub fn decode_f32(&self) -> Result<f32, AnyError> {
        self.decode_wrapper(wrappers::FLOAT, |m: FloatValue| m.value)
    }

    pub fn encode_f64(v: f64) -> Self {
        let msg = DoubleValue { value: v };
        Self::new(wrappers::DOUBLE, msg.encode_to_vec())
    }

    pub fn decode_f64(&self) -> Result<f64, AnyError> {
        self.decode_wrapper(wrappers::DOUBLE, |m: DoubleValue| m.value)
    }

    pub fn encode_bool(v: bool) -> Self {
        let msg = BoolValue { value: v };
        Self::new(wrappers::BOOL, msg.encode_to_vec())
    }

    pub fn decode_bool(&self) -> Result<bool, AnyError> {
        self.decode_wrapper(wrappers::BOOL, |m: BoolValue| m.value)
    }

    pub fn encode_bytes(v: impl Into<Vec<u8>>) -> Self {
        let msg = BytesValue { value: v.into() };
        Self::new(wrappers::BYTES, msg.encode_to_vec())
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, AnyError> {
        self.decode_wrapper(wrappers::BYTES, |m: BytesValue| m.value)
    }

    fn decode_wrapper<T: Message + Default, U>(
        &self,
        expected: &str,
        project: impl FnOnce(T) -> U,
    ) -> Result<U, AnyError> {
        if self.type_url != expected {
            return Err(AnyError::UnknownType(self.type_url.clone()));
        }
        T::decode(self.value.clone())
            .map(project)
            .map_err(|e| AnyError::SerializationError(e.to_string()))
    }

    /// Derive a canonical, deterministic comparable key: equal values (equal
    /// type URL and wire-identical bytes) always yield identical keys.
    pub fn to_comparable(&self) -> ComparableKey {
        let mut bytes = Vec::with_capacity(self.type_url.len() + self.value.len() + 8);
        bytes.extend_from_slice(&(self.type_url.len() as u32).to_be_bytes());
        bytes.extend_from_slice(self.type_url.as_bytes());
        bytes.extend_from_slice(&(self.value.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.value);
        ComparableKey(bytes)
    }
}

/// A canonical, totally-ordered, hashable key derived from an [`AnyValue`].
/// Used exclusively as a map/set index — never transmitted on the wire.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComparableKey(Vec<u8>);

impl ComparableKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
