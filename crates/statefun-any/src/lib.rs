//! Any-Support: encode/decode arbitrary message values to/from a type-URL-tagged
//! byte blob, and derive a canonical comparable key for use as a map/set index.

mod descriptor;
mod error;
mod value;

pub use descriptor::DescriptorPool;
pub use error::AnyError;
pub use value::{AnyValue, ComparableKey};

/// Well-known type URLs reserved by the framework for primitive values.
pub mod wrappers {
    pub const STRING: &str = "type.googleapis.com/google.protobuf.StringValue";
    pub const INT32: &str = "type.googleapis.com/google.protobuf.Int32Value";
    pub const INT64: &str = "type.googleapis.com/google.protobuf.Int64Value";
    pub const FLOAT: &str = "type.googleapis.com/google.protobuf.FloatValue";
    pub const DOUBLE: &str = "type.googleapis.com/google.protobuf.DoubleValue";
    pub const BOOL: &str = "type.googleapis.com/google.protobuf.BoolValue";
    pub const BYTES: &str = "type.googleapis.com/google.protobuf.BytesValue";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trip() {
        let v = AnyValue::encode_string("hello");
        assert_eq!(v.type_url, wrappers::STRING);
        assert_eq!(v.decode_string().unwrap(), "hello");
    }

    #[test]
    fn comparable_key_stable_across_clones() {
        let a = AnyValue::encode_i64(42);
        let b = a.clone();
        assert_eq!(a.to_comparable(), b.to_comparable());
    }

    #[test]
    fn comparable_key_distinguishes_type_url() {
        let a = AnyValue::encode_i64(1);
        let b = AnyValue {
            type_url: "type.googleapis.com/other.Thing".to_string(),
            value: a.value.clone(),
        };
        assert_ne!(a.to_comparable(), b.to_comparable());
    }
}
