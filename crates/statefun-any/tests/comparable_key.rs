//! Property: a comparable key derived from an `AnyValue` is stable — equal
//! values (same type URL, same wire bytes) always yield identical keys,
//! regardless of how many times they're re-derived or re-encoded.

use proptest::prelude::*;
use statefun_any::AnyValue;

fn any_value_strategy() -> impl Strategy<Value = AnyValue> {
    (
        prop::sample::select(vec![
            "type.googleapis.com/google.protobuf.StringValue",
            "type.googleapis.com/google.protobuf.Int64Value",
            "type.googleapis.com/com.example.Custom",
        ]),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(type_url, bytes)| AnyValue::new(type_url, bytes))
}

proptest! {
    #[test]
    fn equal_values_yield_identical_keys(v in any_value_strategy()) {
        let a = v.to_comparable();
        let b = v.clone().to_comparable();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn distinct_type_urls_never_collide_for_the_same_bytes(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let a = AnyValue::new("type.googleapis.com/google.protobuf.StringValue", bytes.clone());
        let b = AnyValue::new("type.googleapis.com/google.protobuf.Int64Value", bytes);
        prop_assert_ne!(a.to_comparable(), b.to_comparable());
    }
}

#[test]
fn primitive_round_trips_preserve_equal_keys() {
    let a = AnyValue::encode_i64(42);
    let b = AnyValue::encode_i64(42);
    assert_eq!(a.to_comparable(), b.to_comparable());

    let c = AnyValue::encode_i64(43);
    assert_ne!(a.to_comparable(), c.to_comparable());
}
