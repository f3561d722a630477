use proptest::prelude::*;

use crate::{
    value::{ParamMap, Value},
    xml::{ROOT, decode, encode},
};

fn flat_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9_.-]{1,24}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_flat_map_round_trip(
        params in prop::collection::btree_map("[a-z][a-z0-9_]{0,15}", flat_value(), 0..16),
    ) {
        let params: ParamMap = params;
        let decoded = decode(&encode(ROOT, &params)).unwrap();

        let expected: ParamMap = params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.to_wire_text())))
            .collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn test_repeated_tag_folds_to_all(
        items in prop::collection::vec("[a-z0-9]{1,8}", 2..8),
    ) {
        let mut params = ParamMap::new();
        params.insert(
            "item".to_owned(),
            Value::List(items.iter().map(|s| Value::from(s.as_str())).collect()),
        );

        let decoded = decode(&crate::xml::write_document(ROOT, &params)).unwrap();
        prop_assert!(!decoded.contains_key("item"));
        prop_assert_eq!(decoded["item_all"].as_list().map(<[Value]>::len), Some(items.len()));
    }
}
