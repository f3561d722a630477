use proptest::prelude::*;

use crate::{
    sign::{SIGN_FIELD, SignType, sign, verify},
    value::{ParamMap, Value},
};

fn sign_type() -> impl Strategy<Value = SignType> {
    prop_oneof![Just(SignType::Md5), Just(SignType::HmacSha256)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_signature_independent_of_insertion_order(
        fields in prop::collection::vec(("[a-z_]{1,12}", "[a-zA-Z0-9]{0,16}"), 0..12),
        key in "[a-zA-Z0-9]{32}",
        sign_type in sign_type(),
    ) {
        let forward: ParamMap = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();

        let mut reversed = ParamMap::new();
        for (k, v) in fields.iter().rev() {
            // keep the last-inserted value per key, same as `forward`
            reversed.entry(k.clone()).or_insert_with(|| Value::from(v.as_str()));
        }

        prop_assert_eq!(
            sign(&forward, &key, sign_type).unwrap(),
            sign(&reversed, &key, sign_type).unwrap()
        );
    }

    #[test]
    fn test_empty_field_never_changes_signature(
        fields in prop::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9]{1,16}", 0..12),
        extra in "[a-z_]{1,12}",
        key in "[a-zA-Z0-9]{32}",
        sign_type in sign_type(),
    ) {
        prop_assume!(!fields.contains_key(&extra));

        let params: ParamMap = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        let mut with_empty = params.clone();
        with_empty.insert(extra, Value::from(""));

        prop_assert_eq!(
            sign(&params, &key, sign_type).unwrap(),
            sign(&with_empty, &key, sign_type).unwrap()
        );
    }

    #[test]
    fn test_signed_reply_verifies(
        fields in prop::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9]{0,16}", 0..12),
        key in "[a-zA-Z0-9]{32}",
        sign_type in sign_type(),
    ) {
        let mut reply: ParamMap = fields
            .into_iter()
            .filter(|(k, _)| k != SIGN_FIELD)
            .map(|(k, v)| (k, Value::from(v)))
            .collect();
        let signature = sign(&reply, &key, sign_type).unwrap();
        reply.insert(SIGN_FIELD.to_owned(), Value::from(signature));

        prop_assert!(verify(&reply, &key, sign_type).unwrap());
    }
}
