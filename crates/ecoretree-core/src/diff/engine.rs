//! Diff engine: `diff(current, baseline) -> ChangeSet`.

use serde_json::Value;

use crate::diff::model::ChangeSet;
use crate::model::payload::is_editable;
use crate::model::Payload;

/// Compute the fields of `current` that differ from `baseline`
///
/// Fields are visited in `current`'s order. A field is reported when its value
/// is not deep-equal to the baseline value under the same key. When both sides
/// are objects the nested change set is reported instead of the whole value,
/// and an object that differs only in excluded fields is not a change.
/// Fields present only in `baseline` are not reported.
pub fn diff(current: &Payload, baseline: &Payload) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for (field, value) in current {
        if !is_editable(field) {
            continue;
        }
        let previous = baseline.get(field);
        if previous == Some(value) {
            continue;
        }
        let change = match (value, previous) {
            (Value::Object(now), Some(Value::Object(before))) => {
                let nested = diff(now, before);
                if nested.is_empty() {
                    continue;
                }
                Value::Object(nested.as_payload().clone())
            }
            _ => value.clone(),
        };
        changes.insert(field.clone(), change);
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let p = payload(json!({"name": "Book", "abstract": false, "eType": {"$ref": "//X"}}));
        assert!(diff(&p, &p).is_empty());
    }

    #[test]
    fn test_diff_reports_in_current_order() {
        let baseline = payload(json!({"name": "A", "abstract": false, "interface": false}));
        let current = payload(json!({"interface": true, "name": "B", "abstract": false}));

        let changes = diff(&current, &baseline);
        let fields: Vec<_> = changes.fields().collect();
        assert_eq!(fields, vec!["interface", "name"]);
        assert_eq!(changes.first_field(), Some("interface"));
    }

    #[test]
    fn test_diff_skips_excluded_fields() {
        let baseline = payload(json!({"eClass": "a", "semanticUri": "//A", "name": "A"}));
        let current = payload(json!({"eClass": "b", "semanticUri": "//B", "name": "A", "id": "x"}));
        assert!(diff(&current, &baseline).is_empty());
    }

    #[test]
    fn test_diff_recurses_into_objects() {
        let baseline = payload(json!({"eType": {"eClass": "t", "$ref": "//EString"}}));
        let current = payload(json!({"eType": {"eClass": "t", "$ref": "//EInt"}}));

        let changes = diff(&current, &baseline);
        assert_eq!(changes.get("eType"), Some(&json!({"$ref": "//EInt"})));
    }

    #[test]
    fn test_diff_ignores_nested_excluded_fields() {
        let baseline = payload(json!({"eType": {"eClass": "X", "$ref": "//EString"}}));
        let current = payload(json!({"eType": {"eClass": "Y", "$ref": "//EString"}}));
        assert!(diff(&current, &baseline).is_empty());
    }

    #[test]
    fn test_diff_new_field_and_removed_field() {
        let baseline = payload(json!({"name": "A", "old": 1}));
        let current = payload(json!({"name": "A", "lowerBound": 1}));

        let changes = diff(&current, &baseline);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("lowerBound"), Some(&json!(1)));
    }

    #[test]
    fn test_diff_lists_compare_whole() {
        let baseline = payload(json!({"keys": [1, 2]}));
        let current = payload(json!({"keys": [1, 3]}));
        assert_eq!(diff(&current, &baseline).get("keys"), Some(&json!([1, 3])));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-zA-Z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_payload() -> impl Strategy<Value = Payload> {
        prop::collection::btree_map("[a-zA-Z]{1,8}", arb_value(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_diff_is_idempotent(p in arb_payload()) {
            prop_assert!(diff(&p, &p).is_empty());
        }

        #[test]
        fn prop_diff_never_reports_excluded(a in arb_payload(), b in arb_payload()) {
            let changes = diff(&a, &b);
            for field in changes.fields() {
                prop_assert!(is_editable(field));
            }
        }
    }
}
