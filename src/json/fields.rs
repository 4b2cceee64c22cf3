use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Serializes a root object (`{"customers": [...]}`), keeping only the
/// requested properties of each object in its collections.
///
/// `fields` is a comma separated, case-insensitive list. Blank means all
/// properties. Unknown names are ignored and the root keys are always kept.
pub fn serialize<T: Serialize>(root: &T, fields: &str) -> Result<String, ServiceError> {
    let mut value = serde_json::to_value(root)?;
    let wanted = parse_fields(fields);

    if !wanted.is_empty() {
        if let Value::Object(root_map) = &mut value {
            for child in root_map.values_mut() {
                match child {
                    Value::Array(items) => {
                        for item in items.iter_mut() {
                            retain_fields(item, &wanted);
                        }
                    }
                    Value::Object(_) => retain_fields(child, &wanted),
                    _ => {}
                }
            }
        }
    }

    Ok(serde_json::to_string(&value)?)
}

fn parse_fields(fields: &str) -> HashSet<String> {
    fields
        .split(',')
        .map(|f| f.trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

fn retain_fields(item: &mut Value, wanted: &HashSet<String>) {
    if let Value::Object(map) = item {
        let kept: Map<String, Value> = std::mem::take(map)
            .into_iter()
            .filter(|(key, _)| wanted.contains(&key.to_ascii_lowercase()))
            .collect();
        *map = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{CustomerDto, CustomersRootObject};
    use rstest::rstest;
    use serde_json::json;

    fn root() -> CustomersRootObject {
        CustomersRootObject {
            customers: vec![
                CustomerDto {
                    id: 1,
                    email: Some("a@example.com".into()),
                    username: Some("a".into()),
                    ..Default::default()
                },
                CustomerDto {
                    id: 2,
                    email: Some("b@example.com".into()),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn blank_fields_keep_everything() {
        let full = serialize(&root(), "").unwrap();
        assert_eq!(full, serde_json::to_string(&root()).unwrap());
    }

    #[rstest]
    #[case("id,email")]
    #[case(" ID , Email ")]
    #[case("id,email,no_such_field")]
    fn selection_keeps_only_requested_properties(#[case] fields: &str) {
        let out: Value = serde_json::from_str(&serialize(&root(), fields).unwrap()).unwrap();
        assert_eq!(
            out,
            json!({"customers": [
                {"id": 1, "email": "a@example.com"},
                {"id": 2, "email": "b@example.com"}
            ]})
        );
    }

    #[test]
    fn unknown_only_fields_leave_empty_objects() {
        let out: Value = serde_json::from_str(&serialize(&root(), "nope").unwrap()).unwrap();
        assert_eq!(out, json!({"customers": [{}, {}]}));
    }
}
