use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ApiError;

/// Copies the fields of a partial payload onto an entity.
pub trait MergeInto<E> {
    /// Only keys in `present` may change `target`.
    fn merge_into(&self, present: &HashSet<String>, target: &mut E);
}

/// A deserialized payload together with the JSON keys the client actually
/// sent, so partial updates leave absent fields untouched.
#[derive(Debug, Clone)]
pub struct Delta<T> {
    dto: T,
    present: HashSet<String>,
}

impl<T: DeserializeOwned> Delta<T> {
    /// Parses `{"<root>": {...}}`.
    pub fn from_json(body: &[u8], root: &str) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request("json", format!("Invalid JSON: {e}")))?;
        Self::from_value(value, root)
    }

    pub fn from_value(mut value: Value, root: &str) -> Result<Self, ApiError> {
        let inner = value
            .get_mut(root)
            .map(Value::take)
            .ok_or_else(|| ApiError::bad_request(root, format!("{root} is required")))?;

        let present = match &inner {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => {
                return Err(ApiError::bad_request(
                    root,
                    format!("{root} must be a JSON object"),
                ))
            }
        };

        let dto = serde_json::from_value(inner)
            .map_err(|e| ApiError::bad_request(root, format!("Invalid {root}: {e}")))?;
        Ok(Self { dto, present })
    }
}

impl<T> Delta<T> {
    pub fn dto(&self) -> &T {
        &self.dto
    }

    pub fn dto_mut(&mut self) -> &mut T {
        &mut self.dto
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.present.contains(key)
    }

    pub fn merge<E>(&self, target: &mut E)
    where
        T: MergeInto<E>,
    {
        self.dto.merge_into(&self.present, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CustomerDto;
    use assert_matches::assert_matches;
    use axum::http::StatusCode;

    #[test]
    fn tracks_present_keys() {
        let delta = Delta::<CustomerDto>::from_json(
            br#"{"customer": {"email": "a@b.com", "admin_comment": null}}"#,
            "customer",
        )
        .unwrap();
        assert!(delta.is_present("email"));
        assert!(delta.is_present("admin_comment"));
        assert!(!delta.is_present("username"));
        assert_eq!(delta.dto().email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn missing_root_is_a_bad_request() {
        let err = Delta::<CustomerDto>::from_json(br#"{"client": {}}"#, "customer").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_matches!(err, ApiError::Field { ref key, .. } if key == "customer");
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let err = Delta::<CustomerDto>::from_json(b"{not json", "customer").unwrap_err();
        assert_matches!(err, ApiError::Field { ref key, .. } if key == "json");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = Delta::<CustomerDto>::from_json(
            br#"{"customer": {"active": "yes"}}"#,
            "customer",
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
