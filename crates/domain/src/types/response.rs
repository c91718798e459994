//! Response envelope
//!
//! Successful responses look like
//!
//! ```json
//! {
//!   "Response": [{"Token": {"id": 1, "token": "..."}}, {"UserPerson": {"id": 9}}],
//!   "Pagination": {"older_url": "/v1/user/9/payment?older_id=120", "newer_url": null}
//! }
//! ```
//!
//! Each element of `Response` wraps exactly one object under its type name.
//! Failed responses carry `{"Error": [{"error_description": "..."}]}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BunqError, BunqResult};

/// One typed object from the `Response` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiObject {
    /// Type name the object was wrapped in, e.g. `"UserPerson"`
    pub kind: String,
    pub fields: Value,
}

impl ApiObject {
    pub fn new(kind: impl Into<String>, fields: Value) -> Self {
        Self { kind: kind.into(), fields }
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn u64_field(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }
}

/// Pagination cursors; each is a server-rooted URL when present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub older_url: Option<String>,
    #[serde(default)]
    pub newer_url: Option<String>,
    #[serde(default)]
    pub future_url: Option<String>,
}

impl Pagination {
    /// Cursor to the next page of older items
    pub fn older(&self) -> Option<&str> {
        self.older_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Parsed response: ordered objects plus optional pagination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub objects: Vec<ApiObject>,
    pub pagination: Option<Pagination>,
}

impl ApiResponse {
    pub fn new(objects: Vec<ApiObject>) -> Self {
        Self { status: 200, objects, pagination: None }
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Parse a success envelope
    pub fn from_envelope(status: u16, body: Value) -> BunqResult<Self> {
        let Value::Object(mut root) = body else {
            return Err(BunqError::InvalidResponse("response body is not an object".into()));
        };

        let items = match root.remove("Response") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(BunqError::InvalidResponse("`Response` is not an array".into())),
            None => return Err(BunqError::InvalidResponse("missing `Response`".into())),
        };

        let objects = items
            .into_iter()
            .map(|item| match item {
                Value::Object(wrapper) if wrapper.len() == 1 => {
                    let (kind, fields) = wrapper.into_iter().next().ok_or_else(|| {
                        BunqError::InvalidResponse("empty response element".into())
                    })?;
                    Ok(ApiObject { kind, fields })
                }
                _ => Err(BunqError::InvalidResponse(
                    "response element must wrap exactly one typed object".into(),
                )),
            })
            .collect::<BunqResult<Vec<_>>>()?;

        let pagination = match root.remove("Pagination") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(serde_json::from_value(raw).map_err(|e| {
                BunqError::InvalidResponse(format!("malformed `Pagination`: {e}"))
            })?),
        };

        Ok(Self { status, objects, pagination })
    }

    /// Objects grouped by type name, each group in response order
    pub fn objects_by_type(&self) -> HashMap<&str, Vec<&ApiObject>> {
        let mut grouped: HashMap<&str, Vec<&ApiObject>> = HashMap::new();
        for object in &self.objects {
            grouped.entry(object.kind.as_str()).or_default().push(object);
        }
        grouped
    }

    /// First object of the given type
    pub fn first_of(&self, kind: &str) -> Option<&ApiObject> {
        self.objects.iter().find(|object| object.kind == kind)
    }

    pub fn older_cursor(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(Pagination::older)
    }
}

/// Human-readable message from an error envelope, if the body is one
pub fn error_description(body: &Value) -> Option<String> {
    let descriptions: Vec<&str> = body
        .get("Error")?
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("error_description").and_then(Value::as_str))
        .collect();

    if descriptions.is_empty() {
        None
    } else {
        Some(descriptions.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_objects_in_order() {
        let response = ApiResponse::from_envelope(
            200,
            json!({
                "Response": [
                    {"Id": {"id": 1}},
                    {"Token": {"id": 2, "token": "abc"}},
                    {"UserPerson": {"id": 9}}
                ]
            }),
        )
        .unwrap();

        let kinds: Vec<&str> = response.objects.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(kinds, ["Id", "Token", "UserPerson"]);
        assert_eq!(response.first_of("Token").and_then(|t| t.str_field("token")), Some("abc"));
        assert_eq!(response.first_of("UserPerson").and_then(|u| u.u64_field("id")), Some(9));
        assert!(response.pagination.is_none());
    }

    #[test]
    fn groups_by_type() {
        let response = ApiResponse::from_envelope(
            200,
            json!({"Response": [
                {"Payment": {"id": 1}},
                {"Payment": {"id": 2}},
                {"MonetaryAccountBank": {"id": 3}}
            ]}),
        )
        .unwrap();

        let grouped = response.objects_by_type();
        assert_eq!(grouped["Payment"].len(), 2);
        assert_eq!(grouped["Payment"][1].u64_field("id"), Some(2));
        assert_eq!(grouped["MonetaryAccountBank"].len(), 1);
    }

    #[test]
    fn reads_older_cursor() {
        let response = ApiResponse::from_envelope(
            200,
            json!({
                "Response": [],
                "Pagination": {
                    "older_url": "/v1/user/1/payment?older_id=10",
                    "newer_url": null,
                    "future_url": null
                }
            }),
        )
        .unwrap();
        assert_eq!(response.older_cursor(), Some("/v1/user/1/payment?older_id=10"));

        let last = ApiResponse::from_envelope(
            200,
            json!({"Response": [], "Pagination": {"older_url": null}}),
        )
        .unwrap();
        assert_eq!(last.older_cursor(), None);
    }

    #[test]
    fn rejects_malformed_envelopes() {
        for body in [
            json!([]),
            json!({"Nope": []}),
            json!({"Response": {}}),
            json!({"Response": [{"A": {}, "B": {}}]}),
            json!({"Response": [42]}),
        ] {
            let err = ApiResponse::from_envelope(200, body).unwrap_err();
            assert!(matches!(err, BunqError::InvalidResponse(_)));
        }
    }

    #[test]
    fn extracts_error_description() {
        let body = json!({"Error": [
            {"error_description": "Insufficient authorisation."},
            {"error_description": "Try again."}
        ]});
        assert_eq!(
            error_description(&body).as_deref(),
            Some("Insufficient authorisation.; Try again.")
        );
        assert_eq!(error_description(&json!({"Response": []})), None);
    }
}
