//! Request and response bodies of the user API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::ValidateEmail;

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const LIST_RESPONSE_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
pub const RESOURCE_TYPE: &str = "User";

/// Base URL used for `meta.location` when none is configured
pub const DEFAULT_BASE_URL: &str = "https://api.us.workdayspend.com/scim/v2";

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;

pub fn is_email(candidate: &str) -> bool {
    candidate.validate_email()
}

/// Deserialize a present field as `Some`, even when it is `null`.
///
/// Combined with `#[serde(default)]` this tells a missing key (`None`) apart
/// from an explicit `null` (`Some(Value::Null)` / `Some(None)`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NameInput {
    pub given_name: String,
    pub family_name: String,
}

impl NameInput {
    fn validate(&self) -> Result<(), String> {
        if self.given_name.trim().is_empty() {
            return Err("name.givenName cannot be empty".into());
        }
        if self.family_name.trim().is_empty() {
            return Err("name.familyName cannot be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleInput {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

/// PUT body: the full set of updatable attributes.
///
/// `externalId` and `active` are only written when present in the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReplaceRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub external_id: Option<Option<String>>,
    pub user_name: String,
    pub name: NameInput,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ReplaceRequest {
    pub fn from_value(body: &Value) -> Result<Self, String> {
        let request: Self = parse_body(body)?;
        if !is_email(&request.user_name) {
            return Err(format!(
                "userName '{}' is not a valid email address",
                request.user_name
            ));
        }
        request.name.validate()?;
        Ok(request)
    }
}

/// POST body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(default)]
    pub schemas: Option<Vec<String>>,
    #[serde(default)]
    pub external_id: Option<String>,
    pub user_name: String,
    pub name: NameInput,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub roles: Option<Vec<RoleInput>>,
}

impl CreateRequest {
    pub fn from_value(body: &Value) -> Result<Self, String> {
        let request: Self = parse_body(body)?;

        if let Some(schemas) = &request.schemas {
            if schemas.is_empty() {
                return Err("schemas cannot be empty".into());
            }
            if !schemas.iter().any(|s| s == USER_SCHEMA) {
                return Err(format!("schemas must include '{USER_SCHEMA}'"));
            }
        }
        if !is_email(&request.user_name) {
            return Err(format!(
                "userName '{}' is not a valid email address",
                request.user_name
            ));
        }
        request.name.validate()?;
        let roles = request.roles.as_deref().unwrap_or_default();
        if roles.iter().any(|r| r.value.trim().is_empty()) {
            return Err("roles[].value cannot be empty".into());
        }

        Ok(request)
    }
}

fn parse_body<T: DeserializeOwned>(body: &Value) -> Result<T, String> {
    if !body.is_object() {
        return Err(format!(
            "request body must be an object, got {}",
            crate::scim::value::kind(body)
        ));
    }
    T::deserialize(body).map_err(|e| e.to_string())
}

/// Sort direction for list requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// `descending` (any case) sorts descending; anything else ascending
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("descending") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

/// Query parameters of a list request
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub attributes: Option<String>,
    /// 1-based index of the first result
    pub start_index: Option<i64>,
    pub count: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

/// SCIM list envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub schemas: Vec<String>,
    pub total_results: usize,
    pub start_index: usize,
    pub items_per_page: usize,
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ListResponse {
    pub fn new(total_results: usize, start_index: usize, resources: Vec<Value>) -> Self {
        Self {
            schemas: vec![LIST_RESPONSE_SCHEMA.to_string()],
            total_results,
            start_index,
            items_per_page: resources.len(),
            resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email() {
        assert!(is_email("jdoe@x.com"));
        assert!(is_email("Jane.Doe+test@Example.org"));
        assert!(!is_email("jdoe"));
        assert!(!is_email("jdoe@"));
        assert!(!is_email(""));
    }

    #[test]
    fn test_replace_request_external_id_presence() {
        let absent = ReplaceRequest::from_value(&json!({
            "userName": "a@x.com",
            "name": {"givenName": "A", "familyName": "B"}
        }))
        .unwrap();
        assert_eq!(absent.external_id, None);
        assert_eq!(absent.active, None);

        let null = ReplaceRequest::from_value(&json!({
            "externalId": null,
            "userName": "a@x.com",
            "name": {"givenName": "A", "familyName": "B"}
        }))
        .unwrap();
        assert_eq!(null.external_id, Some(None));
    }

    #[test]
    fn test_replace_request_rejects() {
        let name = json!({"givenName": "A", "familyName": "B"});
        assert!(ReplaceRequest::from_value(&json!([])).is_err());
        assert!(ReplaceRequest::from_value(&json!({"userName": "a@x.com"})).is_err());
        assert!(
            ReplaceRequest::from_value(&json!({"userName": "nope", "name": name.clone()})).is_err()
        );
        assert!(
            ReplaceRequest::from_value(
                &json!({"userName": "a@x.com", "name": name.clone(), "roles": []})
            )
            .is_err()
        );
        assert!(
            ReplaceRequest::from_value(&json!({
                "userName": "a@x.com",
                "name": {"givenName": " ", "familyName": "B"}
            }))
            .is_err()
        );
        assert!(
            ReplaceRequest::from_value(
                &json!({"userName": "a@x.com", "name": name.clone(), "active": "yes"})
            )
            .is_err()
        );
    }

    #[test]
    fn test_create_request_schemas() {
        let body = |schemas: Value| {
            json!({
                "schemas": schemas,
                "userName": "a@x.com",
                "name": {"givenName": "A", "familyName": "B"}
            })
        };
        assert!(CreateRequest::from_value(&body(json!([USER_SCHEMA]))).is_ok());
        assert!(CreateRequest::from_value(&body(json!([]))).is_err());
        assert!(CreateRequest::from_value(&body(json!(["urn:other"]))).is_err());
        assert!(CreateRequest::from_value(&body(json!([1]))).is_err());
    }

    #[test]
    fn test_create_request_roles() {
        let request = CreateRequest::from_value(&json!({
            "userName": "a@x.com",
            "name": {"givenName": "A", "familyName": "B"},
            "roles": [{"value": "admin", "type": "system", "primary": true}]
        }))
        .unwrap();
        let roles = request.roles.unwrap();
        assert_eq!(roles[0].kind.as_deref(), Some("system"));

        assert!(
            CreateRequest::from_value(&json!({
                "userName": "a@x.com",
                "name": {"givenName": "A", "familyName": "B"},
                "roles": [{"value": "admin", "level": 3}]
            }))
            .is_err()
        );
    }

    #[test]
    fn test_sort_order_param() {
        assert_eq!(SortOrder::from_param("DESCENDING"), SortOrder::Descending);
        assert_eq!(SortOrder::from_param("ascending"), SortOrder::Ascending);
        assert_eq!(SortOrder::from_param("sideways"), SortOrder::Ascending);
    }

    #[test]
    fn test_list_response_shape() {
        let response = ListResponse::new(3, 1, vec![json!({"id": "1"})]);
        let rendered = serde_json::to_value(&response).unwrap();
        assert_eq!(rendered["schemas"], json!([LIST_RESPONSE_SCHEMA]));
        assert_eq!(rendered["totalResults"], 3);
        assert_eq!(rendered["itemsPerPage"], 1);
        assert_eq!(rendered["Resources"][0]["id"], "1");
    }
}
