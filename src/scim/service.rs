//! User resource service
//!
//! Orchestrates the engine around a [`ResourceStore`]: validation first,
//! then lookup, then copy-then-commit mutation and response projection.
//! Every failure before the final commit leaves the store untouched.

use crate::clock::{Clock, SystemClock, format_timestamp};
use crate::config::ScimConfig;
use crate::error::{ScimError, ScimResult, StoreError};
use crate::scim::filter::{self, FilterNode};
use crate::scim::hooks::{Change, HookChain};
use crate::scim::meta;
use crate::scim::models::{
    CreateRequest, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, ListQuery, ListResponse, MAX_PAGE_SIZE,
    RESOURCE_TYPE, ReplaceRequest, SortOrder, USER_SCHEMA,
};
use crate::scim::patch::{PatchApplier, PatchRequest};
use crate::scim::selector::{parse_selector, project};
use crate::scim::value::kind;
use crate::store::{InMemoryStore, ResourceStore};
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

pub struct UserService<S> {
    store: S,
    clock: Box<dyn Clock>,
    hooks: HookChain,
    base_url: String,
}

impl<S: ResourceStore> UserService<S> {
    /// Service with the wall clock, the standard business rules and the
    /// default base URL
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            hooks: HookChain::standard(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search users: filter, sort, paginate, project.
    #[instrument(skip(self, query), fields(filter = ?query.filter))]
    pub fn list(&self, query: &ListQuery) -> ScimResult<ListResponse> {
        let selection = parse_selector(query.attributes.as_deref())?;
        let filter = parse_filter(query.filter.as_deref())?;

        let mut users: Vec<Value> = self
            .store
            .all()
            .into_iter()
            .filter(|user| filter.as_ref().is_none_or(|f| filter::evaluate(f, user)))
            .collect();

        if let Some(sort_by) = query.sort_by.as_deref() {
            sort_users(&mut users, sort_by, query.sort_order);
        }

        let total = users.len();
        let start_index = query.start_index.unwrap_or(1).max(1);
        let count = query
            .count
            .map(|c| c.clamp(0, MAX_PAGE_SIZE as i64) as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let skip = usize::try_from(start_index - 1).unwrap_or(usize::MAX);

        let page: Vec<Value> = users
            .iter()
            .skip(skip)
            .take(count)
            .map(|user| project(user, &selection))
            .collect();

        debug!(total, returned = page.len(), "Listed users");
        Ok(ListResponse::new(
            total,
            usize::try_from(start_index).unwrap_or(usize::MAX),
            page,
        ))
    }

    /// Fetch one user. `None` when it does not exist or fails `filter`.
    #[instrument(skip(self))]
    pub fn get(
        &self,
        id: &str,
        attributes: Option<&str>,
        filter: Option<&str>,
    ) -> ScimResult<Option<Value>> {
        check_id(id)?;
        let selection = parse_selector(attributes)?;
        let filter = parse_filter(filter)?;

        let Some(user) = self.store.find(id) else {
            debug!("User not found");
            return Ok(None);
        };
        if filter.as_ref().is_some_and(|f| !filter::evaluate(f, &user)) {
            debug!("User did not match filter");
            return Ok(None);
        }

        Ok(Some(project(&user, &selection)))
    }

    /// Create a user from a POST body
    #[instrument(skip(self, body))]
    pub fn create(&mut self, body: &Value, attributes: Option<&str>) -> ScimResult<Value> {
        let selection = parse_selector(attributes)?;
        let request = CreateRequest::from_value(body).map_err(ScimError::CreateValidation)?;
        self.ensure_unique(&request.user_name, None)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = format_timestamp(self.clock.now());
        let roles = request.roles.unwrap_or_default();

        let user = json!({
            "schemas": request.schemas.unwrap_or_else(|| vec![USER_SCHEMA.to_string()]),
            "id": id,
            "externalId": request.external_id,
            "userName": request.user_name,
            "name": request.name,
            "active": request.active.unwrap_or(true),
            "roles": roles,
            "meta": {
                "resourceType": RESOURCE_TYPE,
                "created": now,
                "lastModified": now,
                "location": meta::location(&self.base_url, &id),
            }
        });

        self.store
            .insert(user.clone())
            .map_err(|e| ScimError::CreateOperation { source: e.into() })?;

        info!(id = %id, "Created user");
        Ok(project(&user, &selection))
    }

    /// Apply a PATCH body
    #[instrument(skip(self, body))]
    pub fn patch(
        &mut self,
        id: &str,
        body: &Value,
        attributes: Option<&str>,
    ) -> ScimResult<Option<Value>> {
        check_id(id)?;
        let selection = parse_selector(attributes)?;
        let request = PatchRequest::from_value(body)?;

        let Some(current) = self.store.find(id) else {
            debug!("User not found");
            return Ok(None);
        };
        let current = into_object(id, current)
            .map_err(|e| ScimError::PatchOperation { source: e.into() })?;

        let mut patched = PatchApplier::new(&self.hooks).apply(&current, &request)?;

        let committed = self
            .commit(id, &mut patched)
            .map_err(|e| ScimError::PatchOperation { source: e.into() })?;

        info!(operations = request.operations.len(), "Patched user");
        Ok(Some(project(&committed, &selection)))
    }

    /// Replace the updatable attributes from a PUT body
    #[instrument(skip(self, body))]
    pub fn put(
        &mut self,
        id: &str,
        body: &Value,
        attributes: Option<&str>,
    ) -> ScimResult<Option<Value>> {
        check_id(id)?;
        let selection = parse_selector(attributes)?;
        let request = ReplaceRequest::from_value(body).map_err(ScimError::UpdateValidation)?;

        let Some(current) = self.store.find(id) else {
            debug!("User not found");
            return Ok(None);
        };
        let current = into_object(id, current)
            .map_err(|e| ScimError::UpdateOperation { source: e.into() })?;

        let mut proposed = current.clone();
        let mut touched = vec!["userName".to_string(), "name".to_string()];
        proposed.insert("userName".into(), Value::String(request.user_name.clone()));
        proposed.insert("name".into(), json!(request.name));
        if let Some(external_id) = request.external_id {
            proposed.insert("externalId".into(), json!(external_id));
            touched.push("externalId".into());
        }
        if let Some(active) = request.active {
            proposed.insert("active".into(), Value::Bool(active));
            touched.push("active".into());
        }

        let change = Change {
            before: &current,
            after: &proposed,
            touched: &touched,
        };
        self.hooks
            .check(&change)
            .map_err(ScimError::UpdateForbidden)?;
        self.ensure_unique(&request.user_name, Some(id))?;

        let committed = self
            .commit(id, &mut proposed)
            .map_err(|e| ScimError::UpdateOperation { source: e.into() })?;

        info!("Replaced user");
        Ok(Some(project(&committed, &selection)))
    }

    /// Deactivate a user. `false` when it does not exist.
    ///
    /// Administrative deactivation is not subject to the self-deactivation
    /// rule.
    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> ScimResult<bool> {
        check_id(id)?;

        let Some(current) = self.store.find(id) else {
            debug!("User not found");
            return Ok(false);
        };
        let mut user = into_object(id, current)
            .map_err(|e| ScimError::DeleteOperation { source: e.into() })?;

        user.insert("active".into(), Value::Bool(false));
        self.commit(id, &mut user)
            .map_err(|e| ScimError::DeleteOperation { source: e.into() })?;

        info!("Deactivated user");
        Ok(true)
    }

    /// Stamp `meta` and write the resource back
    fn commit(&mut self, id: &str, user: &mut Map<String, Value>) -> Result<Value, StoreError> {
        let now = format_timestamp(self.clock.now());
        meta::stamp(user, &now, &meta::location(&self.base_url, id));

        let user = Value::Object(std::mem::take(user));
        self.store.replace(id, user.clone())?;
        Ok(user)
    }

    /// No user other than `except` may hold `user_name`, ignoring case
    fn ensure_unique(&self, user_name: &str, except: Option<&str>) -> ScimResult<()> {
        let wanted = user_name.to_lowercase();
        let taken = self.store.all().iter().any(|user| {
            let same_name = user
                .get("userName")
                .and_then(Value::as_str)
                .is_some_and(|existing| existing.to_lowercase() == wanted);
            let is_self = except.is_some() && user.get("id").and_then(Value::as_str) == except;
            same_name && !is_self
        });

        if taken {
            warn!(user_name, "Duplicate userName");
            return Err(ScimError::Conflict {
                user_name: user_name.to_string(),
            });
        }
        Ok(())
    }
}

impl UserService<InMemoryStore> {
    /// Service configured from `[scim]`: seeded store, enabled hooks, base URL
    pub fn from_config(config: &ScimConfig) -> Result<Self, StoreError> {
        let store = match &config.seed_file {
            Some(path) => InMemoryStore::from_seed_file(path)?,
            None => InMemoryStore::new(),
        };
        let hooks =
            HookChain::from_flags(config.enforce_self_deactivation, config.enforce_sso_domain);
        info!(
            users = store.len(),
            hooks = ?hooks.names(),
            base_url = %config.base_url,
            "Initialized user service"
        );
        Ok(Self::new(store)
            .with_hooks(hooks)
            .with_base_url(config.base_url.trim()))
    }
}

impl<S> std::fmt::Debug for UserService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("hooks", &self.hooks)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn check_id(id: &str) -> ScimResult<()> {
    if id.trim().is_empty() {
        return Err(ScimError::InvalidArgument(
            "User ID cannot be empty or whitespace only".into(),
        ));
    }
    Ok(())
}

/// An empty filter string means "no filter"; blank strings are rejected
fn parse_filter(filter: Option<&str>) -> ScimResult<Option<FilterNode>> {
    filter
        .filter(|f| !f.is_empty())
        .map(filter::parse)
        .transpose()
}

fn into_object(id: &str, resource: Value) -> Result<Map<String, Value>, StoreError> {
    match resource {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotAnObject {
            id: id.to_string(),
            found: kind(&other),
        }),
    }
}

/// Stable sort on `id` or `externalId`; other keys leave the order alone.
///
/// Missing and null values sort as empty strings.
fn sort_users(users: &mut [Value], sort_by: &str, order: SortOrder) {
    if sort_by != "id" && sort_by != "externalId" {
        debug!(sort_by, "Ignoring unsupported sortBy");
        return;
    }

    let key = |user: &Value| match user.get(sort_by) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    users.sort_by(|a, b| {
        let ordering: Ordering = key(a).cmp(&key(b));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    const NOW: &str = "2024-02-01T12:00:00.000000Z";

    fn service() -> UserService<InMemoryStore> {
        let store = InMemoryStore::from_users(vec![
            json!({
                "schemas": [USER_SCHEMA],
                "id": "1",
                "userName": "jdoe@x.com",
                "name": {"givenName": "Jane", "familyName": "Doe"},
                "active": true
            }),
            json!({
                "schemas": [USER_SCHEMA],
                "id": "2",
                "externalId": "b",
                "userName": "asmith@x.com",
                "name": {"givenName": "Alan", "familyName": "Smith"},
                "active": false
            }),
        ])
        .unwrap();
        UserService::new(store).with_clock(FixedClock::parse(NOW).unwrap())
    }

    #[test]
    fn test_blank_id_is_invalid() {
        let mut svc = service();
        assert!(matches!(svc.get(" ", None, None), Err(ScimError::InvalidArgument(_))));
        assert!(matches!(svc.delete(""), Err(ScimError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_filter_is_ignored() {
        let svc = service();
        assert!(svc.get("1", None, Some("")).unwrap().is_some());
        assert!(matches!(
            svc.get("1", None, Some("  ")),
            Err(ScimError::FilterSyntax(_))
        ));
    }

    #[test]
    fn test_sort_missing_values_first() {
        let mut users = vec![json!({"id": "2", "externalId": "b"}), json!({"id": "1"})];
        sort_users(&mut users, "externalId", SortOrder::Ascending);
        assert_eq!(users[0]["id"], "1");
        sort_users(&mut users, "externalId", SortOrder::Descending);
        assert_eq!(users[0]["id"], "2");
        sort_users(&mut users, "userName", SortOrder::Ascending);
        assert_eq!(users[0]["id"], "2");
    }

    #[test]
    fn test_delete_stamps_meta() {
        let mut svc = service();
        assert!(svc.delete("1").unwrap());
        let user = svc.store().find("1").unwrap();
        assert_eq!(user["active"], false);
        assert_eq!(user["meta"]["lastModified"], NOW);
        assert_eq!(user["meta"]["created"], NOW);
        assert!(!svc.delete("missing").unwrap());
    }

    #[test]
    fn test_from_config() {
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut seed, br#"[{"id": "7", "userName": "a@x.com"}]"#).unwrap();

        let config = ScimConfig {
            base_url: "http://localhost/scim/".into(),
            seed_file: Some(seed.path().display().to_string()),
            enforce_self_deactivation: false,
            enforce_sso_domain: true,
        };
        let svc = UserService::from_config(&config).unwrap();
        assert_eq!(svc.store().len(), 1);
        assert_eq!(svc.hooks().names(), vec!["sso_domain"]);
        assert_eq!(svc.base_url(), "http://localhost/scim/");

        let missing = ScimConfig {
            seed_file: Some("/nonexistent/users.json".into()),
            ..ScimConfig::default()
        };
        assert!(matches!(
            UserService::from_config(&missing),
            Err(StoreError::Io(_))
        ));
    }
}
