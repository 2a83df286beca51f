//! Per-request action dispatch: the HTTP-verb state machine, permission
//! gating, and cascading view preparation.

pub mod handlers;
pub mod hooks;

use crate::auth::PermissionOracle;
use crate::error::AppError;
use crate::record::Record;
use crate::schema::{ColumnDescriptor, DeclaredType};
use crate::state::App;
use crate::transport::{ApiOutcome, ApiResponse, Method, Route};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Components a controller exposes, with their descriptions.
pub const COMPONENTS: &[(&str, &str)] = &[
    ("search", "This is the ability to search and display data."),
    ("edit", "The ability to edit existing data."),
    ("create", "The ability to create new data."),
    ("delete", "The ability to delete existing data."),
];

const DEFAULT_ALLOWED_ACTIONS: &[&str] = &["search", "create", "editcolumn", "edit", "list", "view"];
const DEFAULT_ACTION: &str = "list";

/// How many times the view cascade may re-run after an action reassignment
/// before it is considered stuck.
const MAX_CASCADE: usize = 8;

pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;
/// A registered view-preparation hook. Hooks are looked up by name from the
/// cascade and may reassign the current action.
pub type Hook = for<'a> fn(&'a mut Controller) -> HookFuture<'a>;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiOutcome, AppError>> + Send + 'a>>;
/// A registered per-method API handler.
pub type Handler = for<'a> fn(&'a mut Controller) -> HandlerFuture<'a>;

/// One request's dispatch context: the route, the backing record, the
/// resolved current action, and the per-request permission cache.
pub struct Controller {
    kind: String,
    app: App,
    perms: Arc<dyn PermissionOracle>,
    route: Route,
    record: Record,
    current_action: String,
    default_action: String,
    allowed_actions: Vec<String>,
    allow_cache: HashMap<String, bool>,
    hooks: HashMap<String, Hook>,
    handlers: HashMap<Method, Handler>,
    view_data: Map<String, Value>,
    ignore: HashMap<String, Vec<String>>,
    column_order: Vec<String>,
    redirect: Option<String>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("kind", &self.kind)
            .field("route", &self.route)
            .field("record", &self.record)
            .field("current_action", &self.current_action)
            .field("default_action", &self.default_action)
            .field("allowed_actions", &self.allowed_actions)
            .field("allow_cache", &self.allow_cache)
            .field("view_data", &self.view_data)
            .field("ignore", &self.ignore)
            .field("column_order", &self.column_order)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Bare controller for `kind`: no handlers and no hooks registered, so
    /// every API method answers 404 until something is registered. Fails
    /// with NotFound when the kind has no backing table.
    pub async fn new(
        app: App,
        perms: Arc<dyn PermissionOracle>,
        kind: &str,
        route: Route,
    ) -> Result<Self, AppError> {
        let record = app.record(kind).await?;
        let mut controller = Controller {
            kind: kind.to_lowercase(),
            app,
            perms,
            route,
            record,
            current_action: String::new(),
            default_action: DEFAULT_ACTION.into(),
            allowed_actions: DEFAULT_ALLOWED_ACTIONS.iter().map(|s| s.to_string()).collect(),
            allow_cache: HashMap::new(),
            hooks: HashMap::new(),
            handlers: HashMap::new(),
            view_data: Map::new(),
            ignore: HashMap::new(),
            column_order: Vec::new(),
            redirect: None,
        };
        controller.resolve_current_action();
        Ok(controller)
    }

    /// Model-backed controller: the bare controller plus the default CRUD
    /// handlers and admin view hooks.
    pub async fn model_backed(
        app: App,
        perms: Arc<dyn PermissionOracle>,
        kind: &str,
        route: Route,
    ) -> Result<Self, AppError> {
        let mut controller = Self::new(app, perms, kind, route).await?;
        handlers::register_defaults(&mut controller);
        hooks::register_defaults(&mut controller);
        Ok(controller)
    }

    /// Route action when allow-listed, the configured default otherwise.
    fn resolve_current_action(&mut self) {
        self.current_action = if self.allowed_actions.iter().any(|a| a == &self.route.action) {
            self.route.action.clone()
        } else {
            self.default_action.clone()
        };
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn current_action(&self) -> &str {
        &self.current_action
    }

    /// Reassign the current action; the view cascade re-runs when this
    /// changes mid-preparation.
    pub fn set_current_action(&mut self, action: &str) {
        self.current_action = action.to_string();
    }

    /// The component catalog: every permission component with its
    /// description.
    pub fn components() -> &'static [(&'static str, &'static str)] {
        COMPONENTS
    }

    pub fn view_data(&self) -> &Map<String, Value> {
        &self.view_data
    }

    pub fn insert_view_data(&mut self, key: &str, value: Value) {
        self.view_data.insert(key.to_string(), value);
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub fn set_redirect(&mut self, uri: String) {
        self.redirect = Some(uri);
    }

    /// Columns to skip when building view data for an action kind.
    pub fn ignore_columns(&mut self, kind: &str, columns: &[&str]) {
        self.ignore
            .entry(kind.to_lowercase())
            .or_default()
            .extend(columns.iter().map(|c| c.to_string()));
    }

    pub fn set_column_order(&mut self, order: &[&str]) {
        self.column_order = order.iter().map(|c| c.to_string()).collect();
    }

    pub fn register_hook(&mut self, name: &str, hook: Hook) {
        self.hooks.insert(name.to_string(), hook);
    }

    pub fn register_handler(&mut self, method: Method, handler: Handler) {
        self.handlers.insert(method, handler);
    }

    /// Permission verdict for `component`, computed once per component and
    /// cached for the controller's lifetime. Menu-item spellings normalize
    /// onto their backing component (list -> search, editcolumn -> edit).
    pub fn allow(&mut self, component: &str) -> bool {
        if let Some(hit) = self.allow_cache.get(component) {
            return *hit;
        }
        let verdict = self
            .perms
            .user_has_permission(&self.kind, normalize_component(component));
        self.allow_cache.insert(component.to_string(), verdict);
        verdict
    }

    /// Dispatch the request through the verb/permission state machine.
    ///
    /// Guards run in a fixed order: user validity (401), method permission
    /// (405), then the per-method handler (404 when none is registered).
    /// POST answers 201 and DELETE 204 on handler entry; OPTIONS returns no
    /// body and an Allow header naming every recognized method.
    pub async fn process_api(&mut self) -> Result<ApiResponse, AppError> {
        if !self.perms.current_user().is_valid() {
            return Err(AppError::Unauthorized);
        }
        let method = self.route.method;
        if let Some(component) = method.required_component() {
            if !self.allow(component) {
                return Err(AppError::MethodNotAllowed("Action not allowed to user".into()));
            }
        }
        if method == Method::Options {
            return Ok(ApiResponse {
                status: StatusCode::OK,
                allow: Some(Method::allow_header()),
                body: None,
            });
        }
        let status = match method {
            Method::Post => StatusCode::CREATED,
            Method::Delete => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        };
        let handler = self.handlers.get(&method).copied().ok_or_else(|| {
            AppError::NotFound(format!("Action not implemented by {}", self.kind))
        })?;
        let outcome = handler(self).await?;
        tracing::debug!(kind = %self.kind, method = method.as_str(), status = status.as_u16(), "dispatched");
        Ok(ApiResponse {
            status,
            allow: None,
            body: outcome.into_body(),
        })
    }

    /// Run every matching view-preparation hook for the current state, in
    /// candidate order. When a hook reassigns the current action, the whole
    /// cascade re-runs for the new action; a cascade that keeps moving past
    /// the iteration cap is an error.
    pub async fn prepare_view(&mut self) -> Result<(), AppError> {
        for _ in 0..MAX_CASCADE {
            let original = self.current_action.clone();
            self.insert_view_data("controller", Value::String(self.kind.clone()));
            self.insert_view_data("method", Value::String(self.current_action.clone()));
            self.insert_view_data("currentModel", self.record.all());
            let names =
                hooks::candidates(&self.current_action, self.route.method, &self.route.sub_action);
            for name in names {
                if let Some(hook) = self.hooks.get(&name).copied() {
                    tracing::debug!(hook = %name, "view hook");
                    hook(self).await?;
                }
            }
            if self.current_action == original {
                return Ok(());
            }
        }
        Err(AppError::Other(
            "view preparation did not settle on an action".into(),
        ))
    }

    /// Candidate view template for the current state. None means the user
    /// may not use the current action and the caller should render nothing;
    /// a state with no resolvable template at all is NotFound.
    pub fn view_template(&mut self) -> Result<Option<String>, AppError> {
        let action = self.current_action.clone();
        if !self.allow(&action) {
            return Ok(None);
        }
        let dir = self.kind.clone();
        let action_view = if action == "list" {
            "search".to_string()
        } else {
            action.to_lowercase()
        };
        let mode = if self.route.method == Method::Post || action == "list" {
            "process"
        } else {
            "display"
        };
        let candidates = [
            format!("{dir}/{action_view}"),
            format!("{dir}/{mode}{action_view}"),
            action_view.clone(),
            format!("{mode}{action_view}"),
        ];
        for candidate in &candidates {
            if let Some(path) = self.app.templates.resolve_view(candidate) {
                return Ok(Some(path.to_string_lossy().into_owned()));
            }
        }
        Err(AppError::NotFound(format!(
            "the action \"{action}\" does not exist in {}",
            self.kind
        )))
    }

    /// Column listing for a view kind, with the identity column removed,
    /// per-kind ignore lists applied, search-type rewrites in place, and the
    /// configured column order honored.
    pub fn view_columns(&self, kind: &str) -> Vec<ColumnDescriptor> {
        let kind = kind.to_lowercase();
        let mut columns: Vec<ColumnDescriptor> = self.record.schema().columns().to_vec();
        if let Some(id_column) = self.record.schema().id_column().map(str::to_string) {
            columns.retain(|c| c.name != id_column);
        }
        if let Some(ignored) = self.ignore.get(&kind) {
            columns.retain(|c| !ignored.contains(&c.name));
        }
        if kind == "search" {
            for column in &mut columns {
                if column.declared.base == "text" {
                    column.declared = DeclaredType::parse("varchar");
                }
                if column.declared.base == "date" {
                    column.declared = DeclaredType::parse("searchdate");
                }
            }
        }
        if self.column_order.is_empty() {
            return columns;
        }
        let mut ordered = Vec::with_capacity(columns.len());
        for name in &self.column_order {
            if let Some(pos) = columns.iter().position(|c| &c.name == name) {
                ordered.push(columns.remove(pos));
            }
        }
        ordered.extend(columns);
        ordered
    }

    /// Search criteria from the raw parameters; form/body data takes
    /// precedence over query data.
    pub fn search_criteria(&self) -> Map<String, Value> {
        if !self.route.body.is_empty() {
            self.route.body.clone()
        } else {
            self.route.query.clone()
        }
    }

    fn sort_order(&self) -> Vec<String> {
        vec![self
            .record
            .id_column()
            .unwrap_or("id")
            .to_string()]
    }
}

/// Menu-item spelling to backing component.
fn normalize_component(component: &str) -> &str {
    match component {
        "list" => "search",
        "editcolumn" => "edit",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StaticOracle, UserHandle};
    use crate::schema::ColumnDescriptor;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::Storage;
    use crate::views::StaticTemplateLocator;
    use crate::auth::StaticAuthenticator;
    use serde_json::json;

    fn test_app(templates: StaticTemplateLocator) -> App {
        let storage = MemoryStorage::new();
        storage.define_table(
            "widget",
            vec![
                ColumnDescriptor::new("ID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
                ColumnDescriptor::new("OwnerID", "int"),
            ],
        );
        storage.define_table(
            "owner",
            vec![
                ColumnDescriptor::new("OwnerID", "int"),
                ColumnDescriptor::new("Name", "varchar(40)"),
            ],
        );
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let oracle: Arc<dyn PermissionOracle> =
            Arc::new(StaticOracle::allowing_all(UserHandle::named(1, "admin")));
        App::new(
            storage,
            Arc::new(templates),
            Arc::new(StaticAuthenticator::new(oracle)),
        )
    }

    fn admin() -> Arc<dyn PermissionOracle> {
        Arc::new(StaticOracle::allowing_all(UserHandle::named(1, "admin")))
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "list");
        let err = Controller::model_backed(app, admin(), "gadget", route)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn off_list_action_falls_back_to_the_default() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "explode");
        let controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        assert_eq!(controller.current_action(), "list");
    }

    #[tokio::test]
    async fn anonymous_user_is_unauthorized() {
        let app = test_app(StaticTemplateLocator::default());
        let oracle: Arc<dyn PermissionOracle> =
            Arc::new(StaticOracle::allowing_all(UserHandle::anonymous()));
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, oracle, "widget", route)
            .await
            .unwrap();
        let err = controller.process_api().await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_without_permission_is_405_and_never_204() {
        let app = test_app(StaticTemplateLocator::default());
        let oracle: Arc<dyn PermissionOracle> = Arc::new(StaticOracle::with_grants(
            UserHandle::named(1, "reader"),
            [("widget", "search"), ("widget", "create"), ("widget", "edit")],
        ));
        let route = Route::new(Method::Delete, "list").with_id(1);
        let mut controller = Controller::model_backed(app, oracle, "widget", route)
            .await
            .unwrap();
        let err = controller.process_api().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(err.to_string().contains("not allowed"));
    }

    #[tokio::test]
    async fn options_lists_every_method_with_no_body() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Options, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        let response = controller.process_api().await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.allow.as_deref(), Some("HEAD,GET,POST,PUT,DELETE,OPTIONS"));
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn unregistered_handler_is_not_implemented() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::new(app, admin(), "widget", route).await.unwrap();
        let err = controller.process_api().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("not implemented"));
    }

    #[test]
    fn every_gated_method_maps_to_a_cataloged_component() {
        for method in Method::ALL {
            if let Some(component) = method.required_component() {
                assert!(Controller::components().iter().any(|(name, _)| *name == component));
            }
        }
    }

    #[tokio::test]
    async fn permission_verdicts_are_cached_per_component() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        assert!(controller.allow("search"));
        assert!(controller.allow("list"));
        assert_eq!(controller.allow_cache.len(), 2);
        assert!(controller.allow_cache["list"]);
    }

    #[tokio::test]
    async fn view_template_resolves_in_candidate_order() {
        let app = test_app(StaticTemplateLocator::new(["widget/search", "displayview"]));
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        // list renders through the search view, process naming
        let template = controller.view_template().unwrap();
        assert_eq!(template.as_deref(), Some("widget/search.html"));

        controller.set_current_action("view");
        let template = controller.view_template().unwrap();
        assert_eq!(template.as_deref(), Some("displayview.html"));
    }

    #[tokio::test]
    async fn view_template_denied_is_a_sentinel_not_an_error() {
        let app = test_app(StaticTemplateLocator::new(["widget/search"]));
        let oracle: Arc<dyn PermissionOracle> = Arc::new(StaticOracle::with_grants(
            UserHandle::named(1, "nobody"),
            std::iter::empty::<(&str, &str)>(),
        ));
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, oracle, "widget", route)
            .await
            .unwrap();
        assert!(controller.view_template().unwrap().is_none());
    }

    #[tokio::test]
    async fn view_template_with_no_candidates_is_not_found() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        let err = controller.view_template().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn view_columns_drop_identity_and_honor_order() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        controller.set_column_order(&["OwnerID", "Name"]);
        let names: Vec<String> = controller
            .view_columns("search")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["OwnerID".to_string(), "Name".to_string()]);

        controller.ignore_columns("search", &["OwnerID"]);
        let names: Vec<String> = controller
            .view_columns("search")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Name".to_string()]);
    }

    #[tokio::test]
    async fn api_get_without_id_searches() {
        let app = test_app(StaticTemplateLocator::default());
        let mut seeder = app.record("widget").await.unwrap();
        seeder.set("Name", json!("Bolt"));
        seeder.save().await.unwrap();

        let route = Route::new(Method::Get, "list");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        let response = controller.process_api().await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        let body = response.body.unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn api_post_creates_and_answers_201() {
        let app = test_app(StaticTemplateLocator::default());
        let mut body = Map::new();
        body.insert("Name".into(), json!("Bolt"));
        let route = Route::new(Method::Post, "create").with_body(body);
        let mut controller = Controller::model_backed(app.clone(), admin(), "widget", route)
            .await
            .unwrap();
        let response = controller.process_api().await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        let created = response.body.unwrap();
        assert!(created["ID"].as_i64().unwrap() > 0);
        assert_eq!(created["Name"], json!("Bolt"));
    }

    #[tokio::test]
    async fn api_delete_answers_204_with_no_body() {
        let app = test_app(StaticTemplateLocator::default());
        let mut seeder = app.record("widget").await.unwrap();
        seeder.set("Name", json!("Bolt"));
        let id = seeder.save().await.unwrap();

        let route = Route::new(Method::Delete, "delete").with_id(id);
        let mut controller = Controller::model_backed(app.clone(), admin(), "widget", route)
            .await
            .unwrap();
        let response = controller.process_api().await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_none());
        let gone = app.record_from_id("widget", id).await;
        assert!(matches!(gone, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn api_put_requires_an_id() {
        let app = test_app(StaticTemplateLocator::default());
        let route = Route::new(Method::Put, "edit");
        let mut controller = Controller::model_backed(app, admin(), "widget", route)
            .await
            .unwrap();
        let err = controller.process_api().await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
