//! Steward SDK: schema-driven admin CRUD backend library.
//!
//! Pairs a dynamic active-record layer (records whose fields come entirely
//! from runtime table metadata) with a request dispatcher that maps HTTP
//! verbs onto gated actions and resolves view preparation through a
//! cascading hook convention.

pub mod auth;
pub mod controller;
pub mod error;
pub mod query;
pub mod record;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;
pub mod transport;
pub mod views;

pub use auth::{Authenticator, PermissionOracle, StaticAuthenticator, StaticOracle, UserHandle};
pub use controller::Controller;
pub use error::AppError;
pub use query::{make_search_query, SearchQuery};
pub use record::collection::RecordCollection;
pub use record::{Field, Record};
pub use routes::{admin_routes, api_routes};
pub use schema::{ColumnDescriptor, DeclaredType, SchemaCache, TableSchema};
pub use state::App;
pub use storage::memory::MemoryStorage;
pub use storage::postgres::PgStorage;
pub use storage::Storage;
pub use transport::{ApiOutcome, ApiResponse, Method, Route};
pub use views::{DirTemplateLocator, TemplateLocator};
