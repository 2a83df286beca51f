//! Demo server: PostgreSQL when DATABASE_URL is set, otherwise an in-memory
//! sample schema. Mounts the JSON API under /api and the admin view flow
//! under /admin.

use axum::Router;
use serde_json::json;
use std::sync::Arc;
use steward_sdk::{
    admin_routes, api_routes, App, Authenticator, ColumnDescriptor, DirTemplateLocator,
    MemoryStorage, PgStorage, StaticAuthenticator, StaticOracle, Storage, UserHandle,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("steward_sdk=debug".parse()?))
        .init();

    let storage: Arc<dyn Storage> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            Arc::new(PgStorage::new(pool))
        }
        Err(_) => Arc::new(sample_storage()),
    };

    let oracle = Arc::new(StaticOracle::allowing_all(UserHandle::named(1, "admin")));
    let auth: Arc<dyn Authenticator> = Arc::new(StaticAuthenticator::new(oracle));
    let templates = Arc::new(DirTemplateLocator::new(
        std::env::var("VIEW_DIR").unwrap_or_else(|_| "views".into()),
    ));
    let app_state = App::new(storage, templates, auth);

    let app = Router::new()
        .nest("/api", api_routes(app_state.clone()))
        .nest("/admin", admin_routes(app_state));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Two related sample tables with a few rows, enough to click through the
/// whole CRUD surface without a database.
fn sample_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.define_table(
        "owner",
        vec![
            ColumnDescriptor::new("OwnerID", "int"),
            ColumnDescriptor::new("Name", "varchar(40)"),
            ColumnDescriptor::new("Phone", "phone"),
        ],
    );
    storage.define_table(
        "widget",
        vec![
            ColumnDescriptor::new("ID", "int"),
            ColumnDescriptor::new("Name", "varchar(40)"),
            ColumnDescriptor::new("OwnerID", "int"),
            ColumnDescriptor::new("Price", "dollar"),
            ColumnDescriptor::new("Status", "enum('Ordered','Stocked','Retired')"),
            ColumnDescriptor::new("Active", "boolean"),
        ],
    );
    storage.seed(
        "owner",
        vec![
            to_row(json!({"Name": "Ada", "Phone": "8595551234"})),
            to_row(json!({"Name": "Grace", "Phone": "5025559876"})),
        ],
    );
    storage.seed(
        "widget",
        vec![
            to_row(json!({"Name": "Bolt", "OwnerID": 1, "Price": 1.5, "Status": "stocked", "Active": 1})),
            to_row(json!({"Name": "Nut", "OwnerID": 2, "Price": 0.75, "Status": "ordered", "Active": 1})),
        ],
    );
    storage
}

fn to_row(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}
