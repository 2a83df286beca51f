//! Shared application state: the collaborators every request needs.

use crate::auth::Authenticator;
use crate::error::AppError;
use crate::record::collection::RecordCollection;
use crate::record::Record;
use crate::schema::SchemaCache;
use crate::storage::Storage;
use crate::views::TemplateLocator;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Process-wide collaborator bundle. The schema cache is the only piece of
/// state shared between requests; everything else is read-only wiring.
#[derive(Clone)]
pub struct App {
    pub storage: Arc<dyn Storage>,
    pub schema: SchemaCache,
    pub templates: Arc<dyn TemplateLocator>,
    pub auth: Arc<dyn Authenticator>,
}

impl App {
    pub fn new(
        storage: Arc<dyn Storage>,
        templates: Arc<dyn TemplateLocator>,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        App {
            storage,
            schema: SchemaCache::new(),
            templates,
            auth,
        }
    }

    /// Blank record for `table`.
    pub async fn record(&self, table: &str) -> Result<Record, AppError> {
        Record::new(self.storage.clone(), self.schema.clone(), table).await
    }

    /// Record loaded by identity.
    pub async fn record_from_id(&self, table: &str, id: i64) -> Result<Record, AppError> {
        Record::from_id(self.storage.clone(), self.schema.clone(), table, id).await
    }

    /// Criteria search over `table`.
    pub async fn search(
        &self,
        table: &str,
        criteria: &Map<String, Value>,
        order: &[String],
    ) -> Result<RecordCollection, AppError> {
        RecordCollection::search(
            self.storage.clone(),
            self.schema.clone(),
            table,
            criteria,
            order,
        )
        .await
    }
}
