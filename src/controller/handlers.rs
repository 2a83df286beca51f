//! Default per-method API handlers for model-backed controllers.

use crate::controller::{Controller, HandlerFuture};
use crate::error::AppError;
use crate::transport::{ApiOutcome, Method};

/// Register the default CRUD handlers. OPTIONS needs no handler; the
/// dispatcher answers it directly.
pub fn register_defaults(controller: &mut Controller) {
    controller.register_handler(Method::Head, api_head);
    controller.register_handler(Method::Get, api_get);
    controller.register_handler(Method::Post, api_post);
    controller.register_handler(Method::Put, api_put);
    controller.register_handler(Method::Delete, api_delete);
}

/// GET with an id loads one record; without an id it runs a criteria search.
async fn get_outcome(c: &mut Controller) -> Result<ApiOutcome, AppError> {
    if let Some(id) = c.route().id {
        c.record_mut().load(id).await?;
        return Ok(ApiOutcome::Record(c.record().clone()));
    }
    let criteria = c.search_criteria();
    let order = c.sort_order();
    let table = c.record().table().to_string();
    let collection = c.app().search(&table, &criteria, &order).await?;
    Ok(ApiOutcome::Collection(collection))
}

/// HEAD is GET without the body.
fn api_head(c: &mut Controller) -> HandlerFuture<'_> {
    Box::pin(async move {
        get_outcome(c).await?;
        Ok(ApiOutcome::None)
    })
}

fn api_get(c: &mut Controller) -> HandlerFuture<'_> {
    Box::pin(get_outcome(c))
}

fn api_post(c: &mut Controller) -> HandlerFuture<'_> {
    Box::pin(async move {
        let body = c.route().body.clone();
        if body.is_empty() {
            return Err(AppError::BadRequest("no data to create".into()));
        }
        c.record_mut().bulk_assign(body)?;
        c.record_mut().save().await?;
        Ok(ApiOutcome::Record(c.record().clone()))
    })
}

fn api_put(c: &mut Controller) -> HandlerFuture<'_> {
    Box::pin(async move {
        let id = c
            .route()
            .id
            .ok_or_else(|| AppError::BadRequest("id required for update".into()))?;
        let body = c.route().body.clone();
        c.record_mut().load(id).await?;
        c.record_mut().bulk_assign(body)?;
        c.record_mut().save().await?;
        Ok(ApiOutcome::Record(c.record().clone()))
    })
}

fn api_delete(c: &mut Controller) -> HandlerFuture<'_> {
    Box::pin(async move {
        let id = c
            .route()
            .id
            .ok_or_else(|| AppError::BadRequest("id required for delete".into()))?;
        c.record_mut().load(id).await?;
        c.record_mut().delete().await?;
        Ok(ApiOutcome::None)
    })
}
