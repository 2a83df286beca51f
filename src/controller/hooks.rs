//! Cascading view-hook resolution and the default admin hooks.
//!
//! Hook names follow a naming convention over (action, method, sub-action).
//! Resolution builds an ordered, de-duplicated candidate list and runs
//! *every* registered hook on it, not just the first match.

use crate::controller::{Controller, HookFuture};
use crate::error::AppError;
use crate::query::is_empty_criterion;
use crate::record::format;
use crate::transport::Method;
use serde_json::{json, Map, Value};

/// Ordered, de-duplicated hook-name candidates for the current state:
/// action+sub, action, method+action+sub, method+action.
pub fn candidates(action: &str, method: Method, sub_action: &str) -> Vec<String> {
    let action = ucfirst(action);
    let sub = ucfirst(sub_action);
    let method = ucfirst(method.as_str());
    let raw = [
        format!("prepareView{action}{sub}"),
        format!("prepareView{action}"),
        format!("prepareView{method}{action}{sub}"),
        format!("prepareView{method}{action}"),
    ];
    let mut out = Vec::with_capacity(raw.len());
    for name in raw {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

pub(crate) fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Register the standard admin hooks on a model-backed controller.
pub fn register_defaults(controller: &mut Controller) {
    controller.register_hook("prepareViewList", prepare_view_list);
    controller.register_hook("prepareViewSearch", prepare_view_search);
    controller.register_hook("prepareViewCreate", prepare_view_create);
    controller.register_hook("prepareViewEdit", prepare_view_edit);
    controller.register_hook("prepareViewView", prepare_view_view);
    controller.register_hook("prepareViewGetCreate", prepare_view_get_create);
    controller.register_hook("prepareViewPostCreate", prepare_view_post_create);
    controller.register_hook("prepareViewPostEdit", prepare_view_post_edit);
    controller.register_hook("prepareViewPostSearch", prepare_view_post_search);
}

fn fields_value(controller: &Controller, kind: &str) -> Value {
    let fields: Vec<Value> = controller
        .view_columns(kind)
        .iter()
        .map(|column| {
            json!({
                "name": column.name,
                "type": column.declared.base,
                "params": column.declared.params,
                "nullable": column.nullable,
            })
        })
        .collect();
    Value::Array(fields)
}

fn prepare_view_list(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move { run_search(c).await })
}

fn prepare_view_search(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let fields = fields_value(c, "search");
        c.insert_view_data("fields", fields);
        Ok(())
    })
}

fn prepare_view_create(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let fields = fields_value(c, "create");
        c.insert_view_data("fields", fields);
        Ok(())
    })
}

fn prepare_view_view(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let fields = fields_value(c, "view");
        c.insert_view_data("fields", fields);
        Ok(())
    })
}

fn prepare_view_edit(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let declined = c
            .route()
            .body
            .get("No")
            .map(format::truthy)
            .unwrap_or(false);
        if !c.allow("edit") || declined {
            c.insert_view_data("close", Value::Bool(true));
            return Ok(());
        }
        let fields = fields_value(c, "edit");
        c.insert_view_data("fields", fields);
        Ok(())
    })
}

/// Pre-fill a fresh record from the raw query parameters.
fn prepare_view_get_create(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let raw = c.route().query.clone();
        c.record_mut().bulk_assign(raw)?;
        Ok(())
    })
}

fn prepare_view_post_create(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let data = create_data(c);
        let saved: Result<i64, AppError> = async {
            c.record_mut().bulk_assign(data)?;
            c.record_mut().save().await
        }
        .await;
        match saved {
            Ok(_) => {
                let message = format!("Successfully created new {}", c.kind());
                c.insert_view_data("success", Value::String(message));
            }
            Err(e) => {
                let message = format!("Failed creating new {}: {e}", c.kind());
                c.insert_view_data("failure", Value::String(message));
            }
        }
        c.set_current_action("view");
        Ok(())
    })
}

fn prepare_view_post_edit(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move {
        let saved: Result<i64, AppError> = async {
            let data = edit_data(c)?;
            c.record_mut().bulk_assign(data)?;
            c.record_mut().save().await
        }
        .await;
        match saved {
            Ok(_) => {
                let message = format!("This {} update has been successful.", c.kind());
                c.insert_view_data("success", Value::String(message));
            }
            Err(e) => {
                let message = format!("This {} update has failed: {e}", c.kind());
                c.insert_view_data("failure", Value::String(message));
            }
        }
        c.set_current_action("view");
        Ok(())
    })
}

fn prepare_view_post_search(c: &mut Controller) -> HookFuture<'_> {
    Box::pin(async move { run_search(c).await })
}

/// The search flow shared by the list and post-search hooks: run the pruned
/// criteria search, narrow a single ajax match down to the view action,
/// redirect a single quick-search match, and publish the result set.
async fn run_search(c: &mut Controller) -> Result<(), AppError> {
    let mut criteria = c.search_criteria();
    criteria.retain(|_, value| !is_empty_criterion(value));
    let order = vec![c
        .record()
        .id_column()
        .unwrap_or("id")
        .to_string()];
    let table = c.record().table().to_string();
    let data = c.app().search(&table, &criteria, &order).await?;

    if data.count() == 1 {
        if c.route().ajax {
            if let Some(single) = data.at(0) {
                *c.record_mut() = single.clone();
            }
            c.set_current_action("view");
            return Ok(());
        }
        if c.route().sub_action == "quick" {
            if let Some(single) = data.at(0) {
                let uri = format!("/{}/{}", c.kind(), single.id());
                c.set_redirect(uri);
            }
        }
    }

    let id_column = c
        .record()
        .id_column()
        .map(unqualified)
        .unwrap_or("id")
        .to_string();
    let data_columns: Vec<Value> = c
        .view_columns("search")
        .iter()
        .map(|column| Value::String(unqualified(&column.name).to_string()))
        .collect();
    c.insert_view_data("data", data.all());
    c.insert_view_data("idColumn", Value::String(id_column));
    c.insert_view_data("dataColumns", Value::Array(data_columns));
    Ok(())
}

/// `widget.Name` -> `Name`; column headers never carry a table prefix.
fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Creation data from the posted body: empty values are dropped, and
/// single-bit checkbox columns become presence booleans.
fn create_data(c: &Controller) -> Map<String, Value> {
    let mut data = c.route().body.clone();
    data.retain(|_, value| !is_empty_criterion(value));
    apply_checkbox_columns(c, &mut data, &[]);
    data
}

/// Edit data from the posted body; single-bit checkbox columns become
/// presence booleans except where the boolean ignore list says otherwise.
fn edit_data(c: &Controller) -> Result<Map<String, Value>, AppError> {
    let mut data = c.route().body.clone();
    if data.is_empty() {
        return Err(AppError::BadRequest("no post data found".into()));
    }
    let skip = c.ignore.get("boolean").cloned().unwrap_or_default();
    apply_checkbox_columns(c, &mut data, &skip);
    Ok(data)
}

fn apply_checkbox_columns(c: &Controller, data: &mut Map<String, Value>, skip: &[String]) {
    for column in c.record().schema().columns() {
        if skip.contains(&column.name) {
            continue;
        }
        if column.declared.base == "tinyint" && column.declared.params == ["1"] {
            let present = data.contains_key(&column.name);
            data.insert(column.name.clone(), Value::Bool(present));
        }
    }
}
