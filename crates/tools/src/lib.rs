//! kinform-tools: the outward-facing layout tools.
//!
//! Thin request/response entry points over the `kinform-core` engine and a
//! [`store::FormStore`]. Each tool takes its arguments as a JSON object,
//! checks required arguments strictly, runs one fetch → transform →
//! persist sequence, and holds no state between calls. Callers serialize
//! concurrent writes themselves via the store's revision token.

pub mod error;
pub mod store;

use serde_json::{json, Value};

use kinform_core::{
    add_element_to_layout, build_form_layout, build_group_layout, build_table_layout,
    FieldDescriptor, InsertPosition, LayoutOptions, Normalizer, UuidIds,
};

pub use error::ToolError;
pub use store::{FetchedForm, FormStore, StoreError};

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// Names of the layout tools, in catalogue order.
pub const TOOL_NAMES: &[&str] = &[
    "get_form_layout",
    "update_form_layout",
    "create_form_layout",
    "add_layout_element",
    "create_group_layout",
    "create_table_layout",
];

/// Dispatch a tool call by name.
pub async fn call_tool(
    store: &dyn FormStore,
    name: &str,
    args: &Value,
) -> Result<Value, ToolError> {
    match name {
        "get_form_layout" => get_form_layout(store, args).await,
        "update_form_layout" => update_form_layout(store, args).await,
        "create_form_layout" => create_form_layout(store, args).await,
        "add_layout_element" => add_layout_element(store, args).await,
        "create_group_layout" => create_group_layout(args),
        "create_table_layout" => create_table_layout(args),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Store-backed tools
// ---------------------------------------------------------------------------

/// Fetch an app's current form layout and revision.
pub async fn get_form_layout(store: &dyn FormStore, args: &Value) -> Result<Value, ToolError> {
    let app_id = require_str(args, "app_id")?;
    let form = store.fetch(app_id).await?;
    Ok(json!({ "layout": form.layout, "revision": form.revision }))
}

/// Normalize a caller-supplied layout and persist it.
///
/// Structural defects are repaired, never rejected; the warnings describing
/// each repair come back alongside the new revision so automated callers
/// can see what was changed.
pub async fn update_form_layout(store: &dyn FormStore, args: &Value) -> Result<Value, ToolError> {
    let app_id = require_str(args, "app_id")?;
    let layout = require(args, "layout")?;
    let revision = optional_str(args, "revision");

    let normalized = Normalizer::new().validate_and_fix(layout);
    let repaired = to_json(&normalized.document)?;
    let revision = store.persist(app_id, &repaired, revision).await?;

    tracing::info!(
        app_id,
        revision = %revision,
        repairs = normalized.warnings.len(),
        "Form layout updated",
    );

    Ok(json!({ "revision": revision, "warnings": normalized.warnings }))
}

/// Build a fresh layout from flat field descriptors and persist it.
pub async fn create_form_layout(store: &dyn FormStore, args: &Value) -> Result<Value, ToolError> {
    let app_id = require_str(args, "app_id")?;
    let fields: Vec<FieldDescriptor> = parse_arg(require(args, "fields")?, "fields")?;
    let options: LayoutOptions = match optional(args, "options") {
        Some(value) => parse_arg(value, "options")?,
        None => LayoutOptions::default(),
    };

    let document = build_form_layout(&fields, &options, &mut UuidIds)?;
    let layout = to_json(&document)?;
    let revision = store.persist(app_id, &layout, None).await?;

    tracing::info!(
        app_id,
        revision = %revision,
        nodes = document.len(),
        "Form layout created",
    );

    Ok(json!({ "revision": revision, "layout": layout }))
}

/// Insert one element into an app's current layout and persist the result.
///
/// The stored layout is normalized defensively first, so a hand-edited
/// document is repaired on the way through.
pub async fn add_layout_element(store: &dyn FormStore, args: &Value) -> Result<Value, ToolError> {
    let app_id = require_str(args, "app_id")?;
    let element_value = require(args, "element")?;
    let position: Option<InsertPosition> = match optional(args, "position") {
        Some(value) => Some(parse_arg(value, "position")?),
        None => None,
    };

    let form = store.fetch(app_id).await?;
    let mut normalizer = Normalizer::new();
    let normalized = normalizer.validate_and_fix(&form.layout);
    let (element, element_warnings) = normalizer.coerce_element(element_value);

    let document = add_element_to_layout(&normalized.document, &element, position.as_ref());
    let layout = to_json(&document)?;
    let revision = store.persist(app_id, &layout, Some(&form.revision)).await?;

    tracing::info!(app_id, revision = %revision, "Layout element added");

    let mut warnings = normalized.warnings;
    warnings.extend(element_warnings);
    Ok(json!({ "revision": revision, "layout": layout, "warnings": warnings }))
}

// ---------------------------------------------------------------------------
// Pure construction tools
// ---------------------------------------------------------------------------

/// Build a group node from flat descriptors. Pure: nothing is persisted.
pub fn create_group_layout(args: &Value) -> Result<Value, ToolError> {
    let code = require_str(args, "code")?;
    let label = require_str(args, "label")?;
    let fields: Vec<FieldDescriptor> = parse_arg(require(args, "fields")?, "fields")?;
    let open_group = args.get("openGroup").and_then(Value::as_bool);

    let group = build_group_layout(code, label, &fields, open_group, &mut UuidIds)?;
    to_json(&group)
}

/// Render pre-grouped descriptor rows as layout rows. Pure: nothing is
/// persisted.
pub fn create_table_layout(args: &Value) -> Result<Value, ToolError> {
    let rows: Vec<Vec<FieldDescriptor>> = parse_arg(require(args, "rows")?, "rows")?;
    let layout = build_table_layout(&rows, &mut UuidIds)?;
    to_json(&layout)
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn require<'a>(args: &'a Value, name: &'static str) -> Result<&'a Value, ToolError> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ToolError::MissingArgument { name }),
    }
}

fn require_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    require(args, name)?
        .as_str()
        .ok_or_else(|| ToolError::InvalidArgument {
            name,
            reason: "expected a string".to_string(),
        })
}

fn optional<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|value| !value.is_null())
}

fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    optional(args, name).and_then(Value::as_str)
}

fn parse_arg<T: serde::de::DeserializeOwned>(
    value: &Value,
    name: &'static str,
) -> Result<T, ToolError> {
    serde_json::from_value(value.clone()).map_err(|err| ToolError::InvalidArgument {
        name,
        reason: err.to_string(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::Core(kinform_core::CoreError::Internal(err.to_string())))
}
