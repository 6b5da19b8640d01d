pub mod document;
pub mod measure;
pub mod model;
pub mod naming;
pub mod sql;
pub mod store;

use wasm_bindgen::prelude::*;

use document::{load_document, save_document};
use sql::{BracketStyle, Dialect, GenerateOptions, generate};
use store::EntityStore;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn dialect_arg(dialect: Option<String>) -> Result<Dialect, String> {
    match dialect.as_deref() {
        None | Some("") => Ok(Dialect::default()),
        Some(name) => Dialect::from_str(name).ok_or_else(|| format!("Unknown dialect: {name}")),
    }
}

/// Render a schema document as DDL.
#[wasm_bindgen(js_name = "ddlFromDocument")]
pub fn ddl_from_document(
    json: &str,
    dialect: Option<String>,
    bracket: Option<String>,
) -> Result<String, String> {
    let store = load_document(json).map_err(|e| e.to_string())?;
    let mut options = GenerateOptions::new(dialect_arg(dialect)?);
    if let Some(name) = bracket.as_deref().filter(|b| !b.is_empty()) {
        let bracket =
            BracketStyle::from_str(name).ok_or_else(|| format!("Unknown bracket style: {name}"))?;
        options = options.with_bracket(bracket);
    }
    Ok(generate(&store, &options))
}

/// Parse DDL into a schema document. Statements that could not be used are
/// dropped; see [`ddl_diagnostics`].
#[wasm_bindgen(js_name = "documentFromDdl")]
pub fn document_from_ddl(sql: &str, dialect: Option<String>) -> Result<String, String> {
    let parsed = sql::parse(sql, dialect_arg(dialect)?);
    let mut store = EntityStore::new();
    store.apply(parsed.batch);
    save_document(&store).map_err(|e| e.to_string())
}

/// Diagnostics produced while parsing DDL, one message per entry.
#[wasm_bindgen(js_name = "ddlDiagnostics")]
pub fn ddl_diagnostics(sql: &str, dialect: Option<String>) -> Result<js_sys::Array, String> {
    let parsed = sql::parse(sql, dialect_arg(dialect)?);
    Ok(parsed
        .diagnostics
        .iter()
        .map(|d| JsValue::from_str(&d.to_string()))
        .collect())
}
