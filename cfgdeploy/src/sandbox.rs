//! Evaluation of compiled contact summary programs in an embedded JavaScript
//! engine.

use eyre::{Result, WrapErr};
use log::debug;
use serde_json::Value as JsonValue;

use crate::js::{eval_to_json, register_json_var};
use crate::summary::{Bindings, ContactSummary, BINDING_NAMES};
use crate::Error;

/// Runs a compiled contact summary program against the given bindings and
/// returns whatever it returns, as JSON.
///
/// The program is treated as the body of a function whose parameters are
/// the bindings, so a top-level `return` statement yields the result. Each
/// evaluation gets its own scripting context.
pub fn evaluate(program: &str, bindings: &Bindings) -> Result<JsonValue> {
    let mut ctx = boa::Context::new();
    for (name, value) in bindings.named() {
        register_json_var(&mut ctx, name, &value)?;
    }
    let params = BINDING_NAMES.join(", ");
    let script = format!(
        "JSON.stringify((function ({params}) {{\n{program}\n}})({params}))",
        params = params,
        program = program,
    );
    let result = eval_to_json(&mut ctx, "contact-summary", &script)?;
    debug!("Contact summary evaluated to: {}", result);
    Ok(result)
}

/// Like [`evaluate`], but expects the result to be a contact summary.
pub fn evaluate_summary(program: &str, bindings: &Bindings) -> Result<ContactSummary> {
    let result = evaluate(program, bindings)?;
    serde_json::from_value(result).map_err(Error::Json).wrap_err_with(|| {
        Error::UnexpectedJavaScriptReturnValue(
            "contact-summary".to_string(),
            "expected an object with cards, fields and context".to_string(),
        )
    })
}
