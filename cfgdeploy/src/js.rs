//! JSON/JavaScript-related functionality.

use boa::JsValue;
use eyre::Result;
use log::trace;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::Error;

/// Register an object parsed from the given JSON under the specified name in
/// the given context.
pub fn register_json_var<V: Serialize>(ctx: &mut boa::Context, name: &str, value: &V) -> Result<()> {
    let json_str = format_json_str(&serde_json::to_string(value)?);
    ctx.eval(format!(
        r#"var {name} = JSON.parse('{json_str}');"#,
        name = name,
        json_str = json_str
    ))
    .map_err(|e| Error::JsonToJavaScript(format!("{:?}", e)))?;
    Ok(())
}

/// Evaluates the given expression, which must produce a string of JSON (i.e.
/// the result of a `JSON.stringify` call), and parses the result.
///
/// `label` is only used to identify the script in error messages.
pub fn eval_to_json(ctx: &mut boa::Context, label: &str, script: &str) -> Result<JsonValue> {
    trace!("Attempting to execute script:\n{}", script);
    let result = ctx
        .eval(script)
        .map_err(|e| Error::JavaScript(label.to_string(), format!("{:?}", e)))?;
    match &result {
        JsValue::String(s) => Ok(serde_json::from_str::<JsonValue>(&s.to_string())?),
        _ => Err(Error::UnexpectedJavaScriptReturnValue(
            label.to_string(),
            format!("{:?}", result),
        )
        .into()),
    }
}

/// Checks that the given source parses as the body of a function, without
/// executing it.
pub fn check_function_body(params: &[&str], body: &str) -> std::result::Result<(), String> {
    let mut ctx = boa::Context::new();
    let result = ctx.eval(format!(
        "(function ({}) {{\n{}\n}});",
        params.join(", "),
        body
    ));
    result.map(|_| ()).map_err(|e| {
        e.to_string(&mut ctx)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| format!("{:?}", e))
    })
}

fn format_json_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod test {
    use super::*;
    use boa::Context;
    use serde_json::json;

    #[test]
    fn json_to_js_and_back() {
        let mut ctx = Context::new();
        let json_obj = json!({
            "title": "It's a \"test\"",
            "magicNumber": 42,
            "path": "C:\\temp",
        });
        register_json_var(&mut ctx, "testObj", &json_obj).unwrap();
        let result = eval_to_json(&mut ctx, "passThrough", "JSON.stringify([testObj])").unwrap();
        assert_eq!(result, json!([json_obj]));
    }

    #[test]
    fn non_string_result_is_rejected() {
        let mut ctx = Context::new();
        let err = eval_to_json(&mut ctx, "answer", "42").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::UnexpectedJavaScriptReturnValue(label, _)) => assert_eq!(label, "answer"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn syntax_errors_are_detected_without_execution() {
        assert!(check_function_body(&["contact"], "throw new Error('not run'); return contact;").is_ok());
        assert!(check_function_body(&["contact"], "return contact.;").is_err());
    }
}
