//! Substitution of prior task results into a pending task's parameters.
//!
//! Three reference forms are recognised:
//!
//! - `"$task.path"` as the *entire* string: replaced by the referenced value,
//!   whatever its type. Unresolved paths leave the string untouched.
//! - `${task.path}` anywhere in a string: replaced by the value's string form,
//!   or by the empty string when unresolved.
//! - `$task.path` embedded in a longer string: replaced by the value's string
//!   form when it resolves, otherwise kept verbatim.
//!
//! A string that opens with `${` is always a template, never the whole-value
//! form: `"${A.id}"` renders the number `42` as the string `"42"`.
//!
//! Object keys are never substituted.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::types::ExecutionContext;

pub const SENTINEL: char = '$';

lazy_static! {
    static ref REFERENCE: Regex = Regex::new(
        r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+|\[\d+\])*)"
    )
    .expect("reference pattern compiles");
}

/// Recursively resolve references in `value` against `context`.
pub fn resolve(value: &Value, context: &ExecutionContext) -> Value {
    match value {
        Value::String(s) => resolve_str(s, context),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve(v, context)).collect()),
        Value::Object(map) => Value::Object(resolve_map(map, context)),
        other => other.clone(),
    }
}

pub fn resolve_map(map: &Map<String, Value>, context: &ExecutionContext) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), resolve(value, context)))
        .collect()
}

/// Resolve a single string. May return a non-string value for the whole-value form.
pub fn resolve_str(s: &str, context: &ExecutionContext) -> Value {
    if let Some(path) = whole_value_path(s) {
        return match context.lookup(path) {
            Some(found) => found.clone(),
            None => Value::String(s.to_string()),
        };
    }
    Value::String(interpolate(s, context))
}

/// Resolve a string and coerce the result back to text (used for urls).
pub fn resolve_to_string(s: &str, context: &ExecutionContext) -> String {
    match resolve_str(s, context) {
        Value::String(out) => out,
        other => display_value(&other),
    }
}

/// String form used when a value is spliced into surrounding text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// `${...}` is a template even at the start of a string.
fn whole_value_path(s: &str) -> Option<&str> {
    let rest = s.strip_prefix(SENTINEL)?;
    if rest.starts_with('{') {
        return None;
    }
    Some(rest)
}

fn interpolate(s: &str, context: &ExecutionContext) -> String {
    if !s.contains(SENTINEL) {
        return s.to_string();
    }
    REFERENCE
        .replace_all(s, |caps: &Captures<'_>| {
            if let Some(template) = caps.get(1) {
                return context
                    .lookup(template.as_str())
                    .map(display_value)
                    .unwrap_or_default();
            }
            match caps.get(2).and_then(|bare| context.lookup(bare.as_str())) {
                Some(found) => display_value(found),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        ctx.insert("A", json!({"user": {"id": 42, "name": "ada", "roles": ["admin"]}}));
        ctx.insert("user", json!({"id": "u-7"}));
        ctx
    }

    #[test]
    fn test_whole_value_keeps_type() {
        assert_eq!(resolve(&json!("$A.user.id"), &ctx()), json!(42));
        assert_eq!(resolve(&json!("$A.user.roles"), &ctx()), json!(["admin"]));
        assert_eq!(resolve(&json!("$A.user"), &ctx())["name"], json!("ada"));
    }

    #[test]
    fn test_whole_value_unresolved_is_unchanged() {
        assert_eq!(resolve(&json!("$B.user.id"), &ctx()), json!("$B.user.id"));
        assert_eq!(resolve(&json!("$"), &ctx()), json!("$"));
        assert_eq!(resolve(&json!("$A.user.id/x"), &ctx()), json!("$A.user.id/x"));
    }

    #[test]
    fn test_template_substitution() {
        assert_eq!(resolve(&json!("id=${A.user.id}"), &ctx()), json!("id=42"));
        assert_eq!(resolve(&json!("id=${A.missing}"), &ctx()), json!("id="));
        assert_eq!(
            resolve(&json!("${A.user.name} is ${A.user.id}"), &ctx()),
            json!("ada is 42")
        );
    }

    #[test]
    fn test_template_at_start_is_stringified() {
        assert_eq!(resolve(&json!("${A.user.id}"), &ctx()), json!("42"));
        assert_eq!(resolve(&json!("${A.user.roles}"), &ctx()), json!(r#"["admin"]"#));
        assert_eq!(resolve(&json!("${A.missing}"), &ctx()), json!(""));
    }

    #[test]
    fn test_template_renders_structures_as_json() {
        assert_eq!(resolve(&json!("r=${A.user.roles}"), &ctx()), json!(r#"r=["admin"]"#));
    }

    #[test]
    fn test_inline_bare_reference() {
        assert_eq!(resolve(&json!("/o?uid=$user.id"), &ctx()), json!("/o?uid=u-7"));
        assert_eq!(resolve(&json!("costs $5 or $nobody.x"), &ctx()), json!("costs $5 or $nobody.x"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(resolve(&json!("no refs here"), &ctx()), json!("no refs here"));
    }

    #[test]
    fn test_recurses_into_arrays_and_objects_but_not_keys() {
        let input = json!({
            "$A.user.id": "$A.user.id",
            "nested": [{"v": "${A.user.name}"}, 3, true, null]
        });
        let out = resolve(&input, &ctx());
        assert_eq!(
            out,
            json!({
                "$A.user.id": 42,
                "nested": [{"v": "ada"}, 3, true, null]
            })
        );
    }

    #[test]
    fn test_non_string_scalars_pass_through() {
        assert_eq!(resolve(&json!(7.5), &ctx()), json!(7.5));
        assert_eq!(resolve(&Value::Null, &ctx()), Value::Null);
    }

    #[test]
    fn test_resolve_to_string_coerces() {
        assert_eq!(resolve_to_string("$A.user.id", &ctx()), "42");
        assert_eq!(resolve_to_string("/u/${user.id}", &ctx()), "/u/u-7");
    }
}
