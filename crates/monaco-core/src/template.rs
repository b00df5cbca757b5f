//! Placeholder substitution for configuration templates.
//!
//! Templates reference resolved parameter values with `{{ .key }}`
//! placeholders. Rendering fails fast on placeholders that name no resolved
//! property; silently empty substitutions are never produced.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Renders a template by substituting `{{ .key }}` placeholders.
///
/// String values are substituted verbatim; all other values are inserted in
/// their JSON representation.
///
/// # Errors
///
/// Returns [`Error::UndefinedTemplateKey`] when a placeholder names a key not
/// present in `properties`, and [`Error::MalformedTemplate`] for unterminated
/// or empty placeholders.
pub fn render(template: &str, properties: &BTreeMap<String, Value>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| Error::MalformedTemplate {
            message: "unterminated '{{' placeholder".to_string(),
        })?;

        let key = parse_key(&after[..end])?;
        let value = properties
            .get(key)
            .ok_or_else(|| Error::UndefinedTemplateKey {
                key: key.to_string(),
            })?;
        match value {
            Value::String(s) => output.push_str(s),
            other => output.push_str(&other.to_string()),
        }

        rest = &after[end + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Returns the keys referenced by a template, in order of first appearance.
///
/// # Errors
///
/// Returns [`Error::MalformedTemplate`] for unterminated or empty
/// placeholders.
pub fn referenced_keys(template: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| Error::MalformedTemplate {
            message: "unterminated '{{' placeholder".to_string(),
        })?;
        let key = parse_key(&after[..end])?;
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
        rest = &after[end + 2..];
    }
    Ok(keys)
}

fn parse_key(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    let key = trimmed
        .strip_prefix('.')
        .ok_or_else(|| Error::MalformedTemplate {
            message: format!("placeholder '{{{{{raw}}}}}' must reference a key as '.key'"),
        })?
        .trim();
    if key.is_empty() {
        return Err(Error::MalformedTemplate {
            message: "empty placeholder key".to_string(),
        });
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn renders_string_values_verbatim() {
        let p = props(&[("name", json!("My Dashboard"))]);
        let out = render(r#"{"dashboardMetadata":{"name":"{{ .name }}"}}"#, &p).unwrap();
        assert_eq!(out, r#"{"dashboardMetadata":{"name":"My Dashboard"}}"#);
    }

    #[test]
    fn renders_non_string_values_as_json() {
        let p = props(&[("enabled", json!(true)), ("rules", json!(["a", "b"]))]);
        let out = render(r#"{"enabled":{{ .enabled }},"rules":{{ .rules }}}"#, &p).unwrap();
        assert_eq!(out, r#"{"enabled":true,"rules":["a","b"]}"#);
    }

    #[test]
    fn whitespace_inside_placeholders_is_tolerated() {
        let p = props(&[("id", json!("x"))]);
        assert_eq!(render("{{.id}}", &p).unwrap(), "x");
        assert_eq!(render("{{  .id  }}", &p).unwrap(), "x");
    }

    #[test]
    fn undefined_key_fails() {
        let p = props(&[("name", json!("n"))]);
        let err = render("{{ .missing }}", &p).unwrap_err();
        match err {
            Error::UndefinedTemplateKey { key } => assert_eq!(key, "missing"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unterminated_placeholder_fails() {
        let p = props(&[]);
        assert!(matches!(
            render("{{ .name", &p),
            Err(Error::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn placeholder_without_dot_fails() {
        let p = props(&[("name", json!("n"))]);
        assert!(matches!(
            render("{{ name }}", &p),
            Err(Error::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn referenced_keys_lists_each_key_once() {
        let keys =
            referenced_keys("{{ .name }} and {{ .id }} and {{ .name }}").unwrap();
        assert_eq!(keys, vec!["name".to_string(), "id".to_string()]);
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let p = props(&[]);
        assert_eq!(render(r#"{"fixed":1}"#, &p).unwrap(), r#"{"fixed":1}"#);
    }
}
