//! Minimal `{{name}}` / `{{#if name}}...{{/if}}` renderer used for email bodies.

use crate::error::{AppError, AppResult};
use regex::{Captures, Regex};
use std::collections::HashMap;

pub type TemplateVars = HashMap<String, String>;

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|e| AppError::InternalError(format!("template regex: {e}")))
}

fn is_truthy(value: Option<&String>) -> bool {
    match value.map(|v| v.trim()) {
        None | Some("") | Some("false") | Some("0") => false,
        Some(_) => true,
    }
}

/// Render `template` against `vars`.
///
/// Conditional blocks are resolved first and do not nest. Unknown placeholders render empty.
pub fn render(template: &str, vars: &TemplateVars) -> AppResult<String> {
    let blocks = compile(r"(?s)\{\{#if\s+(\w+)\s*\}\}(.*?)\{\{/if\}\}")?;
    let placeholders = compile(r"\{\{\s*(\w+)\s*\}\}")?;

    let resolved = blocks.replace_all(template, |caps: &Captures| {
        if is_truthy(vars.get(&caps[1])) {
            caps[2].to_string()
        } else {
            String::new()
        }
    });

    let rendered = placeholders.replace_all(&resolved, |caps: &Captures| {
        vars.get(&caps[1]).cloned().unwrap_or_default()
    });

    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_and_blanks_unknown() {
        let out = render("Hi {{ name }}, ref {{transaction_id}}{{missing}}.", &vars(&[
            ("name", "Ama"),
            ("transaction_id", "EMB-1234ABCD"),
        ]))
        .unwrap();
        assert_eq!(out, "Hi Ama, ref EMB-1234ABCD.");
    }

    #[test]
    fn conditional_blocks_follow_flag() {
        let tpl = "Done{{#if comment}} ({{comment}}){{/if}}!";
        assert_eq!(render(tpl, &vars(&[])).unwrap(), "Done!");
        assert_eq!(
            render(tpl, &vars(&[("comment", "")])).unwrap(),
            "Done!"
        );
        assert_eq!(
            render(tpl, &vars(&[("comment", "wrong number")])).unwrap(),
            "Done (wrong number)!"
        );
    }

    #[test]
    fn conditional_block_spans_lines() {
        let tpl = "<p>A</p>{{#if admin_message}}\n<p>{{admin_message}}</p>\n{{/if}}";
        assert_eq!(
            render(tpl, &vars(&[("admin_message", "code 42")])).unwrap(),
            "<p>A</p>\n<p>code 42</p>\n"
        );
    }
}
