// Template engine for the Markdown blocks of a page

use crate::error::Result;
use crate::output::text;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera, Value};

const CLASS_TEMPLATE: &str = "class.md";
const FUNCTION_TEMPLATE: &str = "function.md";

const EMBEDDED: [(&str, &str); 2] = [
    (CLASS_TEMPLATE, include_str!("../../templates/class.md.tera")),
    (FUNCTION_TEMPLATE, include_str!("../../templates/function.md.tera")),
];

/// Everything a block template needs to know about one documented object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocBlock {
    /// Short name used in the heading
    pub name: String,
    /// `class`, `method` or `function`
    pub kind: String,
    pub signature: String,
    pub docstring: Option<String>,
    pub source_link: Option<String>,
}

/// Template engine wrapping Tera with custom filters and templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED.to_vec())?;
        register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Embedded templates, overridden by `class.md.tera` / `function.md.tera` found in `dir`
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut tera = Tera::default();

        for (name, embedded) in EMBEDDED {
            let file = dir.join(format!("{}.tera", name));
            if file.is_file() {
                tracing::debug!(template = name, path = %file.display(), "using custom block template");
                tera.add_template_file(&file, Some(name))?;
            } else {
                tera.add_raw_template(name, embedded)?;
            }
        }

        register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Render one block; trailing whitespace is trimmed so blocks join cleanly
    pub fn render_block(&self, block: &DocBlock) -> Result<String> {
        let template = if block.kind == "class" {
            CLASS_TEMPLATE
        } else {
            FUNCTION_TEMPLATE
        };

        let context = Context::from_serialize(block)?;
        let rendered = self.tera.render(template, &context)?;
        Ok(rendered.trim_end().to_string())
    }
}

fn register_filters(tera: &mut Tera) {
    tera.register_filter("code_snippet", code_snippet_filter);
    tera.register_filter("dedent", dedent_filter);
}

/// Wrap a value in a fenced python block
fn code_snippet_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let code = value.as_str().unwrap_or("");
    Ok(Value::String(text::code_snippet(code)))
}

/// Strip `count` indentation levels (default 1)
fn dedent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let mut s = value.as_str().unwrap_or("").to_string();
    let levels = args.get("count").and_then(|v| v.as_u64()).unwrap_or(1);
    for _ in 0..levels {
        s = text::remove_indentation(&s);
    }
    Ok(Value::String(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn block(kind: &str) -> DocBlock {
        DocBlock {
            name: "Dense".to_string(),
            kind: kind.to_string(),
            signature: "demo.Dense(units)".to_string(),
            docstring: Some("Just a layer.".to_string()),
            source_link: None,
        }
    }

    #[test]
    fn test_render_class_block() {
        let engine = TemplateEngine::new().unwrap();
        let out = engine.render_block(&block("class")).unwrap();
        assert_eq!(
            out,
            "### Dense class\n\n```python\ndemo.Dense(units)\n```\n\nJust a layer."
        );
    }

    #[test]
    fn test_render_method_block_with_link() {
        let engine = TemplateEngine::new().unwrap();
        let mut b = block("method");
        b.name = "call".to_string();
        b.signature = "Dense.call(inputs)".to_string();
        b.docstring = None;
        b.source_link = Some("<span>link</span>".to_string());

        let out = engine.render_block(&b).unwrap();
        assert_eq!(
            out,
            "<span>link</span>\n\n### call method\n\n```python\nDense.call(inputs)\n```"
        );
    }

    #[test]
    fn test_block_is_not_html_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let mut b = block("function");
        b.signature = "f(x: List[int] = [], y=\"<a>\")".to_string();
        let out = engine.render_block(&b).unwrap();
        assert!(out.contains("f(x: List[int] = [], y=\"<a>\")"));
    }

    #[test]
    fn test_from_dir_overrides_one_template() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("function.md.tera"), "## {{ name }}\n").unwrap();

        let engine = TemplateEngine::from_dir(dir.path()).unwrap();
        assert_eq!(engine.render_block(&block("function")).unwrap(), "## Dense");
        assert!(engine.render_block(&block("class")).unwrap().starts_with("### Dense class"));
    }

    #[test]
    fn test_dedent_filter() {
        let value = Value::String("        a\n        b".to_string());
        let mut args = HashMap::new();
        args.insert("count".to_string(), Value::Number(2.into()));
        let result = dedent_filter(&value, &args).unwrap();
        assert_eq!(result.as_str().unwrap(), "a\nb");
    }

    #[test]
    fn test_code_snippet_filter() {
        let value = Value::String("f()".to_string());
        let result = code_snippet_filter(&value, &HashMap::new()).unwrap();
        assert_eq!(result.as_str().unwrap(), "```python\nf()\n```\n");
    }
}
