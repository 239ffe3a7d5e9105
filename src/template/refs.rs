//! Template reference scanning.
//!
//! Finds the templates a source pulls in through `extends`, `include` and
//! `import` tags:
//!
//! ```text
//! {% extends "base.html" %}                      literal
//! {% include ["a.html", "b.html"] %}             literal list
//! {% include "opt.html" ignore missing %}        literal, may be absent
//! {% import "macros.html" as m %}                literal
//! {% include page.partial %}                     dynamic
//! ```
//!
//! Dynamic references cannot be resolved without rendering.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%-?\s*(extends|include|import)\s+(.+?)\s*-?%\}")
        .expect("template tag pattern is valid")
});

static STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|'([^']*)'|`([^`]*)`"#).expect("string literal pattern is valid")
});

/// A reference found in template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// Literal template names
    Literal {
        names: Vec<String>,
        ignore_missing: bool,
    },
    /// Computed at render time
    Dynamic(String),
}

/// All references in `source`, in order of appearance.
pub fn scan(source: &str) -> Vec<TemplateRef> {
    TAG.captures_iter(source)
        .filter_map(|caps| {
            let tag = caps.get(1)?.as_str();
            let argument = caps.get(2)?.as_str().trim();
            Some(parse_argument(tag, argument))
        })
        .collect()
}

fn parse_argument(tag: &str, argument: &str) -> TemplateRef {
    let ignore_missing = tag == "include" && argument.ends_with("ignore missing");
    let argument = argument.trim_end_matches("ignore missing").trim_end();

    let target = match tag {
        // `import "x.html" as name`
        "import" => argument
            .rsplit_once(" as ")
            .map_or(argument, |(target, _)| target)
            .trim(),
        _ => argument,
    };

    let literal = if let Some(list) = target.strip_prefix('[') {
        let Some(inner) = list.strip_suffix(']') else {
            return TemplateRef::Dynamic(argument.to_string());
        };
        literal_list(inner)
    } else {
        literal_list(target).filter(|names| names.len() == 1)
    };

    match literal {
        Some(names) => TemplateRef::Literal {
            names,
            ignore_missing,
        },
        None => TemplateRef::Dynamic(argument.to_string()),
    }
}

/// Comma-separated string literals, or `None` if anything else is present.
fn literal_list(text: &str) -> Option<Vec<String>> {
    let mut names = Vec::new();
    for item in text.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let caps = STRING.captures(item)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != item.len() {
            return None;
        }
        let name = caps.get(1).or(caps.get(2)).or(caps.get(3))?.as_str();
        names.push(name.to_string());
    }
    (!names.is_empty()).then_some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(names: &[&str]) -> TemplateRef {
        TemplateRef::Literal {
            names: names.iter().map(|s| s.to_string()).collect(),
            ignore_missing: false,
        }
    }

    #[test]
    fn test_scan_literals() {
        let source = r#"
            {% extends "base.html" %}
            {%- include 'nav.html' -%}
            {% import "macros.html" as m %}
            <p>{{ page.title }}</p>
        "#;
        assert_eq!(
            scan(source),
            vec![
                literal(&["base.html"]),
                literal(&["nav.html"]),
                literal(&["macros.html"])
            ]
        );
    }

    #[test]
    fn test_scan_list_and_ignore_missing() {
        let refs = scan(r#"{% include ["a.html", "b.html"] ignore missing %}"#);
        assert_eq!(
            refs,
            vec![TemplateRef::Literal {
                names: vec!["a.html".into(), "b.html".into()],
                ignore_missing: true,
            }]
        );
    }

    #[test]
    fn test_scan_dynamic() {
        let refs = scan(r#"{% include page.partial %}{% extends "a" ~ name %}"#);
        assert!(matches!(refs[0], TemplateRef::Dynamic(_)));
        assert!(matches!(refs[1], TemplateRef::Dynamic(_)));
    }

    #[test]
    fn test_scan_ignores_other_tags() {
        assert!(scan("{% block content %}{% endblock %}{{ x }}").is_empty());
    }
}
