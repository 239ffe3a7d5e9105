//! Tera-backed template engine.
//!
//! Every file of the layout folder is registered under its layout-relative
//! name. Content resources are compiled on demand, together with the content
//! files they reference, on a clone of the layout set so a failed render never
//! leaves half-registered templates behind.
//!
//! Template names resolve against the layout folder first, then the content
//! folder.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::tera::{Context, Tera};
use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use serde_json::Value as JsonValue;

use super::{ContextBuilder, TemplateEngine, TemplateRef, TextHooks, scan};
use crate::config::SiteConfig;
use crate::debug;
use crate::deps::DependencySet;
use crate::error::{Error, GenerationError, Result, chain};
use crate::fs::{normalize_key, to_key};
use crate::site::{ResourceId, Site, url};

/// Name used for one-off string renders.
const INLINE_TEMPLATE: &str = "__lode_inline__";

type UrlBuilder = fn(&SiteConfig, &str) -> String;

const URL_FUNCTIONS: [(&str, UrlBuilder); 3] = [
    ("content_url", url::content_url),
    ("media_url", url::media_url),
    ("full_url", url::full_url),
];

#[derive(Debug, Clone)]
pub struct TeraTemplate {
    base: Tera,
    layout_root: PathBuf,
    content_root: PathBuf,
    layouts: FxHashSet<String>,
}

impl Default for TeraTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl TeraTemplate {
    pub fn new() -> Self {
        let mut base = Tera::default();
        base.autoescape_on(vec![]);
        Self {
            base,
            layout_root: PathBuf::new(),
            content_root: PathBuf::new(),
            layouts: FxHashSet::default(),
        }
    }

    /// Locate a template name on disk: layout folder first, then content.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        [&self.layout_root, &self.content_root]
            .into_iter()
            .map(|root| root.join(name))
            .find(|path| path.is_file())
    }

    /// Name a resource is compiled under, kept clear of layout names.
    fn resource_name(&self, relative: &str) -> String {
        if self.layouts.contains(relative) {
            format!("content/{relative}")
        } else {
            relative.to_string()
        }
    }

    /// Register the content-resident templates `text` references, children
    /// before parents so inheritance chains resolve.
    fn register_content_templates(
        &self,
        tera: &mut Tera,
        site: &mut Site,
        text: &str,
        seen: &mut FxHashSet<String>,
        hooks: &mut dyn TextHooks,
    ) -> Result<()> {
        for reference in scan(text) {
            let TemplateRef::Literal { names, .. } = reference else {
                continue;
            };
            for name in names {
                if self.layouts.contains(&name) || !seen.insert(name.clone()) {
                    continue;
                }
                let Some(id) = site.content().resource_from_relative_path(&name) else {
                    continue;
                };
                let source = read_source(site.resource(id).source())?;
                let source = hooks.preprocess(site, id, source)?;
                self.register_content_templates(tera, site, &source, seen, hooks)?;
                tera.add_raw_template(&name, &source)
                    .map_err(|e| template_error(&name, &e))?;
            }
        }
        Ok(())
    }

    fn collect_dependencies(
        &self,
        text: &str,
        deps: &mut DependencySet,
        seen: &mut FxHashSet<String>,
    ) {
        for reference in scan(text) {
            match reference {
                TemplateRef::Dynamic(expr) => {
                    debug!("template"; "dynamic reference `{}`, dependencies unresolved", expr);
                    deps.mark_unresolved();
                }
                TemplateRef::Literal {
                    names,
                    ignore_missing,
                } => {
                    for name in names {
                        let name = normalize_key(&name);
                        let Some(path) = self.locate(&name) else {
                            if !ignore_missing {
                                debug!("template"; "missing template `{}`", name);
                                deps.mark_unresolved();
                            }
                            continue;
                        };
                        deps.insert(name.clone());
                        if seen.insert(name)
                            && let Ok(text) = fs::read_to_string(&path)
                        {
                            self.collect_dependencies(&text, deps, seen);
                        }
                    }
                }
            }
        }
    }
}

impl TemplateEngine for TeraTemplate {
    fn name(&self) -> &str {
        "tera"
    }

    fn configure(&mut self, site: &Site) -> Result<()> {
        let config = site.config_arc();
        let layout_root = config.layout_root().to_path_buf();

        let templates = read_layouts(&layout_root)?;
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(
            templates
                .iter()
                .map(|(name, text)| (name.as_str(), text.as_str())),
        )
        .map_err(|e| template_error(&layout_root.display().to_string(), &e))?;
        register_url_functions(&mut tera, &config);

        self.layouts = templates.into_iter().map(|(name, _)| name).collect();
        self.base = tera;
        self.content_root = config.content_root().to_path_buf();
        self.layout_root = layout_root;
        debug!("template"; "loaded {} layouts", self.layouts.len());
        Ok(())
    }

    fn render_resource(
        &mut self,
        site: &mut Site,
        id: ResourceId,
        context: ContextBuilder<'_>,
        hooks: &mut dyn TextHooks,
    ) -> Result<String> {
        let relative = site.content().relative_path(id);
        let source = read_source(site.resource(id).source())?;
        let text = hooks.preprocess(site, id, source)?;

        let mut tera = self.base.clone();
        let mut seen = FxHashSet::default();
        seen.insert(relative.clone());
        self.register_content_templates(&mut tera, site, &text, &mut seen, hooks)?;

        let name = self.resource_name(&relative);
        tera.add_raw_template(&name, &text)
            .map_err(|e| template_error(&relative, &e))?;
        let context = Context::from_serialize(context(site, id))
            .map_err(|e| template_error(&relative, &e))?;
        tera.render(&name, &context)
            .map_err(|e| template_error(&relative, &e))
    }

    fn render(&mut self, text: &str, context: &JsonValue) -> Result<String> {
        let mut tera = self.base.clone();
        tera.add_raw_template(INLINE_TEMPLATE, text)
            .map_err(|e| template_error(INLINE_TEMPLATE, &e))?;
        let context =
            Context::from_serialize(context).map_err(|e| template_error(INLINE_TEMPLATE, &e))?;
        tera.render(INLINE_TEMPLATE, &context)
            .map_err(|e| template_error(INLINE_TEMPLATE, &e))
    }

    fn get_dependencies(&self, path: &str) -> DependencySet {
        let path = normalize_key(path);
        let mut deps = DependencySet::new();
        let Some(text) = self
            .locate(&path)
            .and_then(|file| fs::read_to_string(file).ok())
        else {
            return deps;
        };
        let mut seen = FxHashSet::default();
        seen.insert(path.clone());
        self.collect_dependencies(&text, &mut deps, &mut seen);
        deps.remove(&path);
        deps
    }
}

/// Read every text file below the layout folder as `(name, source)`.
fn read_layouts(root: &Path) -> Result<Vec<(String, String)>> {
    if !root.is_dir() {
        debug!("template"; "no layout folder at {}", root.display());
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(root).sort(true) {
        let entry = entry.map_err(|e| Error::io(root, io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.strip_prefix(root).map(to_key).unwrap_or_default();
        match fs::read_to_string(&path) {
            Ok(text) => templates.push((name, text)),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!("template"; "skipping binary layout file {}", name);
            }
            Err(e) => return Err(GenerationError::Io { path, source: e }.into()),
        }
    }
    Ok(templates)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        GenerationError::Io {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

fn register_url_functions(tera: &mut Tera, config: &Arc<SiteConfig>) {
    for (name, build) in URL_FUNCTIONS {
        let config = Arc::clone(config);
        tera.register_function(name, move |args: &HashMap<String, JsonValue>| {
            let path = args
                .get("path")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| ::tera::Error::msg(format!("`{name}` expects a string `path`")))?;
            Ok(JsonValue::String(build(&config, path)))
        });
    }
}

fn template_error(path: &str, err: &::tera::Error) -> Error {
    GenerationError::template(path, chain(err)).into()
}
