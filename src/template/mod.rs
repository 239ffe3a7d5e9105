//! Template adapter contract.
//!
//! The generator only needs two capabilities from a template engine: render a
//! resource, and report which files a resource pulls in. Everything else about
//! the engine (syntax, filters, functions) stays behind this trait.
//!
//! ```text
//! Generator ──configure(site)──────────────────────► TemplateEngine
//!           ──render_resource(site, id, ctx, hooks)─►   │
//!                                                       ├─ hooks.preprocess(text)   (plugin bus)
//!                                                       ├─ ctx(site, id)
//!                                                       └─ render
//!           ──get_dependencies(path)───────────────►  DependencySet
//! ```
//!
//! The context is built only after `preprocess`, since plugins may update
//! metadata from the text they see.
//!
//! `TextHooks` is how templated text reaches plugins: the engine passes the
//! source of every content-resident template through `preprocess` before
//! compiling it. The plugin bus implements it.

mod refs;
mod tera;

pub use self::tera::TeraTemplate;
pub use refs::{TemplateRef, scan};

use serde_json::Value as JsonValue;

use crate::deps::DependencySet;
use crate::error::Result;
use crate::site::{ResourceId, Site};

/// Builds the render context of a resource.
pub type ContextBuilder<'a> = &'a dyn Fn(&Site, ResourceId) -> JsonValue;

/// Text transforms wired between the template engine and the plugin bus.
pub trait TextHooks {
    /// Runs on resource text before it is compiled.
    fn preprocess(&mut self, site: &mut Site, id: ResourceId, text: String) -> Result<String>;

    /// Runs on rendered output before it is written.
    fn postprocess(&mut self, site: &mut Site, id: ResourceId, text: String) -> Result<String>;
}

pub trait TemplateEngine {
    fn name(&self) -> &str;

    /// (Re)load layouts and bind site-level helpers.
    fn configure(&mut self, site: &Site) -> Result<()>;

    /// Render a text resource; `context` is called once its text went through
    /// `hooks.preprocess`.
    ///
    /// Failures are `GenerationError::Template`.
    fn render_resource(
        &mut self,
        site: &mut Site,
        id: ResourceId,
        context: ContextBuilder<'_>,
        hooks: &mut dyn TextHooks,
    ) -> Result<String>;

    /// Render a template string with `context`.
    fn render(&mut self, text: &str, context: &JsonValue) -> Result<String>;

    /// Templates pulled in by the template named `path` (layout folder
    /// first, then content folder), followed transitively.
    fn get_dependencies(&self, path: &str) -> DependencySet;
}
