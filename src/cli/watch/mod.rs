//! `lode watch`: regenerate on change.
//!
//! ```text
//! notify ─► mpsc ─► Debouncer (timing) ─► Plan (classification) ─► Generator
//! ```
//!
//! The watcher starts before the first generation so nothing written during
//! it is lost. Generator calls are strictly serial; the loop owns the only
//! `Generator`. Ctrl-C ends the loop and the dependency map is saved.

mod debouncer;
mod plan;

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use crate::config::SiteConfig;
use crate::error::chain;
use crate::generator::{GenerationStats, Generator};
use crate::logger::{plural, status_error, status_success, status_unchanged};
use crate::{debug, log};
use debouncer::Debouncer;
use plan::Plan;

/// Ctrl-C received
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Longest wait before checking `SHUTDOWN` again.
const POLL: Duration = Duration::from_millis(200);

pub fn watch_site(config: Arc<SiteConfig>) -> Result<()> {
    ctrlc::set_handler(|| SHUTDOWN.store(true, Ordering::SeqCst))
        .context("failed to set the Ctrl-C handler")?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    for root in [config.content_root(), config.layout_root()] {
        if root.is_dir() {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", root.display()))?;
        } else {
            debug!("watch"; "not watching missing {}", root.display());
        }
    }
    if let Some(parent) = config.config_path.as_deref().and_then(Path::parent) {
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
    }

    let mut generator = Generator::from_config(config)?;
    run(&mut generator, Step::Full)?;
    log!("watch"; "watching for changes, Ctrl-C to stop");

    let mut debouncer = Debouncer::new();
    while !SHUTDOWN.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.sleep_duration().min(POLL)) {
            Ok(Ok(event)) => debouncer.add_event(&event),
            Ok(Err(err)) => log!("watch"; "watch error: {}", err),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let Some(changes) = debouncer.take_if_ready() else {
            continue;
        };
        let plan = Plan::classify(&changes, generator.config());
        if plan.is_empty() {
            continue;
        }
        // errors are reported, the loop keeps going
        let _ = run(&mut generator, Step::Plan(plan));
    }

    log!("watch"; "stopping");
    generator
        .save_dependencies()
        .context("failed to save the dependency map")?;
    Ok(())
}

enum Step {
    Full,
    Plan(Plan),
}

/// Execute one step and report it on the status line.
fn run(generator: &mut Generator, step: Step) -> crate::error::Result<()> {
    let result = match step {
        Step::Full => generator.generate_all(true).map(|()| generator.stats()),
        Step::Plan(plan) => apply(generator, plan),
    };
    match result {
        Ok(stats) if stats.processed() == 0 => {
            status_unchanged("nothing to regenerate");
            Ok(())
        }
        Ok(stats) => {
            status_success(&format!("regenerated {}", plural(stats.processed(), "resource")));
            Ok(())
        }
        Err(err) => {
            status_error("generation failed", &chain(&err));
            Err(err)
        }
    }
}

fn apply(generator: &mut Generator, plan: Plan) -> crate::error::Result<GenerationStats> {
    if plan.reload {
        generator.reload();
    }
    if plan.full {
        generator.generate_all(true)?;
        return Ok(generator.stats());
    }
    generator.begin_site_if_needed()?;

    let content_root = generator.config().content_root().to_path_buf();
    let mut resources = Vec::new();
    let mut nodes = Vec::new();
    for path in &plan.content {
        let content = generator.site().content();
        let Some(id) = content.resource_from_path(path) else {
            continue;
        };
        let relative = content.relative_path(id);
        if generator.site().resource(id).is_processable {
            resources.push(relative.clone());
        } else if let Some(parent) = path.parent() {
            // node metadata: the whole folder is affected
            nodes.push(parent.to_path_buf());
        }
        resources.extend(generator.dependents_of(&relative));
    }
    for layout in &plan.layouts {
        let dependents = generator.dependents_of(layout);
        if dependents.is_empty() {
            debug!("watch"; "nothing uses layout {}", layout);
        }
        resources.extend(dependents);
    }
    resources.sort();
    resources.dedup();

    let mut total = GenerationStats::default();
    if !nodes.is_empty() {
        generator.reload();
        for node in &nodes {
            generator.generate_node_at_path(node, false)?;
            total.add(generator.stats());
        }
    }
    for relative in resources {
        generator.generate_resource_at_path(&content_root.join(relative), true)?;
        total.add(generator.stats());
    }
    Ok(total)
}
