//! The regeneration controller: drives full pipeline runs and owns every
//! side effect (output write, post-generation command, watch loop).
//!
//! A run always executes the whole pipeline over the whole file set: load
//! config, scan, resolve, assemble, write. There is no incremental diffing
//! between runs; that is a known scaling limitation, not a correctness
//! requirement. In watch mode, runs are serialized on a single consumer loop
//! and bursts of change events are debounced into one trailing run, so two
//! runs can never interleave writes to the output file.

use crate::assembler::assemble;
use crate::config::{load_config, ConfigError};
use crate::resolver::{resolve_all, RailwindEngine, UtilityEngine};
use crate::scanner::{self, scan};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, warn};

const OUTPUT_HEADER: &str = "/*! breakwind | generated file, do not edit */";

/// Quiet window for coalescing bursts of file-change events.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Fatal pipeline errors. These abort the current run; in watch mode the
/// watcher itself survives them and waits for the next change event.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start file watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// Controller configuration, assembled from the CLI surface.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Path to the engine configuration providing the content glob patterns.
    pub config_path: PathBuf,
    /// Output stylesheet path, overwritten wholesale on every successful run.
    pub output_path: PathBuf,
    /// Optional shell command executed after each successful generation.
    pub post_command: Option<String>,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct breakpoint tokens found by the scanner.
    pub tokens_found: usize,
    /// Rules actually written (tokens minus resolution gaps).
    pub rules_written: usize,
}

/// One logical pipeline instance. All entities it builds are transient and
/// rebuilt in full on every run; the only persisted state is the output file.
pub struct Pipeline<E: UtilityEngine> {
    engine: E,
    options: PipelineOptions,
}

impl Pipeline<RailwindEngine> {
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_engine(RailwindEngine::new(), options)
    }
}

impl<E: UtilityEngine> Pipeline<E> {
    pub fn with_engine(engine: E, options: PipelineOptions) -> Self {
        Self { engine, options }
    }

    /// Executes one full run: scan, resolve, assemble, write, post-command.
    ///
    /// A failed post-command is logged but does not flip the run's outcome;
    /// the run already succeeded once the output file is in place.
    pub async fn run_once(&self) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();

        let config = load_config(&self.options.config_path)?;
        let tokens = scan(&config.content);
        let resolved = resolve_all(&self.engine, &tokens);
        let body = assemble(&resolved);

        let document = if body.is_empty() {
            format!("{}\n", OUTPUT_HEADER)
        } else {
            format!("{}\n\n{}", OUTPUT_HEADER, body)
        };
        self.write_output(&document)?;

        let rules_written = resolved.iter().filter(|r| r.declarations.is_some()).count();
        info!(
            tokens_found = tokens.len(),
            rules_written,
            output = %self.options.output_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stylesheet generated"
        );

        if let Some(command) = &self.options.post_command {
            run_post_command(command).await;
        }

        Ok(RunSummary {
            tokens_found: tokens.len(),
            rules_written,
        })
    }

    /// Writes the document atomically: a temp file in the output directory is
    /// renamed over the destination, so readers never see a partial write.
    fn write_output(&self, document: &str) -> Result<(), PipelineError> {
        let path = &self.options.output_path;
        let write_err = |source| PipelineError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = temp_output_path(path);
        fs::write(&tmp, document).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    /// Runs once, then regenerates on every relevant file-change event until
    /// the watcher channel closes.
    ///
    /// Per-run failures (including the initial run) are logged and leave the
    /// loop idle awaiting the next event; only a watcher that cannot be
    /// started at all, or a configuration with no loadable glob patterns, is
    /// fatal.
    pub async fn watch(&self) -> Result<(), PipelineError> {
        if let Err(err) = self.run_once().await {
            error!(error = %err, "Initial generation failed, waiting for changes");
        }

        // The watch targets come from the same patterns the scanner uses.
        let config = load_config(&self.options.config_path)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(
            move |event: Result<notify::Event, notify::Error>| {
                let _ = tx.send(event);
            },
        )?;

        // Roots are kept in canonical form so event paths, which arrive
        // absolute, can be related back to them.
        let mut watched = Vec::new();
        for root in watch_roots(&config.content) {
            match watcher.watch(&root, RecursiveMode::Recursive) {
                Ok(()) => watched.push(root.canonicalize().unwrap_or(root)),
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "Failed to watch path");
                }
            }
        }
        if watched.is_empty() {
            let cwd = Path::new(".");
            watcher.watch(cwd, RecursiveMode::Recursive)?;
            watched.push(cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf()));
        }

        info!("Watching for changes (press Ctrl+C to stop)");

        while let Some(event) = rx.recv().await {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "Watch error");
                    continue;
                }
            };
            if !self.is_relevant(&event, &watched) {
                continue;
            }

            drain_events(&mut rx, DEBOUNCE_WINDOW).await;

            debug!("Change detected, regenerating");
            if let Err(err) = self.run_once().await {
                error!(error = %err, "Regeneration failed, waiting for next change");
            }
        }

        Ok(())
    }

    /// Create and modify events on visible paths trigger regeneration;
    /// deletions, dotfiles below a watched root, and the pipeline's own
    /// output writes do not.
    fn is_relevant(&self, event: &notify::Event, roots: &[PathBuf]) -> bool {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return false;
        }
        event
            .paths
            .iter()
            .any(|path| !is_hidden_below(path, roots) && !self.is_own_output(path))
    }

    /// The output file and the temp file it is renamed from are both the
    /// pipeline's own writes; when the output lives inside a watched root,
    /// their events must not feed back into the loop.
    fn is_own_output(&self, path: &Path) -> bool {
        let output = &self.options.output_path;
        let tmp = temp_output_path(output);
        if path == output.as_path() || path == tmp {
            return true;
        }
        // Event paths arrive absolute while the configured output may be
        // relative. The temp file is usually already renamed away by the
        // time its event is seen, so only directories are canonicalized.
        let Some(name) = path.file_name() else {
            return false;
        };
        if Some(name) != output.file_name() && Some(name) != tmp.file_name() {
            return false;
        }
        match (canonical_parent(path), canonical_parent(output)) {
            (Some(event_dir), Some(output_dir)) => event_dir == output_dir,
            _ => false,
        }
    }
}

/// The staging path the output is atomically renamed from. `write_output`
/// and the watch-event filter must agree on this name.
fn temp_output_path(output: &Path) -> PathBuf {
    let mut tmp = output.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn canonical_parent(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.canonicalize().ok(),
        _ => Path::new(".").canonicalize().ok(),
    }
}

/// Drains queued events until the channel stays quiet for the given window,
/// coalescing a burst into a single trailing regeneration.
async fn drain_events(
    rx: &mut UnboundedReceiver<Result<notify::Event, notify::Error>>,
    quiet: Duration,
) {
    loop {
        match tokio::time::timeout(quiet, rx.recv()).await {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
}

/// Hidden-ness is judged below the watched roots only, so a project living
/// under a dot-directory ancestor (a `/tmp/.tmp*` tempdir, `~/.local`) still
/// sees its own events. A path under none of the roots is judged whole.
fn is_hidden_below(path: &Path, roots: &[PathBuf]) -> bool {
    for root in roots {
        if let Ok(below) = path.strip_prefix(root) {
            return has_hidden_component(below);
        }
    }
    has_hidden_component(path)
}

fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .map(|name| name.starts_with('.') && name.len() > 1)
            .unwrap_or(false),
        _ => false,
    })
}

/// Deduplicated literal roots of the content patterns, used as watch targets.
fn watch_roots(patterns: &[String]) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let root = scanner::glob_root(pattern);
        if seen.insert(root.clone()) {
            roots.push(root);
        }
    }

    roots
}

/// Executes the post-generation command through the platform shell. Output is
/// captured for logging; a failure is logged as an error and nothing more,
/// the generation itself already counts as successful.
async fn run_post_command(command: &str) {
    info!(command, "Running post-generation command");

    match shell_command(command).output().await {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stdout.trim().is_empty() {
                debug!(stdout = %stdout.trim(), "Post-command output");
            }
            if !stderr.trim().is_empty() {
                debug!(stderr = %stderr.trim(), "Post-command stderr");
            }
            if !output.status.success() {
                error!(
                    command,
                    status = %output.status,
                    "Post-generation command failed"
                );
            }
        }
        Err(err) => {
            error!(command, error = %err, "Failed to spawn post-generation command");
        }
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut shell = tokio::process::Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}

#[cfg(windows)]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut shell = tokio::process::Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}
