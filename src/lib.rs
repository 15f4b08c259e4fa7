//! breakwind - consolidated media-query stylesheet generation
//!
//! This library scans project source files for utility-class tokens that
//! encode an ad-hoc responsive breakpoint (for example `media-max-768:hidden`,
//! meaning "apply `hidden` when the viewport is at most 768px wide") and emits
//! a single stylesheet containing the corresponding media-query rules.
//!
//! The CSS for each utility class is produced by an external engine
//! (`railwind`); breakwind itself only owns the extraction, grouping,
//! assembly, and regeneration pipeline.
//!
//! # Pipeline
//!
//! Data flows strictly one direction:
//!
//! 1. [`scanner`]: enumerate files from the configured glob patterns and
//!    extract every breakpoint token, deduplicated by raw token text.
//! 2. [`resolver`]: ask the utility engine for the declaration block of each
//!    token's utility class; unresolvable classes are warned about and
//!    dropped, never fatal.
//! 3. [`assembler`]: group resolved rules by `(direction, pixels)` and render
//!    one media-query block per group into a deterministic document.
//! 4. [`pipeline`]: drive one full run (or repeated runs in watch mode), own
//!    the output write and the optional post-generation command.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod util;

pub use assembler::assemble;
pub use cli::commands::CliArgs;
pub use config::{load_config, ConfigError, EngineConfig};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, RunSummary};
pub use resolver::{resolve_all, RailwindEngine, ResolvedRule, UtilityEngine};
pub use scanner::{scan, BreakpointToken, Direction, TokenSet};
pub use util::{init_logging, parse_level, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
