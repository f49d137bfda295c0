#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the verbosity model of the metadata restoration workspace.
//! Diagnostics are ordinary [`tracing`] events whose targets name one of the
//! restoration [`Subsystem`]s; this crate turns a `-v` count into filter
//! directives and installs the stderr subscriber.
//!
//! # Design
//!
//! - [`VerbosityConfig`] maps a verbose level onto per-subsystem levels and
//!   renders them as `EnvFilter` directives.
//! - [`init_tracing`] installs a `tracing-subscriber` registry with a fmt
//!   layer, appending directives from the `METARESTORE_LOG` variable.
//! - The `trace_*!` macros emit events with the matching subsystem target so
//!   call sites do not repeat target strings.
//!
//! # Examples
//!
//! ```
//! use logging::{Subsystem, VerbosityConfig};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.levels.get(Subsystem::Times), 2);
//! assert!(config.filter_directives().contains("metarestore::times=debug"));
//! ```

mod config;
mod levels;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{Subsystem, SubsystemLevels};
pub use tracing_bridge::{LOG_ENV, build_filter, init_tracing, init_tracing_with_filter};
