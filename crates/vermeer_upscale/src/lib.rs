//! Lifecycle supervision for the external image-enhancement server.
//!
//! The enhancement server is a long-running child process bound to a
//! loopback host/port. This crate owns its full lifecycle: one-shot
//! dependency installation, process start, health-check polling until the
//! server finishes loading its models, serialized enhancement requests
//! (the server is not safely concurrent), and cooperative-then-forced
//! shutdown of the whole process tree.

#![warn(missing_docs)]

mod client;
mod config;
mod process;
mod supervisor;

pub use client::{UpscaleClient, UpscaleOutcome};
pub use config::{CommandSpec, EnhanceDefaults, UpscaleConfig};
pub use supervisor::{Supervisor, SupervisorState};
pub use vermeer_error::{UpscaleError, UpscaleErrorKind};
