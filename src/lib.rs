#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod agents;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod model;
pub mod prompts;
pub mod report;

pub use agents::{Orchestrator, Request, Response};
pub use config::Config;
pub use error::{OutreachError, Result};
