//! Turns a free-text command into validated home state transitions.
//!
//! The layers nest: the dispatcher offers the two domain controllers to the
//! oracle, each controller offers its extractor, normalizer and setter, and
//! only the setters touch the [`HomeStore`].

use std::{sync::Arc, time::Duration};

use home_state::HomeStore;
use oracle::Oracle;

pub mod capability;
mod dispatcher;
mod error;
pub mod generation;
pub mod lights;
pub mod thermostat;

pub use dispatcher::handle_command;
pub use error::PipelineError;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub oracle_timeout: Duration,
    pub max_tool_rounds: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_secs(30),
            max_tool_rounds: 5,
        }
    }
}

#[derive(Clone)]
pub struct HomeContext {
    pub store: HomeStore,
    pub oracle: Arc<dyn Oracle>,
    pub options: PipelineOptions,
}

impl HomeContext {
    pub fn new(store: HomeStore, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            store,
            oracle,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
