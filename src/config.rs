//! Embedding configuration.
//!
//! This crate exposes no binary entry point, so there is no `clap::Parser`
//! or environment-variable layer here: the embedding host decides how to
//! build an `EngineConfig` (CLI flags, a config file, a test fixture) and
//! hands it to [`crate::attacker_state::init`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub active: bool,
    pub quantum: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            active: true,
            quantum: false,
        }
    }
}

impl EngineConfig {
    pub fn apply(&self) {
        crate::attacker_state::init_quantum(self.active, self.quantum);
    }
}
