//! Run state machine
//!
//! `Idle -> Ingesting -> Cleaning -> Aggregating -> Done`, with `Failed`
//! reachable from every stage state. A run that stops early goes straight from
//! its last stage to `Done`. Nothing ever moves backwards.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, WarehouseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Ingesting,
    Cleaning,
    Aggregating,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether the run has ended
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether a stage is running in this state
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Ingesting | Self::Cleaning | Self::Aggregating)
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Ingesting)
                | (Self::Ingesting, Self::Cleaning)
                | (Self::Cleaning, Self::Aggregating)
                | (
                    Self::Ingesting | Self::Cleaning | Self::Aggregating,
                    Self::Done | Self::Failed
                )
        )
    }

    /// The next state, if the move is allowed
    ///
    /// # Errors
    /// Returns [`WarehouseError::InvalidTransition`] for any other move
    pub fn transition(self, next: Self) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(WarehouseError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Ingesting => "Ingesting",
            Self::Cleaning => "Cleaning",
            Self::Aggregating => "Aggregating",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// How far a run goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Stop after the bronze layer
    IngestOnly,
    /// Stop after the silver layer
    ThroughCleaning,
    #[default]
    Full,
}

impl RunMode {
    /// The last stage state this mode enters
    #[must_use]
    pub const fn last_stage(self) -> PipelineState {
        match self {
            Self::IngestOnly => PipelineState::Ingesting,
            Self::ThroughCleaning => PipelineState::Cleaning,
            Self::Full => PipelineState::Aggregating,
        }
    }

    /// Whether the run continues after `stage`
    #[must_use]
    pub fn continues_after(self, stage: PipelineState) -> bool {
        stage != self.last_stage()
    }
}
