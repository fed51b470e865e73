//! Pipeline stages and the sequential state machine over them.

use std::fmt;

use serde::Serialize;
use tracing::{error, info};

use crate::error::ForecastError;

/// A pipeline stage. Runs move strictly forward through
/// `Loaded → CrossValidated → Selected → FinalFitted → Reported`,
/// or end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Loaded,
    CrossValidated,
    Selected,
    FinalFitted,
    Reported,
    Failed,
}

impl PipelineStage {
    /// The stage that follows this one in a successful run.
    pub fn successor(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Loaded => Some(PipelineStage::CrossValidated),
            PipelineStage::CrossValidated => Some(PipelineStage::Selected),
            PipelineStage::Selected => Some(PipelineStage::FinalFitted),
            PipelineStage::FinalFitted => Some(PipelineStage::Reported),
            PipelineStage::Reported | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Reported | PipelineStage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Loaded => "loaded",
            PipelineStage::CrossValidated => "cross_validated",
            PipelineStage::Selected => "selected",
            PipelineStage::FinalFitted => "final_fitted",
            PipelineStage::Reported => "reported",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of a run.
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: PipelineStage,
    /// Last non-failed stage reached.
    reached: PipelineStage,
}

impl StageTracker {
    /// A run whose series has been loaded.
    pub fn loaded() -> Self {
        info!(stage = %PipelineStage::Loaded, "pipeline stage");
        Self {
            current: PipelineStage::Loaded,
            reached: PipelineStage::Loaded,
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    /// Move to `next`, which must be the successor of the current stage.
    pub fn advance(&mut self, next: PipelineStage) -> Result<(), ForecastError> {
        if self.current.successor() != Some(next) {
            return Err(ForecastError::InvalidParameter(format!(
                "invalid stage transition {} -> {}",
                self.current, next
            )));
        }
        info!(stage = %next, "pipeline stage");
        self.current = next;
        self.reached = next;
        Ok(())
    }

    /// Enter the terminal failed state and build the error carrying `reason`.
    pub fn fail(&mut self, reason: impl fmt::Display) -> ForecastError {
        let reason = reason.to_string();
        error!(after = %self.reached, %reason, "pipeline failed");
        self.current = PipelineStage::Failed;
        ForecastError::PipelineFailed {
            stage: self.reached,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order() {
        let mut tracker = StageTracker::loaded();
        for next in [
            PipelineStage::CrossValidated,
            PipelineStage::Selected,
            PipelineStage::FinalFitted,
            PipelineStage::Reported,
        ] {
            tracker.advance(next).unwrap();
        }
        assert!(tracker.current().is_terminal());
        assert_eq!(tracker.current().successor(), None);
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let mut tracker = StageTracker::loaded();
        assert!(tracker.advance(PipelineStage::Selected).is_err());
        assert_eq!(tracker.current(), PipelineStage::Loaded);
    }

    #[test]
    fn fail_records_last_reached_stage() {
        let mut tracker = StageTracker::loaded();
        tracker.advance(PipelineStage::CrossValidated).unwrap();
        let err = tracker.fail("no model has a valid sMAPE");

        assert_eq!(tracker.current(), PipelineStage::Failed);
        assert_eq!(
            err,
            ForecastError::PipelineFailed {
                stage: PipelineStage::CrossValidated,
                reason: "no model has a valid sMAPE".to_string(),
            }
        );
        assert!(tracker.advance(PipelineStage::Selected).is_err());
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(PipelineStage::Loaded.to_string(), "loaded");
        assert_eq!(PipelineStage::FinalFitted.to_string(), "final_fitted");
    }
}
