//! Hooks into a running pipeline

use crate::pipeline::{PipelineState, RunReport};
use crate::session::Session;

/// Receives run events; every method defaults to doing nothing
///
/// Observers only get shared access to the session, so they can read
/// relations but never change them.
pub trait RunObserver {
    /// The run moved from `from` to `to`
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        let _ = (from, to);
    }

    /// `stage` finished and its relations are registered in `session`
    fn on_stage_complete(&self, stage: PipelineState, session: &Session) {
        let _ = (stage, session);
    }

    /// The session of the run was released
    fn on_session_released(&self, session_id: &str) {
        let _ = session_id;
    }

    /// The run ended, successfully or not
    fn on_run_complete(&self, report: &RunReport) {
        let _ = report;
    }
}

/// Logs every event at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl RunObserver for LoggingObserver {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        log::debug!("Pipeline state {from} -> {to}");
    }

    fn on_stage_complete(&self, stage: PipelineState, session: &Session) {
        log::debug!(
            "{stage} complete, session {} holds {} relations",
            session.id(),
            session.relation_names().len()
        );
    }

    fn on_session_released(&self, session_id: &str) {
        log::debug!("Session {session_id} released");
    }

    fn on_run_complete(&self, report: &RunReport) {
        log::debug!("Run {} ended in state {}", report.session_id, report.state);
    }
}
