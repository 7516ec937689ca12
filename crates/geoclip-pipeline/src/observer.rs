use geoclip_core::ports::{StageEvent, StageObserver};

/// Observer that reports every completed stage through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StageObserver for TracingObserver {
    fn stage_completed(&self, event: &StageEvent) {
        tracing::info!(
            request_id = %event.request_id,
            stage = %event.stage,
            "{}",
            event.detail
        );
    }
}
