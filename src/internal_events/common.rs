use std::time::Instant;

use metrics::{counter, histogram};

use super::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub struct CollectionCompleted {
    pub start: Instant,
    pub end: Instant,
}

impl InternalEvent for CollectionCompleted {
    fn emit(self) {
        debug!(message = "Collection completed.");
        counter!("collect_completed_total").increment(1);
        histogram!("collect_duration_seconds").record(self.end - self.start);
    }
}

#[derive(Debug)]
pub struct StreamClosedError {
    pub count: usize,
}

impl InternalEvent for StreamClosedError {
    fn emit(self) {
        error!(
            message = "Failed to forward event(s), downstream is closed.",
            count = %self.count,
            error_type = error_type::WRITER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::WRITER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("component_discarded_events_total").increment(self.count as u64);
    }
}
