mod aws_cloudwatch_metrics;
mod common;

pub use self::aws_cloudwatch_metrics::*;
pub use self::common::*;

pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}

pub mod error_stage {
    pub const RECEIVING: &str = "receiving";
    pub const PROCESSING: &str = "processing";
    pub const SENDING: &str = "sending";
}

pub mod error_type {
    /// An error occurred while validating or applying configuration.
    pub const CONFIGURATION_FAILED: &str = "configuration_failed";
    /// A value could not be converted into the output representation.
    pub const CONVERSION_FAILED: &str = "conversion_failed";
    /// The request to a remote service failed.
    pub const REQUEST_FAILED: &str = "request_failed";
    /// A spawned task panicked or was cancelled.
    pub const TASK_FAILED: &str = "task_failed";
    /// The downstream stream was closed.
    pub const WRITER_FAILED: &str = "writer_failed";
}
