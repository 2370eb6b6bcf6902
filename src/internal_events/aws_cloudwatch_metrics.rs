use std::time::Instant;

use metrics::{counter, histogram};

use super::{InternalEvent, error_stage, error_type};
use crate::sources::aws_cloudwatch_metrics::GatherError;

#[derive(Debug)]
pub struct AwsCloudwatchMetricsClientInitialized<'a> {
    pub region: Option<&'a str>,
}

impl InternalEvent for AwsCloudwatchMetricsClientInitialized<'_> {
    fn emit(self) {
        debug!(
            message = "CloudWatch client initialized.",
            region = self.region.unwrap_or("default"),
        );
    }
}

#[derive(Debug)]
pub struct AwsCloudwatchMetricsRequestCompleted<'a> {
    pub namespace: &'a str,
    pub metric_name: &'a str,
    pub datapoints: usize,
    pub start: Instant,
    pub end: Instant,
}

impl InternalEvent for AwsCloudwatchMetricsRequestCompleted<'_> {
    fn emit(self) {
        debug!(
            message = "Request completed.",
            namespace = %self.namespace,
            metric_name = %self.metric_name,
            datapoints = %self.datapoints,
        );
        counter!("requests_completed_total").increment(1);
        histogram!("request_duration_seconds").record(self.end - self.start);
    }
}

#[derive(Debug)]
pub struct AwsCloudwatchMetricsEventsReceived<'a> {
    pub metric_name: &'a str,
    pub count: usize,
}

impl InternalEvent for AwsCloudwatchMetricsEventsReceived<'_> {
    fn emit(self) {
        trace!(
            message = "Events received.",
            metric_name = %self.metric_name,
            count = %self.count,
        );
        counter!("component_received_events_total").increment(self.count as u64);
    }
}

#[derive(Debug)]
pub struct AwsCloudwatchMetricsRequestError<'a> {
    pub namespace: &'a str,
    pub metric_name: &'a str,
    pub error: &'a crate::Error,
}

impl InternalEvent for AwsCloudwatchMetricsRequestError<'_> {
    fn emit(self) {
        error!(
            message = "GetMetricStatistics request failed.",
            namespace = %self.namespace,
            metric_name = %self.metric_name,
            error = %self.error,
            error_type = error_type::REQUEST_FAILED,
            stage = error_stage::RECEIVING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::REQUEST_FAILED,
            "stage" => error_stage::RECEIVING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct AwsCloudwatchMetricsGatherError<'a> {
    pub error: &'a GatherError,
}

impl InternalEvent for AwsCloudwatchMetricsGatherError<'_> {
    fn emit(self) {
        let kind = self.error.error_type();
        error!(
            message = "Poll cycle failed.",
            error = %self.error,
            error_type = kind,
            stage = error_stage::RECEIVING,
        );
        counter!(
            "component_errors_total",
            "error_type" => kind,
            "stage" => error_stage::RECEIVING,
        )
        .increment(1);
    }
}

/// A statistic was requested but the returned data point carries no value for it.
#[derive(Debug)]
pub struct AwsCloudwatchMetricsMissingStatistic<'a> {
    pub metric_name: &'a str,
    pub statistic: &'static str,
}

impl InternalEvent for AwsCloudwatchMetricsMissingStatistic<'_> {
    fn emit(self) {
        warn!(
            message = "Requested statistic missing from data point, skipping field.",
            metric_name = %self.metric_name,
            statistic = %self.statistic,
            error_type = error_type::CONVERSION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::CONVERSION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

/// A data point came back without a timestamp and cannot be turned into a record.
#[derive(Debug)]
pub struct AwsCloudwatchMetricsMissingTimestamp<'a> {
    pub metric_name: &'a str,
}

impl InternalEvent for AwsCloudwatchMetricsMissingTimestamp<'_> {
    fn emit(self) {
        warn!(
            message = "Data point without timestamp dropped.",
            metric_name = %self.metric_name,
            error_type = error_type::CONVERSION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::CONVERSION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
        counter!("component_discarded_events_total").increment(1);
    }
}
