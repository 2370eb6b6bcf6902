use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use snafu::{ResultExt, Snafu};
use tokio::{
    task::JoinSet,
    time::{self, MissedTickBehavior},
};
use tokio_stream::wrappers::IntervalStream;

use crate::{
    SourceSender,
    aws::{AwsAuthentication, RegionOrEndpoint},
    config::{SourceConfig, SourceContext},
    event::Record,
    internal_events::{
        AwsCloudwatchMetricsEventsReceived, AwsCloudwatchMetricsGatherError,
        AwsCloudwatchMetricsMissingStatistic, AwsCloudwatchMetricsMissingTimestamp,
        AwsCloudwatchMetricsRequestCompleted, AwsCloudwatchMetricsRequestError,
        CollectionCompleted, StreamClosedError, error_type,
    },
    serde::skip_serializing_if_default,
    shutdown::ShutdownSignal,
};

mod client;
mod period;
mod request_builder;

pub use client::{CloudwatchStatisticsClient, Datapoint, StatisticsClient};
pub use period::{PeriodError, parse_period};
pub use request_builder::{StatisticsQuery, build_query};

pub const DESCRIPTION: &str = "Pull Metric Statistics from Amazon CloudWatch";

const MEASUREMENT: &str = "cloudwatch";

#[derive(Debug, Snafu)]
enum BuildError {
    #[snafu(display("metric {}/{} requests no statistics", namespace, name))]
    EmptyStatistics { namespace: String, name: String },
    #[snafu(display("interval_secs must be greater than zero"))]
    ZeroInterval,
}

#[derive(Debug, Snafu)]
pub enum GatherError {
    #[snafu(display("failed to initialize CloudWatch client: {}", source))]
    Initialize { source: crate::Error },
    #[snafu(display("invalid period: {}", source))]
    InvalidPeriod { source: PeriodError },
    #[snafu(display("request for {}/{} failed: {}", namespace, metric_name, source))]
    Fetch {
        namespace: String,
        metric_name: String,
        source: crate::Error,
    },
    #[snafu(display("failed to forward records, downstream is closed"))]
    StreamClosed,
    #[snafu(display("metric task failed: {}", source))]
    TaskJoin { source: tokio::task::JoinError },
}

impl GatherError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Initialize { .. } | Self::Fetch { .. } => error_type::REQUEST_FAILED,
            Self::InvalidPeriod { .. } => error_type::CONFIGURATION_FAILED,
            Self::StreamClosed => error_type::WRITER_FAILED,
            Self::TaskJoin { .. } => error_type::TASK_FAILED,
        }
    }
}

/// The aggregate CloudWatch computes over each period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Statistic {
    Average,
    Maximum,
    Minimum,
    SampleCount,
    Sum,
}

impl Statistic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
            Self::SampleCount => "SampleCount",
            Self::Sum => "Sum",
        }
    }

    pub const fn value_of(self, point: &Datapoint) -> Option<f64> {
        match self {
            Self::Average => point.average,
            Self::Maximum => point.maximum,
            Self::Minimum => point.minimum,
            Self::SampleCount => point.sample_count,
            Self::Sum => point.sum,
        }
    }
}

impl From<Statistic> for aws_sdk_cloudwatch::types::Statistic {
    fn from(statistic: Statistic) -> Self {
        match statistic {
            Statistic::Average => Self::Average,
            Statistic::Maximum => Self::Maximum,
            Statistic::Minimum => Self::Minimum,
            Statistic::SampleCount => Self::SampleCount,
            Statistic::Sum => Self::Sum,
        }
    }
}

/// A dimension filter narrowing the metric down to a single time series.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionConfig {
    pub name: String,
    pub value: String,
}

impl DimensionConfig {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One CloudWatch metric to poll.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    /// The metric namespace, for example `AWS/ELB`.
    pub namespace: String,

    /// The metric name, for example `Latency`.
    pub name: String,

    /// The statistics to request. Each becomes one field of the emitted records.
    pub statistics: Vec<Statistic>,

    /// Dimension filters, sent in the order given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<DimensionConfig>,

    /// The unit to request. When unset, CloudWatch returns data in whatever unit it was
    /// published with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// A label attached to every record of this metric as the `tag` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Configuration for the `aws_cloudwatch_metrics` source.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AwsCloudwatchMetricsConfig {
    #[serde(flatten)]
    pub region: RegionOrEndpoint,

    #[serde(default, skip_serializing_if = "skip_serializing_if_default")]
    pub auth: AwsAuthentication,

    /// The CloudWatch aggregation period, which must be a whole number of minutes.
    ///
    /// Prefer an `interval_secs` that is a multiple of the period to avoid gaps or overlap in
    /// the pulled data.
    #[serde(default = "default_period")]
    pub period: String,

    /// The interval between polls.
    #[serde(default = "default_interval_secs")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub interval_secs: Duration,

    /// The metrics to poll.
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

pub fn default_period() -> String {
    "1m".to_owned()
}

pub const fn default_interval_secs() -> Duration {
    Duration::from_secs(60)
}

impl Default for AwsCloudwatchMetricsConfig {
    fn default() -> Self {
        let load_balancer = || vec![DimensionConfig::new("LoadBalancerName", "p-example")];

        Self {
            region: RegionOrEndpoint::with_region("us-east-1".to_owned()),
            auth: AwsAuthentication::default(),
            period: default_period(),
            interval_secs: default_interval_secs(),
            metrics: vec![
                MetricConfig {
                    namespace: "AWS/ELB".to_owned(),
                    name: "Latency".to_owned(),
                    statistics: vec![Statistic::Average, Statistic::Maximum],
                    dimensions: load_balancer(),
                    unit: Some("Seconds".to_owned()),
                    tag: Some("p-example-latency".to_owned()),
                },
                MetricConfig {
                    namespace: "AWS/ELB".to_owned(),
                    name: "RequestCount".to_owned(),
                    statistics: vec![Statistic::Sum],
                    dimensions: load_balancer(),
                    unit: Some("Count".to_owned()),
                    tag: Some("p-example-req".to_owned()),
                },
            ],
        }
    }
}

impl_generate_config_from_default!(AwsCloudwatchMetricsConfig);

impl AwsCloudwatchMetricsConfig {
    fn validate(&self) -> Result<(), BuildError> {
        if self.interval_secs.is_zero() {
            return ZeroIntervalSnafu.fail();
        }
        match self.metrics.iter().find(|metric| metric.statistics.is_empty()) {
            Some(metric) => EmptyStatisticsSnafu {
                namespace: &metric.namespace,
                name: &metric.name,
            }
            .fail(),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde(name = "aws_cloudwatch_metrics")]
impl SourceConfig for AwsCloudwatchMetricsConfig {
    async fn build(&self, cx: SourceContext) -> crate::Result<super::Source> {
        self.validate()?;

        let client = CloudwatchStatisticsClient::new(self.auth.clone(), self.region.clone());
        let source = AwsCloudwatchMetrics::new(Arc::new(client), &self.period, &self.metrics);

        Ok(Box::pin(source.run(self.interval_secs, cx.shutdown, cx.out)))
    }

    fn source_type(&self) -> &'static str {
        "aws_cloudwatch_metrics"
    }
}

/// Polls every configured metric once per cycle and forwards the data points as records.
pub struct AwsCloudwatchMetrics {
    client: Arc<dyn StatisticsClient>,
    period: String,
    metrics: Vec<Arc<MetricConfig>>,
}

impl AwsCloudwatchMetrics {
    pub fn new(client: Arc<dyn StatisticsClient>, period: &str, metrics: &[MetricConfig]) -> Self {
        Self {
            client,
            period: period.to_owned(),
            metrics: metrics.iter().cloned().map(Arc::new).collect(),
        }
    }

    async fn run(
        self,
        interval: Duration,
        shutdown: ShutdownSignal,
        out: SourceSender,
    ) -> Result<(), ()> {
        // Missed ticks are skipped: a cycle that outlasts the interval is followed by at most
        // one immediate cycle.
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut interval = IntervalStream::new(ticker).take_until(shutdown);
        while interval.next().await.is_some() {
            let start = Instant::now();
            let result = self.gather(&out).await;
            emit!(CollectionCompleted {
                start,
                end: Instant::now()
            });

            match result {
                Ok(_) => {}
                Err(GatherError::StreamClosed) => return Err(()),
                Err(error) => emit!(AwsCloudwatchMetricsGatherError { error: &error }),
            }
        }

        Ok(())
    }

    /// Runs one poll cycle, returning the number of records forwarded.
    ///
    /// Every metric task runs to completion even after one of them fails. The first failure to
    /// complete is the one returned; records from the other metrics are still delivered.
    pub async fn gather(&self, out: &SourceSender) -> Result<usize, GatherError> {
        self.client.initialize().await.context(InitializeSnafu)?;

        let now = Utc::now();
        let period = parse_period(&self.period).context(InvalidPeriodSnafu)?;

        let mut tasks = JoinSet::new();
        for metric in &self.metrics {
            tasks.spawn(gather_metric(
                Arc::clone(&self.client),
                Arc::clone(metric),
                period,
                now,
                out.clone(),
            ));
        }

        let mut count = 0;
        let mut first_error = None;
        while let Some(result) = tasks.join_next().await {
            match result.context(TaskJoinSnafu).and_then(|result| result) {
                Ok(sent) => count += sent,
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(count),
        }
    }
}

async fn gather_metric(
    client: Arc<dyn StatisticsClient>,
    metric: Arc<MetricConfig>,
    period: Duration,
    now: DateTime<Utc>,
    out: SourceSender,
) -> Result<usize, GatherError> {
    let query = build_query(&metric, period, now);

    let start = Instant::now();
    let datapoints = match client.fetch(query).await {
        Ok(datapoints) => datapoints,
        Err(error) => {
            emit!(AwsCloudwatchMetricsRequestError {
                namespace: &metric.namespace,
                metric_name: &metric.name,
                error: &error,
            });
            return Err(GatherError::Fetch {
                namespace: metric.namespace.clone(),
                metric_name: metric.name.clone(),
                source: error,
            });
        }
    };
    emit!(AwsCloudwatchMetricsRequestCompleted {
        namespace: &metric.namespace,
        metric_name: &metric.name,
        datapoints: datapoints.len(),
        start,
        end: Instant::now(),
    });

    let mut count = 0;
    for (index, point) in datapoints.iter().enumerate() {
        let Some(record) = to_record(&metric, point) else {
            continue;
        };
        if out.send_event(record).is_err() {
            emit!(StreamClosedError {
                count: datapoints.len() - index
            });
            return Err(GatherError::StreamClosed);
        }
        count += 1;
    }
    emit!(AwsCloudwatchMetricsEventsReceived {
        metric_name: &metric.name,
        count,
    });

    Ok(count)
}

/// Maps one data point to a record. Points without a timestamp are dropped.
fn to_record(metric: &MetricConfig, point: &Datapoint) -> Option<Record> {
    let Some(timestamp) = point.timestamp else {
        emit!(AwsCloudwatchMetricsMissingTimestamp {
            metric_name: &metric.name,
        });
        return None;
    };

    let mut record = Record::new(MEASUREMENT, timestamp);
    record.insert_tag("name", metric.name.as_str());
    if let Some(unit) = &point.unit {
        record.insert_tag("unit", unit.as_str());
    }
    if let Some(tag) = metric.tag.as_deref().filter(|tag| !tag.is_empty()) {
        record.insert_tag("tag", tag);
    }

    for statistic in &metric.statistics {
        match statistic.value_of(point) {
            Some(value) => record.insert_field(statistic.as_str(), value),
            None => emit!(AwsCloudwatchMetricsMissingStatistic {
                metric_name: &metric.name,
                statistic: statistic.as_str(),
            }),
        }
    }

    Some(record)
}
