use async_trait::async_trait;
use aws_sdk_cloudwatch::{
    Client,
    types::{Dimension, StandardUnit},
};
use aws_smithy_types::DateTime as AwsDateTime;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use super::request_builder::StatisticsQuery;
use crate::{
    aws::{AwsAuthentication, ClientBuilder, RegionOrEndpoint, create_client},
    internal_events::AwsCloudwatchMetricsClientInitialized,
};

/// One aggregated bucket returned by CloudWatch, with a value for each statistic it carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Datapoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub unit: Option<String>,
    pub average: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub sample_count: Option<f64>,
    pub sum: Option<f64>,
}

impl From<&aws_sdk_cloudwatch::types::Datapoint> for Datapoint {
    fn from(point: &aws_sdk_cloudwatch::types::Datapoint) -> Self {
        Self {
            timestamp: point
                .timestamp()
                .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())),
            unit: point.unit().map(|unit| unit.as_str().to_owned()),
            average: point.average(),
            maximum: point.maximum(),
            minimum: point.minimum(),
            sample_count: point.sample_count(),
            sum: point.sum(),
        }
    }
}

/// The remote side of a poll cycle.
#[async_trait]
pub trait StatisticsClient: Send + Sync {
    /// Prepares the client. Only the first successful call does any work.
    async fn initialize(&self) -> crate::Result<()>;

    /// Issues a single request; errors are returned as-is, never retried.
    async fn fetch(&self, query: StatisticsQuery) -> crate::Result<Vec<Datapoint>>;
}

struct CloudwatchMetricsClientBuilder;

impl ClientBuilder for CloudwatchMetricsClientBuilder {
    type Client = Client;

    fn build(config: &aws_types::SdkConfig) -> Self::Client {
        Client::new(config)
    }
}

/// [`StatisticsClient`] backed by the AWS SDK. The SDK client is built lazily and then shared
/// by every fetch for the lifetime of the source.
pub struct CloudwatchStatisticsClient {
    auth: AwsAuthentication,
    region: RegionOrEndpoint,
    client: OnceCell<Client>,
}

impl CloudwatchStatisticsClient {
    pub fn new(auth: AwsAuthentication, region: RegionOrEndpoint) -> Self {
        Self {
            auth,
            region,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> crate::Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = create_client::<CloudwatchMetricsClientBuilder>(
                    &self.auth,
                    self.region.region(),
                    self.region.endpoint(),
                )
                .await?;
                emit!(AwsCloudwatchMetricsClientInitialized {
                    region: self.region.region.as_deref(),
                });
                Ok::<_, crate::Error>(client)
            })
            .await
    }
}

#[async_trait]
impl StatisticsClient for CloudwatchStatisticsClient {
    async fn initialize(&self) -> crate::Result<()> {
        self.client().await.map(|_| ())
    }

    async fn fetch(&self, query: StatisticsQuery) -> crate::Result<Vec<Datapoint>> {
        let client = self.client().await?;

        let dimensions = query
            .dimensions
            .into_iter()
            .map(|dimension| {
                Dimension::builder()
                    .name(dimension.name)
                    .value(dimension.value)
                    .build()
            })
            .collect();
        let statistics = query
            .statistics
            .into_iter()
            .map(Into::into)
            .collect::<Vec<aws_sdk_cloudwatch::types::Statistic>>();

        let output = client
            .get_metric_statistics()
            .namespace(query.namespace)
            .metric_name(query.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(to_aws_datetime(query.start))
            .end_time(to_aws_datetime(query.end))
            .period(query.period_seconds)
            .set_statistics(Some(statistics))
            .set_unit(query.unit.map(|unit| StandardUnit::from(unit.as_str())))
            .send()
            .await?;

        Ok(output.datapoints().iter().map(Datapoint::from).collect())
    }
}

fn to_aws_datetime(timestamp: DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_secs_and_nanos(timestamp.timestamp(), timestamp.timestamp_subsec_nanos())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn converts_sdk_datapoint() {
        let timestamp = Utc.with_ymd_and_hms(2016, 4, 1, 12, 0, 0).unwrap();
        let point = aws_sdk_cloudwatch::types::Datapoint::builder()
            .timestamp(to_aws_datetime(timestamp))
            .unit(StandardUnit::Seconds)
            .average(4.2)
            .maximum(9.9)
            .build();

        assert_eq!(
            Datapoint::from(&point),
            Datapoint {
                timestamp: Some(timestamp),
                unit: Some("Seconds".into()),
                average: Some(4.2),
                maximum: Some(9.9),
                ..Default::default()
            }
        );
    }

    #[test]
    fn sdk_datapoint_without_unit() {
        let point = aws_sdk_cloudwatch::types::Datapoint::builder()
            .sum(3.0)
            .build();

        let converted = Datapoint::from(&point);

        assert_eq!(converted.unit, None);
        assert_eq!(converted.timestamp, None);
        assert_eq!(converted.sum, Some(3.0));
    }

    #[tokio::test]
    async fn client_is_built_once() {
        let client = CloudwatchStatisticsClient::new(
            AwsAuthentication::test_auth(),
            RegionOrEndpoint::with_both("us-east-1", "http://localhost:4566"),
        );

        client.initialize().await.unwrap();
        let first = client.client().await.unwrap();
        client.initialize().await.unwrap();
        let second = client.client().await.unwrap();

        assert!(std::ptr::eq(first, second));
    }
}
