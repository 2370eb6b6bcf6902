use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{DimensionConfig, MetricConfig, Statistic};

/// A fully resolved `GetMetricStatistics` request for one metric over one window.
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticsQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<DimensionConfig>,
    pub statistics: Vec<Statistic>,
    pub unit: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_seconds: i32,
}

/// Builds the query covering `[now - period, now]`.
///
/// `period` is expected to come out of `parse_period`, which keeps it within `i32` seconds.
pub fn build_query(metric: &MetricConfig, period: Duration, now: DateTime<Utc>) -> StatisticsQuery {
    let period_seconds = i32::try_from(period.as_secs()).unwrap_or(i32::MAX);

    StatisticsQuery {
        namespace: metric.namespace.clone(),
        metric_name: metric.name.clone(),
        dimensions: metric.dimensions.clone(),
        statistics: metric.statistics.clone(),
        unit: metric.unit.clone().filter(|unit| !unit.is_empty()),
        start: now - TimeDelta::seconds(i64::from(period_seconds)),
        end: now,
        period_seconds,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    use super::*;

    fn metric() -> MetricConfig {
        MetricConfig {
            namespace: "AWS/ELB".into(),
            name: "Latency".into(),
            statistics: vec![Statistic::Maximum, Statistic::Average, Statistic::Sum],
            dimensions: vec![
                DimensionConfig::new("LoadBalancerName", "p-example"),
                DimensionConfig::new("AvailabilityZone", "us-east-1a"),
            ],
            unit: Some("Seconds".into()),
            tag: Some("p-example-latency".into()),
        }
    }

    #[test]
    fn window_ends_now_and_spans_one_period() {
        let now = Utc.with_ymd_and_hms(2016, 4, 1, 12, 30, 0).unwrap();

        let query = build_query(&metric(), Duration::from_secs(300), now);

        assert_eq!(query.end, now);
        assert_eq!(query.start, Utc.with_ymd_and_hms(2016, 4, 1, 12, 25, 0).unwrap());
        assert_eq!(query.period_seconds, 300);
    }

    #[test]
    fn carries_descriptor_in_order() {
        let now = Utc::now();

        let query = build_query(&metric(), Duration::from_secs(60), now);

        assert_eq!(
            query,
            StatisticsQuery {
                namespace: "AWS/ELB".into(),
                metric_name: "Latency".into(),
                dimensions: vec![
                    DimensionConfig::new("LoadBalancerName", "p-example"),
                    DimensionConfig::new("AvailabilityZone", "us-east-1a"),
                ],
                statistics: vec![Statistic::Maximum, Statistic::Average, Statistic::Sum],
                unit: Some("Seconds".into()),
                start: now - TimeDelta::seconds(60),
                end: now,
                period_seconds: 60,
            }
        );
    }

    #[test]
    fn empty_unit_is_omitted() {
        let mut metric = metric();
        metric.unit = Some(String::new());

        let query = build_query(&metric, Duration::from_secs(60), Utc::now());

        assert_eq!(query.unit, None);
    }
}
