use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RecordTags = BTreeMap<String, String>;

pub type RecordFields = BTreeMap<String, f64>;

/// A single generic telemetry record: one measurement with its tags, numeric fields and the
/// instant the values were observed at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    measurement: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: RecordTags,
    fields: RecordFields,
    timestamp: DateTime<Utc>,
}

impl Record {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: RecordTags::new(),
            fields: RecordFields::new(),
            timestamp,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: RecordTags) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: RecordFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &RecordTags {
        &self.tags
    }

    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn insert_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: f64) {
        self.fields.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn serializes_without_empty_tags() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut record = Record::new("cloudwatch", timestamp);
        record.insert_field("Sum", 3.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "measurement": "cloudwatch",
                "fields": { "Sum": 3.0 },
                "timestamp": "2024-05-01T12:00:00Z",
            })
        );
    }
}
