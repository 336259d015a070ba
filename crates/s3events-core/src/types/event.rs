//! Event types and the S3 event message format
//!
//! The envelope mirrors what S3 itself publishes, so consumers written
//! against native notifications accept replayed events unchanged.

use super::StorageObjectRef;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Event Types
// ============================================================================

/// Event types that can be replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "ObjectCreated:*")]
    ObjectCreated,
    #[serde(rename = "ObjectRemoved:*")]
    ObjectRemoved,
    #[serde(rename = "ReducedRedundancyLostObject")]
    ReducedRedundancyLostObject,
}

impl EventType {
    pub const ALL: [EventType; 3] = [
        EventType::ObjectCreated,
        EventType::ObjectRemoved,
        EventType::ReducedRedundancyLostObject,
    ];

    /// Name as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ObjectCreated => "ObjectCreated:*",
            EventType::ObjectRemoved => "ObjectRemoved:*",
            EventType::ReducedRedundancyLostObject => "ReducedRedundancyLostObject",
        }
    }

    /// Namespaced name carried in the envelope's `eventName`
    pub fn event_name(&self) -> &'static str {
        match self {
            EventType::ObjectCreated => "s3:ObjectCreated:*",
            EventType::ObjectRemoved => "s3:ObjectRemoved:*",
            EventType::ReducedRedundancyLostObject => "s3:ReducedRedundancyLostObject",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.strip_prefix("s3:").unwrap_or(s);
        EventType::ALL
            .into_iter()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| Error::UnknownEventType(s.to_string()))
    }
}

// ============================================================================
// Event Record (S3 Event Message Format)
// ============================================================================

pub const EVENT_VERSION: &str = "2.0";
pub const EVENT_SOURCE: &str = "aws:s3";
pub const S3_SCHEMA_VERSION: &str = "1.0";

/// S3 Event record (AWS-compatible format)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    pub event_version: String,
    pub event_name: String,
    #[serde(serialize_with = "serialize_event_time")]
    pub event_time: DateTime<Utc>,
    pub event_source: String,
    pub s3: S3Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Info {
    pub s3_schema_version: String,
    pub bucket: S3BucketInfo,
    pub object: S3ObjectInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3BucketInfo {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3ObjectInfo {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// ISO-8601 with millisecond precision and a `Z` suffix, as S3 emits it
fn serialize_event_time<S: Serializer>(
    time: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl S3EventRecord {
    /// Build the envelope for one object.
    ///
    /// `event_name` is used verbatim; callers supply the `s3:` namespace.
    pub fn build(
        bucket: &str,
        event_name: &str,
        object: &StorageObjectRef,
        event_time: DateTime<Utc>,
    ) -> Self {
        Self {
            event_version: EVENT_VERSION.to_string(),
            event_name: event_name.to_string(),
            event_time,
            event_source: EVENT_SOURCE.to_string(),
            s3: S3Info {
                s3_schema_version: S3_SCHEMA_VERSION.to_string(),
                bucket: S3BucketInfo {
                    name: bucket.to_string(),
                    arn: format!("arn:aws:s3:::{}", bucket),
                },
                object: S3ObjectInfo {
                    key: object.key.clone(),
                    size: object.size,
                    etag: object.etag.clone(),
                },
            },
        }
    }
}

/// S3 Event message: the `{"Records": [...]}` wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3EventMessage {
    pub records: Vec<S3EventRecord>,
}

impl S3EventMessage {
    pub fn single(record: S3EventRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    /// Serialize to the message body sent to destinations
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            "ObjectCreated:*".parse::<EventType>().unwrap(),
            EventType::ObjectCreated
        );
        assert_eq!(
            "s3:ObjectRemoved:*".parse::<EventType>().unwrap(),
            EventType::ObjectRemoved
        );
        assert_eq!(
            "ReducedRedundancyLostObject".parse::<EventType>().unwrap(),
            EventType::ReducedRedundancyLostObject
        );
        assert!(matches!(
            "ObjectCreated:Put".parse::<EventType>(),
            Err(Error::UnknownEventType(_))
        ));
    }

    #[test]
    fn test_event_name_namespacing() {
        assert_eq!(EventType::ObjectCreated.event_name(), "s3:ObjectCreated:*");
        assert_eq!(
            EventType::ReducedRedundancyLostObject.event_name(),
            "s3:ReducedRedundancyLostObject"
        );
    }

    #[test]
    fn test_event_record_creation() {
        let object = StorageObjectRef::new("path/to/object.txt")
            .with_size(1024)
            .with_etag("\"etag-123\"");
        let record = S3EventRecord::build("my-bucket", "s3:ObjectCreated:*", &object, fixed_time());

        assert_eq!(record.event_name, "s3:ObjectCreated:*");
        assert_eq!(record.event_source, "aws:s3");
        assert_eq!(record.s3.bucket.arn, "arn:aws:s3:::my-bucket");
        assert_eq!(record.s3.object.key, "path/to/object.txt");
        assert_eq!(record.s3.object.size, Some(1024));
    }

    #[test]
    fn test_wire_format() {
        let object = StorageObjectRef::new("test-file.json")
            .with_size(16)
            .with_etag("\"abc\"");
        let record =
            S3EventRecord::build("s3events-test", "s3:ObjectCreated:*", &object, fixed_time());
        let body = S3EventMessage::single(record).to_json().unwrap();

        assert_eq!(
            body,
            concat!(
                r#"{"Records":[{"eventVersion":"2.0","eventName":"s3:ObjectCreated:*","#,
                r#""eventTime":"2024-03-01T12:30:45.000Z","eventSource":"aws:s3","#,
                r#""s3":{"s3SchemaVersion":"1.0","bucket":{"name":"s3events-test","#,
                r#""arn":"arn:aws:s3:::s3events-test"},"#,
                r#""object":{"key":"test-file.json","size":16,"etag":"\"abc\""}}}]}"#
            )
        );
    }

    #[test]
    fn test_missing_size_and_etag_are_omitted() {
        let record = S3EventRecord::build(
            "b",
            "s3:ObjectRemoved:*",
            &StorageObjectRef::new("k"),
            fixed_time(),
        );
        let value: Value =
            serde_json::from_str(&S3EventMessage::single(record).to_json().unwrap()).unwrap();
        let object = &value["Records"][0]["s3"]["object"];

        assert_eq!(object["key"], "k");
        assert!(object.get("size").is_none());
        assert!(object.get("etag").is_none());
    }

    #[test]
    fn test_message_parses_back() {
        for key in ["a", "dir/with spaces/file.json", "ünïcode/ключ"] {
            let object = StorageObjectRef::new(key);
            let record = S3EventRecord::build("bucket", "s3:ObjectCreated:*", &object, fixed_time());
            let body = S3EventMessage::single(record.clone()).to_json().unwrap();

            let parsed = S3EventMessage::from_json(&body).unwrap();
            assert_eq!(parsed.records.len(), 1);
            assert_eq!(parsed.records[0].s3.object.key, key);
            assert_eq!(parsed.records[0], record);
        }
    }
}
