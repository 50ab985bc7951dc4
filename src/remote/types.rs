//! Wire types for the open API.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

use crate::remote::client::RemoteError;

/// Comment attached to the item pushed at bootstrap.
pub const NGINX_CONF_COMMENT: &str = "nginx.conf";

/// Suffix of generated release titles.
pub const RELEASE_TITLE_SUFFIX: &str = "-release";

/// A single configuration item. The managed file's content lives in `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigItem {
    #[serde(deserialize_with = "null_as_empty")]
    pub key: String,

    /// A `null` value decodes as empty and is stopped by the empty-value guard.
    #[serde(deserialize_with = "null_as_empty")]
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_change_last_modified_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_change_created_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_change_created_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_change_last_modified_time: Option<String>,
}

impl ConfigItem {
    /// Item pushed at bootstrap: the local file authored by `author`.
    pub fn nginx_conf(key: &str, value: String, author: &str) -> Self {
        Self {
            key: key.to_string(),
            value,
            comment: Some(NGINX_CONF_COMMENT.to_string()),
            data_change_last_modified_by: Some(author.to_string()),
            data_change_created_by: Some(author.to_string()),
            data_change_created_time: None,
            data_change_last_modified_time: None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parse a fetch response body.
pub fn decode_item(body: &str) -> Result<ConfigItem, RemoteError> {
    serde_json::from_str(body).map_err(|source| RemoteError::Decode {
        body: body.to_string(),
        source,
    })
}

/// Publish request for the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub release_title: String,
    pub released_by: String,
}

impl Release {
    /// Release titled after the current local time.
    pub fn now(author: &str) -> Self {
        Self::at(&Local::now(), author)
    }

    /// Release titled `YYYYMMDDhhmmss-release` for the given instant.
    pub fn at<Tz: TimeZone>(time: &DateTime<Tz>, author: &str) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            release_title: format!("{}{}", time.format("%Y%m%d%H%M%S"), RELEASE_TITLE_SUFFIX),
            released_by: author.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_item_wire_format() {
        let item = ConfigItem::nginx_conf("edge", "events {}".into(), "ops");
        let json: serde_json::Value = serde_json::to_value(&item).unwrap();

        assert_eq!(json["key"], "edge");
        assert_eq!(json["value"], "events {}");
        assert_eq!(json["comment"], "nginx.conf");
        assert_eq!(json["dataChangeCreatedBy"], "ops");
        assert_eq!(json["dataChangeLastModifiedBy"], "ops");
        assert!(json.get("dataChangeCreatedTime").is_none());
    }

    #[test]
    fn test_decode_authority_response() {
        let body = r#"{
            "key": "edge",
            "value": "server { listen 80; }",
            "comment": "nginx.conf",
            "dataChangeCreatedBy": "apollo",
            "dataChangeLastModifiedBy": "apollo",
            "dataChangeCreatedTime": "2024-03-01T10:00:00.000+0800",
            "dataChangeLastModifiedTime": "2024-03-02T10:00:00.000+0800"
        }"#;
        let item = decode_item(body).unwrap();
        assert_eq!(item.value, "server { listen 80; }");
        assert_eq!(
            item.data_change_last_modified_time.as_deref(),
            Some("2024-03-02T10:00:00.000+0800")
        );
    }

    #[test]
    fn test_decode_tolerates_null_fields() {
        let body = r#"{
            "key": "edge",
            "value": "server { listen 81; }",
            "comment": null,
            "dataChangeCreatedBy": null,
            "dataChangeLastModifiedBy": null,
            "dataChangeCreatedTime": null,
            "dataChangeLastModifiedTime": null
        }"#;
        let item = decode_item(body).unwrap();
        assert_eq!(item.key, "edge");
        assert_eq!(item.value, "server { listen 81; }");
        assert!(item.comment.is_none());
        assert!(item.data_change_last_modified_by.is_none());
    }

    #[test]
    fn test_decode_null_value_as_empty() {
        let item = decode_item(r#"{"key":null,"value":null}"#).unwrap();
        assert!(item.key.is_empty());
        assert!(item.value.is_empty());
    }

    #[test]
    fn test_decode_keeps_raw_body_on_error() {
        let err = decode_item("<html>gateway error</html>").unwrap_err();
        match err {
            RemoteError::Decode { body, .. } => assert_eq!(body, "<html>gateway error</html>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_release_title() {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let release = Release::at(&time, "ops");
        assert_eq!(release.release_title, "20240102030405-release");

        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["releaseTitle"], "20240102030405-release");
        assert_eq!(json["releasedBy"], "ops");
    }
}
