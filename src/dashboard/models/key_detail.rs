use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::utils::iso_timestamp;
use crate::store::{KeyType, KeyValue};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct KeyDetail {
    #[serde(rename = "key")]
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    #[serde(rename = "ttl")]
    pub ttl_seconds: i64,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub value: KeyValue,
    pub metadata: DetailMetadata,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DetailMetadata {
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
}
