use hashlink::LinkedHashMap;
use serde::{Serialize, Serializer};

/// TTL reported for a key that exists but never expires.
pub const TTL_PERSISTENT: i64 = -1;
/// TTL reported for a key that does not exist (deleted or already expired).
pub const TTL_ABSENT: i64 = -2;

// ========================================
// KEY TYPE
// ========================================

/// Value type of a key, as reported by the store's `TYPE` command.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    String,
    List,
    Set,
    SortedSet,
    Hash,
    JsonDoc,
    /// Any tag we do not decode (`stream`, module types, `none` for vanished keys).
    Other(String),
}

impl KeyType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::SortedSet,
            "hash" => KeyType::Hash,
            "ReJSON-RL" => KeyType::JsonDoc,
            other => KeyType::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::SortedSet => "zset",
            KeyType::Hash => "hash",
            KeyType::JsonDoc => "ReJSON-RL",
            KeyType::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for KeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

// ========================================
// METADATA TRIPLE
// ========================================

/// Per-key answer of a batched metadata query.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyMetadata {
    pub ttl_seconds: i64,
    /// `None` when the store could not size the key (it vanished).
    pub size_bytes: Option<u64>,
    pub key_type: KeyType,
}

impl KeyMetadata {
    pub fn is_absent(&self) -> bool {
        self.ttl_seconds == TTL_ABSENT
    }
}

// ========================================
// DECODED VALUE
// ========================================

/// A key's value, shaped by its type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    String(String),
    List(Vec<String>),
    Set(Vec<String>),
    /// `(member, score)` pairs in store order.
    SortedSet(Vec<(String, f64)>),
    Hash(LinkedHashMap<String, String>),
    /// Raw JSON document text, passed through undecoded.
    Json(String),
    /// Human readable placeholder when the value can't be shown.
    Diagnostic(String),
}

impl KeyValue {
    pub fn unsupported(tag: &str) -> Self {
        KeyValue::Diagnostic(format!("Unsupported type: {}", tag))
    }
}
