//! Conversation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A persisted conversation as reported by the server.
///
/// Server-owned: the client only reflects it. The server assigns the id,
/// titles new conversations from the first query text, and bumps
/// `updated_at` as messages arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    /// Human-readable title (may be absent or null on the wire for brand-new rows)
    #[serde(default, deserialize_with = "null_to_empty")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
