//! Message models and the wire-to-UI formatter.
//!
//! `WireMessage` mirrors exactly what the server returns for
//! `GET /api/chat/conversation/{id}`. `ChatMessage` is the shape handed to
//! the presentation layer. [`format_message`] translates between the two; it
//! is pure and total over any well-formed wire message.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message row as stored and returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    pub is_from_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// How a message's content should be rendered.
///
/// Unknown wire values are carried through verbatim in `Other` so the
/// rendering layer can apply its own default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Text,
    /// A tabular result; `file_path` points at the exported CSV
    Table,
    /// A rendered plot; `file_path` points at the image file
    Image,
    Error,
    Other(String),
}

impl From<String> for ContentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "table" | "dataframe" | "dataframe_csv_path" => Self::Table,
            "image" | "plot" | "plot_file_path" => Self::Image,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Text => "text".to_string(),
            ContentKind::Table => "table".to_string(),
            ContentKind::Image => "image".to_string(),
            ContentKind::Error => "error".to_string(),
            ContentKind::Other(value) => value,
        }
    }
}

/// The UI representation of a message.
///
/// `conversation_id` is `None` for locally synthesized messages that are not
/// yet tied to a persisted conversation (the optimistic echo sent from a
/// draft selection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub file_path: Option<String>,
    /// Locale-rendered time of day, ready for display
    pub timestamp: String,
    pub is_user: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatMessage {
    /// The optimistic local echo of a user message, appended before any
    /// network round-trip.
    pub fn user_echo(content: impl Into<String>) -> Self {
        Self {
            id: local_id(),
            conversation_id: None,
            content: content.into(),
            kind: Some(ContentKind::Text),
            file_path: None,
            timestamp: render_local_time(Local::now()),
            is_user: true,
            error: None,
        }
    }

    /// A locally synthesized error slot on the AI side of the transcript.
    pub fn inline_error(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: local_id(),
            conversation_id: None,
            content: text.clone(),
            kind: Some(ContentKind::Error),
            file_path: None,
            timestamp: render_local_time(Local::now()),
            is_user: false,
            error: Some(text),
        }
    }

    /// Whether this message carries an inline error.
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.kind == Some(ContentKind::Error)
    }
}

/// Translates a server message into its UI representation.
pub fn format_message(message: &WireMessage) -> ChatMessage {
    ChatMessage {
        id: message.id.to_string(),
        conversation_id: Some(message.conversation_id),
        content: message.content.clone(),
        kind: message
            .content_type
            .as_ref()
            .map(|value| ContentKind::from(value.clone())),
        file_path: message.file_path.clone(),
        timestamp: render_local_time(message.timestamp.with_timezone(&Local)),
        is_user: message.is_from_user,
        error: None,
    }
}

fn local_id() -> String {
    format!("local-{}", Uuid::new_v4())
}

fn render_local_time(timestamp: DateTime<Local>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(content_type: Option<&str>) -> WireMessage {
        WireMessage {
            id: 11,
            conversation_id: 42,
            content: "Revenue grew 12% year over year".to_string(),
            content_type: content_type.map(str::to_string),
            file_path: None,
            is_from_user: false,
            timestamp: "2025-04-01T09:30:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_format_passes_fields_through() {
        let mut message = wire(Some("plot"));
        message.file_path = Some("output/20250401/plot.png".to_string());

        let formatted = format_message(&message);
        assert_eq!(formatted.id, "11");
        assert_eq!(formatted.conversation_id, Some(42));
        assert_eq!(formatted.kind, Some(ContentKind::Image));
        assert_eq!(
            formatted.file_path.as_deref(),
            Some("output/20250401/plot.png")
        );
        assert!(!formatted.is_user);
        assert!(formatted.error.is_none());
    }

    #[test]
    fn test_format_without_content_type() {
        let formatted = format_message(&wire(None));
        assert_eq!(formatted.kind, None);
    }

    #[test]
    fn test_unknown_content_type_passes_through() {
        let formatted = format_message(&wire(Some("sankey-diagram")));
        assert_eq!(
            formatted.kind,
            Some(ContentKind::Other("sankey-diagram".to_string()))
        );
        // And survives a serialize round through the presentation boundary
        let json = serde_json::to_string(&formatted).unwrap();
        assert!(json.contains("sankey-diagram"));
    }

    #[test]
    fn test_user_echo_is_speculative() {
        let echo = ChatMessage::user_echo("show me Q3 margins");
        assert!(echo.is_user);
        assert!(echo.conversation_id.is_none());
        assert!(echo.id.starts_with("local-"));
        assert!(!echo.is_error());
    }

    #[test]
    fn test_inline_error_message() {
        let slot = ChatMessage::inline_error("query job ended with status failed");
        assert!(!slot.is_user);
        assert!(slot.is_error());
        assert_eq!(slot.error.as_deref(), Some(slot.content.as_str()));
    }

    #[test]
    fn test_wire_deserialization() {
        let json = r#"{
            "id": 3,
            "conversation_id": 42,
            "user_id": null,
            "content": "revenue 2023",
            "content_type": "text",
            "file_path": null,
            "is_from_user": true,
            "timestamp": "2025-04-01T09:30:00Z"
        }"#;
        let message: WireMessage = serde_json::from_str(json).unwrap();
        assert!(message.is_from_user);
        assert_eq!(message.content_type.as_deref(), Some("text"));
    }
}
