//! User-facing reply payload returned to the messaging platform

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
    pub title: String,
}

/// Numeric route data for downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Machine-readable failure tags, sent alongside the error text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMetadata {
    Route(RouteMetadata),
    Error(ErrorMetadata),
}

/// The `{text, attachments, metadata}` triple plus quick-reply suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReplyMetadata>,
}

impl AgentReply {
    /// Plain text reply without attachments or metadata
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
            quick_replies: Vec::new(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_quick_replies(mut self, replies: &[&str]) -> Self {
        self.quick_replies = replies.iter().map(|r| (*r).to_string()).collect();
        self
    }
}
