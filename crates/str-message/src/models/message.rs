use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::warn;

use super::content::{content_parts_from_str, join_parts, ContentPart, DataUrl};
use crate::errors::{MessageError, MessageResult};
use crate::objectid::create_message_id;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Developer,
    Tool,
}

/// Sub-classification of assistant and tool turns
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    /// Reasoning or thinking text
    Analysis,
    /// Tool calls and tool outputs
    Commentary,
    /// User-visible assistant output
    Final,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// Untyped message, any role; not accepted by the wire projections
    #[default]
    Generic,
    System,
    Developer,
    User,
    Assistant,
    Reasoning,
    ToolCall,
    ToolCallOutput,
}

impl MessageKind {
    /// The role and channel every message of this kind carries
    pub fn fixed_role_and_channel(&self) -> Option<(Role, Option<Channel>)> {
        match self {
            MessageKind::Generic => None,
            MessageKind::System => Some((Role::System, None)),
            MessageKind::Developer => Some((Role::Developer, None)),
            MessageKind::User => Some((Role::User, None)),
            MessageKind::Assistant => Some((Role::Assistant, Some(Channel::Final))),
            MessageKind::Reasoning => Some((Role::Assistant, Some(Channel::Analysis))),
            MessageKind::ToolCall => Some((Role::Assistant, Some(Channel::Commentary))),
            MessageKind::ToolCallOutput => Some((Role::Tool, Some(Channel::Commentary))),
        }
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, MessageKind::ToolCall | MessageKind::ToolCallOutput)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A universal message format for AI interactions
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub kind: MessageKind,
    pub role: Role,
    /// Plain text, or content blocks that may include data URLs
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_arguments: Option<String>,
    pub created_at: i64,
    /// Provenance hints, never authoritative for behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Message {
    fn typed<S: Into<String>>(kind: MessageKind, content: S) -> Self {
        let (role, channel) = kind
            .fixed_role_and_channel()
            .unwrap_or((Role::User, None));
        Message {
            id: create_message_id(),
            kind,
            role,
            content: content.into(),
            channel,
            tool_call_id: None,
            tool_name: None,
            tool_call_arguments: None,
            created_at: Utc::now().timestamp(),
            metadata: None,
        }
    }

    /// Create an untyped message with any role
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        let mut message = Self::typed(MessageKind::Generic, content);
        message.role = role;
        message.warn_if_empty();
        message
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        let message = Self::typed(MessageKind::System, content);
        message.warn_if_empty();
        message
    }

    pub fn developer<S: Into<String>>(content: S) -> Self {
        let message = Self::typed(MessageKind::Developer, content);
        message.warn_if_empty();
        message
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        let message = Self::typed(MessageKind::User, content);
        message.warn_if_empty();
        message
    }

    /// User-visible assistant output on the `final` channel
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        let message = Self::typed(MessageKind::Assistant, content);
        message.warn_if_empty();
        message
    }

    pub fn reasoning<S: Into<String>>(content: S) -> Self {
        let message = Self::typed(MessageKind::Reasoning, content);
        message.warn_if_empty();
        message
    }

    /// An assistant tool call; id, name and arguments must all be non-empty
    pub fn tool_call<I, N, A>(tool_call_id: I, tool_name: N, arguments: A) -> MessageResult<Self>
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        let mut message = Self::typed(MessageKind::ToolCall, "");
        message.tool_call_id = Some(tool_call_id.into());
        message.tool_name = Some(tool_name.into());
        message.tool_call_arguments = Some(arguments.into());
        message.validate()?;
        Ok(message)
    }

    /// The output of a tool call, keyed by the call it answers
    pub fn tool_call_output<I, N, A, S>(
        tool_call_id: I,
        tool_name: N,
        arguments: A,
        output: S,
    ) -> MessageResult<Self>
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
        S: Into<String>,
    {
        let mut message = Self::typed(MessageKind::ToolCallOutput, output);
        message.tool_call_id = Some(tool_call_id.into());
        message.tool_name = Some(tool_name.into());
        message.tool_call_arguments = Some(arguments.into());
        message.validate()?;
        message.warn_if_empty();
        Ok(message)
    }

    /// Keep an id supplied by a source payload
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Append a content part as a new block of the content
    pub fn with_part(mut self, part: ContentPart) -> Self {
        let mut parts = self.content_parts();
        parts.push(part);
        self.content = join_parts(&parts);
        self
    }

    /// Append an image given its raw bytes and MIME type
    pub fn with_image<T: AsRef<[u8]>>(self, bytes: T, mime_type: &str) -> Self {
        let data_url = DataUrl::from_bytes(bytes, mime_type);
        self.with_part(ContentPart::image_url(data_url.to_string()))
    }

    /// Append audio given its raw bytes and MIME type
    pub fn with_audio<T: AsRef<[u8]>>(self, bytes: T, mime_type: &str) -> Self {
        let data_url = DataUrl::from_bytes(bytes, mime_type);
        self.with_part(ContentPart::audio(&data_url))
    }

    pub fn with_image_url<S: Into<String>>(self, url: S) -> Self {
        self.with_part(ContentPart::image_url(url))
    }

    pub fn with_image_id<S: Into<String>>(self, id: S) -> Self {
        self.with_part(ContentPart::image_id(id))
    }

    /// Check the role, channel and tool field rules of this message's kind
    pub fn validate(&self) -> MessageResult<()> {
        let Some((role, channel)) = self.kind.fixed_role_and_channel() else {
            return Ok(());
        };

        if self.role != role || self.channel != channel {
            return Err(MessageError::InvariantViolation(format!(
                "{} message requires role {} and channel {}, got role {} and channel {}",
                self.kind,
                role,
                channel.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
                self.role,
                self.channel
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            )));
        }

        let tool_fields = [
            &self.tool_call_id,
            &self.tool_name,
            &self.tool_call_arguments,
        ];
        if self.kind.is_tool() {
            if tool_fields
                .iter()
                .any(|field| field.as_deref().map_or(true, str::is_empty))
            {
                return Err(MessageError::InvariantViolation(
                    "Tool call id, name, and arguments are required".to_string(),
                ));
            }
        } else if tool_fields.iter().any(|field| field.is_some()) {
            return Err(MessageError::InvariantViolation(format!(
                "{} message must not carry tool call fields",
                self.kind
            )));
        }

        Ok(())
    }

    fn warn_if_empty(&self) {
        if !self.content.is_empty() || self.kind == MessageKind::ToolCall {
            return;
        }
        if self.kind == MessageKind::ToolCallOutput {
            warn!(id = %self.id, "Tool call output content is empty");
        } else if !(self.role == Role::Assistant && self.channel == Some(Channel::Commentary)) {
            warn!(id = %self.id, kind = %self.kind, "Message content is empty");
        }
    }

    pub fn content_parts(&self) -> Vec<ContentPart> {
        content_parts_from_str(&self.content)
    }

    /// Content as it appears in transcripts; tool calls use their canonical rendering
    pub fn effective_content(&self) -> String {
        match (self.kind, &self.tool_call_id, &self.tool_name) {
            (MessageKind::ToolCall, Some(id), Some(name)) => render_tool_call(
                name,
                id,
                self.tool_call_arguments.as_deref().unwrap_or_default(),
            ),
            _ => self.content.clone(),
        }
    }

    /// True when the content and every tool field are empty
    pub fn has_empty_payload(&self) -> bool {
        self.content.is_empty()
            && [
                &self.tool_call_id,
                &self.tool_name,
                &self.tool_call_arguments,
            ]
            .iter()
            .all(|field| field.as_deref().map_or(true, str::is_empty))
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key).map(String::as_str)
    }
}

/// Human-readable form of a tool call: `[tool_call:<name>](#<id>):<arguments>`
pub fn render_tool_call(name: &str, id: &str, arguments: &str) -> String {
    format!("[tool_call:{}](#{}):{}", name, id, arguments)
}
