use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MessageError, MessageResult};
use crate::models::message::{Message, MessageKind, Role};
use crate::prompt_template::INSTRUCTION_LINE;

pub const DEFAULT_MAX_STRING: usize = 600;

/// How [`to_instructions`] renders a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionOptions {
    /// Prefix each line with the message's creation time
    pub with_datetime: bool,
    pub utc_offset: FixedOffset,
    /// Content longer than this many characters is cut, with the remainder counted
    pub max_string: usize,
}

impl Default for InstructionOptions {
    fn default() -> Self {
        Self {
            with_datetime: false,
            utc_offset: Utc.fix(),
            max_string: DEFAULT_MAX_STRING,
        }
    }
}

impl InstructionOptions {
    pub fn with_datetime(mut self, utc_offset: FixedOffset) -> Self {
        self.with_datetime = true;
        self.utc_offset = utc_offset;
        self
    }

    pub fn with_max_string(mut self, max_string: usize) -> Self {
        self.max_string = max_string;
        self
    }
}

/// Quote `text` and cut it to `max_string` characters, e.g. `"hello"+6`
pub fn truncate_repr(text: &str, max_string: usize) -> String {
    let length = text.chars().count();
    if length <= max_string {
        return format!("{:?}", text);
    }
    let head: String = text.chars().take(max_string).collect();
    format!("{:?}+{}", head, length - max_string)
}

#[derive(Serialize)]
struct InstructionLine<'a> {
    dt: Option<String>,
    role: &'a str,
    content: String,
}

/// One display line: `[<YYYY-MM-DDTHH:MM:SS >role] "content"`
pub fn to_instructions(message: &Message, options: &InstructionOptions) -> MessageResult<String> {
    let dt = if options.with_datetime {
        let created = DateTime::from_timestamp(message.created_at, 0).ok_or_else(|| {
            MessageError::InvariantViolation(format!(
                "created_at {} is out of range",
                message.created_at
            ))
        })?;
        Some(
            created
                .with_timezone(&options.utc_offset)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        )
    } else {
        None
    };

    let line = InstructionLine {
        dt,
        role: message.role.as_ref(),
        content: truncate_repr(&message.effective_content(), options.max_string),
    };
    Ok(INSTRUCTION_LINE.render(&line)?.trim().to_string())
}

pub fn messages_to_instructions(
    messages: &[Message],
    options: &InstructionOptions,
) -> MessageResult<String> {
    let lines = messages
        .iter()
        .map(|message| to_instructions(message, options))
        .collect::<MessageResult<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareGptRole {
    Human,
    Gpt,
    Tool,
    System,
}

impl From<Role> for ShareGptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ShareGptRole::Human,
            Role::Assistant => ShareGptRole::Gpt,
            Role::Tool => ShareGptRole::Tool,
            Role::System | Role::Developer => ShareGptRole::System,
        }
    }
}

/// One turn of a ShareGPT-style dataset record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGptTurn {
    pub from: ShareGptRole,
    pub value: String,
}

pub fn messages_to_sharegpt(messages: &[Message]) -> Vec<ShareGptTurn> {
    messages
        .iter()
        .map(|message| {
            let value = match message.kind {
                MessageKind::Reasoning => format!("<think>\n{}\n</think>", message.content),
                _ => message.effective_content(),
            };
            ShareGptTurn {
                from: message.role.into(),
                value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use indoc::indoc;

    #[test]
    fn test_truncate_repr() {
        assert_eq!(truncate_repr("hello", 10), "\"hello\"");
        assert_eq!(truncate_repr("hello world", 5), "\"hello\"+6");
        assert_eq!(truncate_repr("line\nbreak", 600), "\"line\\nbreak\"");
    }

    #[test]
    fn test_to_instructions() -> Result<()> {
        let message = Message::user("why grass is green?").with_created_at(1_700_000_000);
        assert_eq!(
            to_instructions(&message, &InstructionOptions::default())?,
            "[user] \"why grass is green?\""
        );

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let options = InstructionOptions::default()
            .with_datetime(tokyo)
            .with_max_string(3);
        assert_eq!(
            to_instructions(&message, &options)?,
            "[2023-11-15T07:13:20 user] \"why\"+16"
        );
        Ok(())
    }

    #[test]
    fn test_messages_to_instructions() -> Result<()> {
        let messages = vec![
            Message::system("Be terse."),
            Message::tool_call("call_1", "get_time", "{}")?,
            Message::tool_call_output("call_1", "get_time", "{}", "12:00")?,
        ];
        let transcript = messages_to_instructions(&messages, &InstructionOptions::default())?;
        assert_eq!(
            transcript,
            indoc! {r#"
                [system] "Be terse."
                [assistant] "[tool_call:get_time](#call_1):{}"
                [tool] "12:00""#}
        );
        Ok(())
    }

    #[test]
    fn test_messages_to_sharegpt() -> Result<()> {
        let messages = vec![
            Message::system("Be terse."),
            Message::user("hi"),
            Message::reasoning("greeting"),
            Message::assistant("hello"),
            Message::tool_call("c", "f", "{}")?,
            Message::tool_call_output("c", "f", "{}", "ok")?,
        ];
        let turns = messages_to_sharegpt(&messages);
        let value = serde_json::to_value(&turns)?;
        assert_eq!(
            value,
            serde_json::json!([
                {"from": "system", "value": "Be terse."},
                {"from": "human", "value": "hi"},
                {"from": "gpt", "value": "<think>\ngreeting\n</think>"},
                {"from": "gpt", "value": "hello"},
                {"from": "gpt", "value": "[tool_call:f](#c):{}"},
                {"from": "tool", "value": "ok"}
            ])
        );
        Ok(())
    }
}
