use crate::errors::{MessageError, MessageResult};
use crate::models::content::{ContentPart, ContentPartType, BLOCK_SEPARATOR};
use crate::models::message::{Message, MessageKind};
use crate::wire::chat::{
    ChatCompletionMessageParam, ChatCompletionMessageToolCall, ChatContentPart,
    ChatMessageContent, FileData, ImageUrl, InputAudio,
};

const TARGET: &str = "chat completion";

fn content_part_to_chat(part: &ContentPart) -> MessageResult<ChatContentPart> {
    match part.kind {
        ContentPartType::Text => Ok(ChatContentPart::Text {
            text: part.value.clone(),
        }),
        ContentPartType::ImageUrl => Ok(ChatContentPart::ImageUrl {
            image_url: ImageUrl {
                url: part.value.clone(),
                detail: None,
            },
        }),
        ContentPartType::ImageId => Ok(ChatContentPart::File {
            file: FileData {
                file_id: Some(part.value.clone()),
                ..Default::default()
            },
        }),
        ContentPartType::Audio => {
            let (data, format) =
                part.audio_payload()
                    .ok_or_else(|| MessageError::UnsupportedContentPart {
                        target: TARGET,
                        part: "audio without an audio data URL".to_string(),
                    })?;
            Ok(ChatContentPart::InputAudio {
                input_audio: InputAudio { data, format },
            })
        }
        ContentPartType::DataUrl => Ok(ChatContentPart::File {
            file: FileData {
                file_data: Some(part.value.clone()),
                ..Default::default()
            },
        }),
    }
}

/// User content as a plain string when it is text only, else as typed parts
fn user_content(message: &Message) -> MessageResult<ChatMessageContent> {
    let parts = message.content_parts();
    if parts.iter().all(ContentPart::is_text) {
        return Ok(ChatMessageContent::Text(message.content.clone()));
    }
    let parts = parts
        .iter()
        .map(content_part_to_chat)
        .collect::<MessageResult<Vec<_>>>()?;
    Ok(ChatMessageContent::Parts(parts))
}

/// Reasoning waiting to be attached to the next assistant turn
#[derive(Default)]
struct PendingReasoning(Vec<String>);

impl PendingReasoning {
    fn take(&mut self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.0).join(BLOCK_SEPARATOR))
    }

    /// Emit held reasoning on its own, as an assistant message without text
    fn flush_into(&mut self, output: &mut Vec<ChatCompletionMessageParam>) {
        if let Some(reasoning) = self.take() {
            output.push(ChatCompletionMessageParam::Assistant {
                content: Some(String::new().into()),
                refusal: None,
                name: None,
                tool_calls: None,
                reasoning_content: Some(reasoning),
            });
        }
    }
}

/// Project canonical messages onto chat-completion input messages.
///
/// Reasoning has no message of its own in this format: consecutive reasoning
/// messages are joined and carried as `reasoning_content` on the next
/// assistant message or tool call. Reasoning followed by anything else, or by
/// nothing, becomes an assistant message with empty content.
pub fn messages_to_chat_cmpl_input_messages(
    messages: &[Message],
) -> MessageResult<Vec<ChatCompletionMessageParam>> {
    let mut output = Vec::with_capacity(messages.len());
    let mut pending = PendingReasoning::default();

    for message in messages {
        match message.kind {
            MessageKind::Reasoning => pending.0.push(message.content.clone()),
            MessageKind::Assistant => output.push(ChatCompletionMessageParam::Assistant {
                content: Some(message.content.clone().into()),
                refusal: None,
                name: None,
                tool_calls: None,
                reasoning_content: pending.take(),
            }),
            MessageKind::ToolCall => {
                let (Some(id), Some(name), Some(arguments)) = (
                    &message.tool_call_id,
                    &message.tool_name,
                    &message.tool_call_arguments,
                ) else {
                    return Err(MessageError::InvariantViolation(
                        "Tool call id, name, and arguments are required".to_string(),
                    ));
                };
                output.push(ChatCompletionMessageParam::Assistant {
                    content: None,
                    refusal: None,
                    name: None,
                    tool_calls: Some(vec![ChatCompletionMessageToolCall::function(
                        id, name, arguments,
                    )]),
                    reasoning_content: pending.take(),
                });
            }
            MessageKind::ToolCallOutput => {
                pending.flush_into(&mut output);
                let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                    MessageError::InvariantViolation(
                        "Tool call output without a call id".to_string(),
                    )
                })?;
                output.push(ChatCompletionMessageParam::Tool {
                    content: message.content.clone().into(),
                    tool_call_id,
                });
            }
            MessageKind::System => {
                pending.flush_into(&mut output);
                output.push(ChatCompletionMessageParam::System {
                    content: message.content.clone().into(),
                    name: None,
                });
            }
            MessageKind::Developer => {
                pending.flush_into(&mut output);
                output.push(ChatCompletionMessageParam::Developer {
                    content: message.content.clone().into(),
                    name: None,
                });
            }
            MessageKind::User => {
                pending.flush_into(&mut output);
                output.push(ChatCompletionMessageParam::User {
                    content: user_content(message)?,
                    name: None,
                });
            }
            MessageKind::Generic => {
                return Err(MessageError::UnsupportedMessageType {
                    target: TARGET,
                    kind: format!("{} message with role {}", message.kind, message.role),
                });
            }
        }
    }
    pending.flush_into(&mut output);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Role;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_basic_shapes() -> Result<()> {
        let messages = vec![
            Message::system("You are a taciturn assistant."),
            Message::user("what time in Tokyo now?"),
            Message::tool_call("call_1", "get_time", r#"{"tz":"Asia/Tokyo"}"#)?,
            Message::tool_call_output("call_1", "get_time", r#"{"tz":"Asia/Tokyo"}"#, "12:00")?,
            Message::assistant("It is noon."),
        ];
        let params = serde_json::to_value(messages_to_chat_cmpl_input_messages(&messages)?)?;
        assert_eq!(
            params,
            json!([
                {"role": "system", "content": "You are a taciturn assistant."},
                {"role": "user", "content": "what time in Tokyo now?"},
                {"role": "assistant", "tool_calls": [{
                    "type": "function",
                    "id": "call_1",
                    "function": {"name": "get_time", "arguments": "{\"tz\":\"Asia/Tokyo\"}"}
                }]},
                {"role": "tool", "content": "12:00", "tool_call_id": "call_1"},
                {"role": "assistant", "content": "It is noon."}
            ])
        );
        Ok(())
    }

    #[test]
    fn test_user_multimodal_parts() -> Result<()> {
        let message = Message::user("Describe both.")
            .with_image_url("https://example.com/cat.png")
            .with_image_id("file-123")
            .with_audio(b"RIFF", "audio/wav");
        let params = messages_to_chat_cmpl_input_messages(&[message])?;
        let ChatCompletionMessageParam::User {
            content: ChatMessageContent::Parts(parts),
            ..
        } = &params[0]
        else {
            panic!("Expected user parts, got {:?}", params[0]);
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(
            &parts[1],
            ChatContentPart::ImageUrl { image_url }
                if image_url.url == "https://example.com/cat.png"
        ));
        assert!(matches!(
            &parts[2],
            ChatContentPart::File { file } if file.file_id.as_deref() == Some("file-123")
        ));
        assert!(matches!(
            &parts[3],
            ChatContentPart::InputAudio { input_audio } if input_audio.format == "wav"
        ));
        Ok(())
    }

    #[test]
    fn test_reasoning_merges_into_next_turn() -> Result<()> {
        let messages = vec![
            Message::user("why grass is green?"),
            Message::reasoning("Think about light."),
            Message::reasoning("Chlorophyll."),
            Message::assistant("Chlorophyll reflects green light."),
        ];
        let params = serde_json::to_value(messages_to_chat_cmpl_input_messages(&messages)?)?;
        assert_eq!(params.as_array().map(Vec::len), Some(2));
        assert_eq!(
            params[1]["reasoning_content"],
            "Think about light.\n\nChlorophyll."
        );
        assert_eq!(params[1]["content"], "Chlorophyll reflects green light.");
        Ok(())
    }

    #[test]
    fn test_trailing_reasoning_is_flushed() -> Result<()> {
        let messages = vec![Message::reasoning("thinking"), Message::user("hello?")];
        let params = serde_json::to_value(messages_to_chat_cmpl_input_messages(&messages)?)?;
        assert_eq!(
            params,
            json!([
                {"role": "assistant", "content": "", "reasoning_content": "thinking"},
                {"role": "user", "content": "hello?"}
            ])
        );
        Ok(())
    }

    #[test]
    fn test_generic_message_rejected() {
        let result = messages_to_chat_cmpl_input_messages(&[Message::new(Role::Assistant, "hi")]);
        assert!(matches!(
            result,
            Err(MessageError::UnsupportedMessageType { .. })
        ));
    }
}
