use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::classify::responses::MCP_LIST_TOOLS;
use crate::errors::{MessageError, MessageResult};
use crate::models::content::{ContentPart, ContentPartType};
use crate::models::message::{Message, MessageKind};
use crate::models::tool::FunctionDefinition;
use crate::wire::chat::InputAudio;
use crate::wire::responses::{
    EasyInputContent, EasyInputMessage, FunctionCallItem, FunctionCallOutputContent,
    FunctionCallOutputItem, InputMessage, McpListToolsItem, McpTool, OutputMessage,
    ReasoningItem, ReasoningPart, ResponseContent, ResponseInputItem, ResponseRole,
};

const TARGET: &str = "response input";

/// JSON shape a reasoning message's content is expected to hold
#[derive(Debug, Default, Deserialize)]
struct ReasoningPayload {
    #[serde(default)]
    summary: Vec<ReasoningPart>,
    #[serde(default)]
    content: Vec<ReasoningPart>,
}

fn easy_message(role: ResponseRole, text: &str) -> ResponseInputItem {
    ResponseInputItem::EasyMessage(EasyInputMessage {
        role,
        content: EasyInputContent::Text(text.to_string()),
    })
}

fn user_input(content: ResponseContent) -> ResponseInputItem {
    ResponseInputItem::InputMessage(InputMessage {
        role: ResponseRole::User,
        content: vec![content],
        status: None,
    })
}

/// One item per content part, each part in the item shape its type requires
fn user_part_to_item(part: &ContentPart) -> MessageResult<ResponseInputItem> {
    let item = match part.kind {
        ContentPartType::Text => easy_message(ResponseRole::User, &part.value),
        ContentPartType::Audio => {
            let (data, format) =
                part.audio_payload()
                    .ok_or_else(|| MessageError::UnsupportedContentPart {
                        target: TARGET,
                        part: "audio without an audio data URL".to_string(),
                    })?;
            user_input(ResponseContent::InputAudio {
                input_audio: InputAudio { data, format },
            })
        }
        ContentPartType::ImageUrl => user_input(ResponseContent::InputImage {
            detail: "auto".to_string(),
            image_url: Some(part.value.clone()),
            file_id: None,
        }),
        ContentPartType::ImageId => user_input(ResponseContent::InputImage {
            detail: "auto".to_string(),
            image_url: None,
            file_id: Some(part.value.clone()),
        }),
        ContentPartType::DataUrl => user_input(ResponseContent::InputFile {
            file_id: None,
            file_data: Some(part.value.clone()),
            file_url: None,
            filename: None,
        }),
    };
    Ok(item)
}

/// Content parts of `message`, or a single empty text part when there are none
fn parts_or_empty_text(message: &Message) -> Vec<ContentPart> {
    let parts = message.content_parts();
    if parts.is_empty() {
        vec![ContentPart::text("")]
    } else {
        parts
    }
}

fn assistant_items(message: &Message) -> MessageResult<Vec<ResponseInputItem>> {
    parts_or_empty_text(message)
        .into_iter()
        .map(|part| {
            if !part.is_text() {
                return Err(MessageError::UnsupportedContentPart {
                    target: TARGET,
                    part: format!("assistant {}", part.kind),
                });
            }
            Ok(ResponseInputItem::OutputMessage(OutputMessage {
                id: message.id.clone(),
                role: ResponseRole::Assistant,
                content: vec![ResponseContent::OutputText {
                    text: part.value,
                    annotations: Vec::new(),
                }],
                status: Some("completed".to_string()),
            }))
        })
        .collect()
}

/// The synthetic listing call goes back out as the item it was read from.
///
/// `None` when the call only shares the name and carries no tool list.
fn mcp_list_tools_item(call_id: &str, message: &Message) -> Option<ResponseInputItem> {
    let functions: Vec<FunctionDefinition> = serde_json::from_str(&message.content).ok()?;
    let arguments: Value =
        serde_json::from_str(message.tool_call_arguments.as_deref().unwrap_or("{}")).ok()?;
    let server_label = arguments.get("server_label")?.as_str()?.to_string();
    Some(ResponseInputItem::McpListTools(McpListToolsItem {
        id: call_id.to_string(),
        server_label,
        tools: functions.iter().map(McpTool::from).collect(),
        error: None,
    }))
}

fn reasoning_item(message: &Message) -> ResponseInputItem {
    let payload = serde_json::from_str::<ReasoningPayload>(&message.content).unwrap_or_else(|err| {
        warn!(id = %message.id, error = %err, "Failed to parse reasoning content");
        ReasoningPayload::default()
    });
    ResponseInputItem::Reasoning(ReasoningItem {
        id: message.id.clone(),
        summary: payload.summary,
        content: Some(payload.content),
        encrypted_content: None,
        status: None,
    })
}

fn tool_fields(message: &Message) -> MessageResult<(&str, &str, &str)> {
    match (
        message.tool_call_id.as_deref(),
        message.tool_name.as_deref(),
        message.tool_call_arguments.as_deref(),
    ) {
        (Some(id), Some(name), Some(arguments)) => Ok((id, name, arguments)),
        _ => Err(MessageError::InvariantViolation(
            "Tool call id, name, and arguments are required".to_string(),
        )),
    }
}

/// Project canonical messages onto Response-API input items.
///
/// User and assistant content expands to one item per content part, and
/// empty content still yields one item.
pub fn messages_to_response_input_param(
    messages: &[Message],
) -> MessageResult<Vec<ResponseInputItem>> {
    let mut items = Vec::with_capacity(messages.len());

    for message in messages {
        match message.kind {
            MessageKind::User => {
                for part in parts_or_empty_text(message) {
                    items.push(user_part_to_item(&part)?);
                }
            }
            MessageKind::System => items.push(easy_message(ResponseRole::System, &message.content)),
            MessageKind::Developer => {
                items.push(easy_message(ResponseRole::Developer, &message.content))
            }
            MessageKind::Assistant => items.extend(assistant_items(message)?),
            MessageKind::ToolCall => {
                let (call_id, name, arguments) = tool_fields(message)?;
                let listing = (name == MCP_LIST_TOOLS)
                    .then(|| mcp_list_tools_item(call_id, message))
                    .flatten();
                items.push(listing.unwrap_or_else(|| {
                    ResponseInputItem::FunctionCall(FunctionCallItem {
                        id: None,
                        call_id: call_id.to_string(),
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                        status: None,
                    })
                }));
            }
            MessageKind::ToolCallOutput => {
                let (call_id, _, _) = tool_fields(message)?;
                items.push(ResponseInputItem::FunctionCallOutput(FunctionCallOutputItem {
                    id: None,
                    call_id: call_id.to_string(),
                    output: FunctionCallOutputContent::Text(message.content.clone()),
                    status: None,
                }));
            }
            MessageKind::Reasoning => items.push(reasoning_item(message)),
            MessageKind::Generic => {
                return Err(MessageError::UnsupportedMessageType {
                    target: TARGET,
                    kind: format!("{} message with role {}", message.kind, message.role),
                });
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Role;
    use anyhow::Result;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn test_user_parts_expand_to_items() -> Result<()> {
        let message = Message::user("What is in this image?")
            .with_image_url("https://example.com/cat.png")
            .with_image_id("file-abc")
            .with_audio(b"RIFF", "audio/wav");
        let items = serde_json::to_value(messages_to_response_input_param(&[message])?)?;
        assert_eq!(
            items,
            json!([
                {"type": "message", "role": "user", "content": "What is in this image?"},
                {"type": "message", "role": "user", "content": [
                    {"type": "input_image", "detail": "auto", "image_url": "https://example.com/cat.png"}
                ]},
                {"type": "message", "role": "user", "content": [
                    {"type": "input_image", "detail": "auto", "file_id": "file-abc"}
                ]},
                {"type": "message", "role": "user", "content": [
                    {"type": "input_audio", "input_audio": {"data": "UklGRg==", "format": "wav"}}
                ]}
            ])
        );
        Ok(())
    }

    #[test]
    fn test_empty_messages_keep_their_place() -> Result<()> {
        let messages = vec![
            Message::user(""),
            Message::assistant("").with_id("msg_empty"),
        ];
        let items = serde_json::to_value(messages_to_response_input_param(&messages)?)?;
        assert_eq!(
            items,
            json!([
                {"type": "message", "role": "user", "content": ""},
                {
                    "type": "message",
                    "id": "msg_empty",
                    "role": "assistant",
                    "status": "completed",
                    "content": [{"type": "output_text", "text": "", "annotations": []}]
                }
            ])
        );
        Ok(())
    }

    #[test]
    fn test_assistant_and_tools() -> Result<()> {
        let messages = vec![
            Message::developer("Be brief."),
            Message::tool_call("abc", "f", "{}")?,
            Message::tool_call_output("abc", "f", "{}", "ok")?,
            Message::assistant("Done.").with_id("msg_1"),
        ];
        let items = serde_json::to_value(messages_to_response_input_param(&messages)?)?;
        assert_eq!(
            items,
            json!([
                {"type": "message", "role": "developer", "content": "Be brief."},
                {"type": "function_call", "call_id": "abc", "name": "f", "arguments": "{}"},
                {"type": "function_call_output", "call_id": "abc", "output": "ok"},
                {
                    "type": "message",
                    "id": "msg_1",
                    "role": "assistant",
                    "status": "completed",
                    "content": [{"type": "output_text", "text": "Done.", "annotations": []}]
                }
            ])
        );
        Ok(())
    }

    #[test]
    fn test_reasoning_from_json_content() -> Result<()> {
        let content = json!({
            "summary": [{"type": "summary_text", "text": "Plan"}],
            "content": [{"type": "reasoning_text", "text": "Details"}]
        })
        .to_string();
        let message = Message::reasoning(content).with_id("rs_1");
        let items = messages_to_response_input_param(&[message])?;
        let ResponseInputItem::Reasoning(item) = &items[0] else {
            panic!("Expected a reasoning item, got {:?}", items[0]);
        };
        assert_eq!(item.id, "rs_1");
        assert_eq!(item.summary[0].text(), "Plan");
        assert_eq!(item.content.as_ref().map(Vec::len), Some(1));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn test_bad_reasoning_json_warns() -> Result<()> {
        let items = messages_to_response_input_param(&[
            Message::reasoning("plain thoughts"),
            Message::user("next"),
        ])?;
        assert_eq!(items.len(), 2);
        let ResponseInputItem::Reasoning(item) = &items[0] else {
            panic!("Expected a reasoning item, got {:?}", items[0]);
        };
        assert!(item.summary.is_empty());
        assert_eq!(item.content, Some(vec![]));
        assert!(logs_contain("Failed to parse reasoning content"));
        Ok(())
    }

    #[test]
    fn test_mcp_list_tools_round_trip() -> Result<()> {
        let functions = vec![FunctionDefinition::new(
            "search_documentation",
            "Search AWS docs",
            json!({"type": "object"}),
        )];
        let message = Message::tool_call(
            "mcpl_1",
            MCP_LIST_TOOLS,
            r#"{"server_label":"aws-knowledge"}"#,
        )?
        .with_content(serde_json::to_string(&functions)?);
        let items = serde_json::to_value(messages_to_response_input_param(&[message])?)?;
        assert_eq!(items[0]["type"], "mcp_list_tools");
        assert_eq!(items[0]["id"], "mcpl_1");
        assert_eq!(items[0]["server_label"], "aws-knowledge");
        assert_eq!(items[0]["tools"][0]["name"], "search_documentation");
        Ok(())
    }

    #[test]
    fn test_function_named_like_listing_stays_a_function_call() -> Result<()> {
        let rendered = crate::models::message::render_tool_call(MCP_LIST_TOOLS, "call_9", "{}");
        let message = Message::tool_call("call_9", MCP_LIST_TOOLS, "{}")?.with_content(rendered);
        let items = serde_json::to_value(messages_to_response_input_param(&[message])?)?;
        assert_eq!(
            items,
            json!([{
                "type": "function_call",
                "call_id": "call_9",
                "name": "mcp_list_tools",
                "arguments": "{}"
            }])
        );
        Ok(())
    }

    #[test]
    fn test_assistant_image_and_generic_rejected() {
        let assistant = Message::assistant("look").with_image_url("https://example.com/a.png");
        assert!(matches!(
            messages_to_response_input_param(&[assistant]),
            Err(MessageError::UnsupportedContentPart { .. })
        ));
        assert!(matches!(
            messages_to_response_input_param(&[Message::new(Role::User, "hi")]),
            Err(MessageError::UnsupportedMessageType { .. })
        ));
    }
}
