use serde_json::json;

use super::content::{
    easy_content_to_str, function_output_to_str, output_text_to_str, response_parts_to_str,
};
use crate::errors::{MessageError, MessageResult};
use crate::models::content::BLOCK_SEPARATOR;
use crate::models::message::{render_tool_call, Message};
use crate::models::registry::ToolCallRegistry;
use crate::models::tool::FunctionDefinition;
use crate::wire::responses::{ReasoningItem, ResponseInputItem, ResponseRole};

/// Tool name of the synthetic call that carries an MCP tool listing
pub const MCP_LIST_TOOLS: &str = "mcp_list_tools";

fn message_for_role(role: ResponseRole, content: String) -> Message {
    match role {
        ResponseRole::User => Message::user(content),
        ResponseRole::Assistant => Message::assistant(content),
        ResponseRole::System => Message::system(content),
        ResponseRole::Developer => Message::developer(content),
    }
}

/// Summaries as `## <text>` headings followed by the raw reasoning text
pub fn reasoning_to_str(item: &ReasoningItem) -> String {
    item.summary
        .iter()
        .map(|summary| format!("## {}", summary.text()))
        .chain(
            item.content
                .iter()
                .flatten()
                .map(|content| content.text().to_string()),
        )
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn tool_call(
    call_id: &str,
    name: &str,
    arguments: &str,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Message> {
    let message = Message::tool_call(call_id, name, arguments)?
        .with_content(render_tool_call(name, call_id, arguments));
    registry.register(call_id, name, arguments);
    Ok(message)
}

pub fn from_response_item(
    item: &ResponseInputItem,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let source = item.schema_name();
    let messages = match item {
        ResponseInputItem::EasyMessage(message) => {
            vec![message_for_role(message.role, easy_content_to_str(&message.content)?)]
        }
        ResponseInputItem::InputMessage(message) => {
            vec![message_for_role(message.role, response_parts_to_str(&message.content)?)]
        }
        ResponseInputItem::OutputMessage(message) => {
            vec![Message::assistant(output_text_to_str(&message.content)).with_id(&message.id)]
        }
        ResponseInputItem::FunctionCall(call) => {
            let message = tool_call(&call.call_id, &call.name, &call.arguments, registry)?;
            vec![match &call.id {
                Some(id) => message.with_id(id),
                None => message,
            }]
        }
        ResponseInputItem::FunctionCallOutput(output) => {
            let (name, arguments) = registry.resolve_or_placeholder(&output.call_id);
            let content = function_output_to_str(&output.output)?;
            vec![Message::tool_call_output(&output.call_id, name, arguments, content)?]
        }
        ResponseInputItem::Reasoning(reasoning) => {
            vec![Message::reasoning(reasoning_to_str(reasoning)).with_id(&reasoning.id)]
        }
        ResponseInputItem::McpListTools(listing) => {
            let tools = listing
                .tools
                .iter()
                .map(FunctionDefinition::from)
                .collect::<Vec<_>>();
            let arguments = json!({"server_label": listing.server_label}).to_string();
            let message = tool_call(&listing.id, MCP_LIST_TOOLS, &arguments, registry)?
                .with_content(serde_json::to_string(&tools)?)
                .with_id(&listing.id);
            vec![message]
        }
        ResponseInputItem::McpCall(call) => {
            let arguments = if call.arguments.is_empty() {
                "{}"
            } else {
                call.arguments.as_str()
            };
            let request = tool_call(&call.id, &call.name, arguments, registry)?;
            let output = match (&call.output, &call.error) {
                (Some(output), _) => output.clone(),
                (None, Some(error)) => format!("Error: {}", error),
                (None, None) => String::new(),
            };
            let response = Message::tool_call_output(&call.id, &call.name, arguments, output)?;
            vec![request, response]
        }
        ResponseInputItem::Inert(kind, _) => {
            return Err(MessageError::UnsupportedVariant(format!(
                "Unsupported response input item: {}",
                kind
            )));
        }
    };

    Ok(messages
        .into_iter()
        .map(|message| message.with_metadata("type", source))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{Channel, MessageKind, Role};
    use crate::models::registry::UNTRACED_TOOL_NAME;
    use anyhow::Result;

    fn item(value: serde_json::Value) -> ResponseInputItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_easy_and_input_messages() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let messages = from_response_item(
            &item(json!({"role": "developer", "content": "Be terse."})),
            &mut registry,
        )?;
        assert_eq!(messages[0].kind, MessageKind::Developer);
        assert_eq!(messages[0].content, "Be terse.");
        assert_eq!(messages[0].metadata_value("type"), Some("EasyInputMessage"));

        let messages = from_response_item(
            &item(json!({
                "type": "message",
                "role": "user",
                "content": [
                    {"type": "input_text", "text": "What is this?"},
                    {"type": "input_image", "detail": "auto", "image_url": "https://example.com/a.png"}
                ]
            })),
            &mut registry,
        )?;
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content,
            "What is this?\n\n[image_url](https://example.com/a.png)"
        );
        Ok(())
    }

    #[test]
    fn test_output_message_keeps_id() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let messages = from_response_item(
            &item(json!({
                "type": "message",
                "id": "msg_abc",
                "role": "assistant",
                "status": "completed",
                "content": [{"type": "output_text", "text": "Hi there", "annotations": []}]
            })),
            &mut registry,
        )?;
        assert_eq!(messages[0].id, "msg_abc");
        assert_eq!(messages[0].channel, Some(Channel::Final));
        assert_eq!(messages[0].content, "Hi there");
        Ok(())
    }

    #[test]
    fn test_function_call_correlation() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let call =
            json!({"type": "function_call", "call_id": "abc", "name": "f", "arguments": "{}"});
        let call = from_response_item(&item(call), &mut registry)?;
        assert_eq!(call[0].kind, MessageKind::ToolCall);

        let output = from_response_item(
            &item(json!({"type": "function_call_output", "call_id": "abc", "output": "done"})),
            &mut registry,
        )?;
        assert_eq!(output[0].tool_name.as_deref(), Some("f"));
        assert_eq!(output[0].tool_call_arguments.as_deref(), Some("{}"));
        assert_eq!(output[0].content, "done");

        let orphan = from_response_item(
            &item(json!({"type": "function_call_output", "call_id": "nope", "output": "x"})),
            &mut registry,
        )?;
        assert_eq!(orphan[0].tool_name.as_deref(), Some(UNTRACED_TOOL_NAME));
        Ok(())
    }

    #[test]
    fn test_reasoning_item() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let messages = from_response_item(
            &item(json!({
                "type": "reasoning",
                "id": "rs_1",
                "summary": [
                    {"type": "summary_text", "text": "Plan"},
                    {"type": "summary_text", "text": "Check"}
                ],
                "content": [{"type": "reasoning_text", "text": "raw thoughts"}]
            })),
            &mut registry,
        )?;
        assert_eq!(messages[0].id, "rs_1");
        assert_eq!(messages[0].kind, MessageKind::Reasoning);
        assert_eq!(messages[0].content, "## Plan\n\n## Check\n\nraw thoughts");
        Ok(())
    }

    #[test]
    fn test_mcp_list_tools() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let messages = from_response_item(
            &item(json!({
                "type": "mcp_list_tools",
                "id": "mcpl_1",
                "server_label": "aws-knowledge",
                "tools": [{"name": "search_documentation", "input_schema": {"type": "object"}}]
            })),
            &mut registry,
        )?;
        assert_eq!(messages.len(), 1);
        let call = &messages[0];
        assert_eq!(call.tool_name.as_deref(), Some(MCP_LIST_TOOLS));
        assert_eq!(call.tool_call_id.as_deref(), Some("mcpl_1"));
        assert_eq!(
            call.tool_call_arguments.as_deref(),
            Some(r#"{"server_label":"aws-knowledge"}"#)
        );
        let tools: Vec<FunctionDefinition> = serde_json::from_str(&call.content)?;
        assert_eq!(tools[0].name, "search_documentation");
        Ok(())
    }

    #[test]
    fn test_mcp_call_expands_to_pair() -> Result<()> {
        let mut registry = ToolCallRegistry::new();
        let messages = from_response_item(
            &item(json!({
                "type": "mcp_call",
                "id": "mcp_1",
                "server_label": "aws-knowledge",
                "name": "search_documentation",
                "arguments": "{\"q\":\"s3\"}",
                "output": "S3 is object storage"
            })),
            &mut registry,
        )?;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::ToolCall);
        assert_eq!(messages[1].kind, MessageKind::ToolCallOutput);
        assert_eq!(messages[1].content, "S3 is object storage");
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("mcp_1"));
        Ok(())
    }

    #[test]
    fn test_inert_items_unsupported() {
        let mut registry = ToolCallRegistry::new();
        let result = from_response_item(
            &item(json!({"type": "item_reference", "id": "ref_1"})),
            &mut registry,
        );
        assert!(matches!(result, Err(MessageError::UnsupportedVariant(_))));
    }
}
