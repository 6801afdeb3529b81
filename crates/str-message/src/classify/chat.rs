use tracing::debug;

use super::content::chat_content_to_str;
use crate::errors::{MessageError, MessageResult};
use crate::models::message::{render_tool_call, Message};
use crate::models::registry::ToolCallRegistry;
use crate::wire::chat::{
    ChatCompletion, ChatCompletionMessage, ChatCompletionMessageParam,
    ChatCompletionMessageToolCall,
};

/// The pieces of an assistant turn shared by response and input messages
struct AssistantTurn<'a> {
    content: Option<String>,
    tool_calls: Option<&'a [ChatCompletionMessageToolCall]>,
    reasoning: Option<&'a str>,
}

impl AssistantTurn<'_> {
    /// Reasoning first, then the first tool call or the visible text
    fn into_messages(
        self,
        registry: &mut ToolCallRegistry,
        source: &str,
    ) -> MessageResult<Vec<Message>> {
        let mut messages = Vec::new();

        if let Some(reasoning) = self.reasoning.filter(|r| !r.is_empty()) {
            messages.push(Message::reasoning(reasoning).with_metadata("type", source));
        }

        match self.tool_calls.and_then(|calls| calls.first()) {
            Some(ChatCompletionMessageToolCall::Function { id, function }) => {
                if let Some(calls) = self.tool_calls.filter(|calls| calls.len() > 1) {
                    debug!(
                        dropped = calls.len() - 1,
                        "Only the first tool call of an assistant message is kept"
                    );
                }
                let message = Message::tool_call(id, &function.name, &function.arguments)?
                    .with_content(render_tool_call(&function.name, id, &function.arguments))
                    .with_metadata("type", source);
                registry.register(id, &function.name, &function.arguments);
                messages.push(message);
            }
            Some(other) => {
                return Err(MessageError::UnsupportedVariant(format!(
                    "Unsupported tool call type: {}",
                    other.type_name()
                )));
            }
            None => {
                let content = self.content.unwrap_or_default();
                if messages.is_empty() || !content.is_empty() {
                    messages.push(Message::assistant(content).with_metadata("type", source));
                }
            }
        }

        Ok(messages)
    }
}

pub fn from_chat_completion_message(
    message: &ChatCompletionMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    AssistantTurn {
        content: message.content.clone().or_else(|| message.refusal.clone()),
        tool_calls: message.tool_calls.as_deref(),
        reasoning: message.reasoning_content.as_deref(),
    }
    .into_messages(registry, "ChatCompletionMessage")
}

/// Classify the first choice of a completion; the last message keeps the completion id
pub fn from_chat_completion(
    completion: &ChatCompletion,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let choice = completion.choices.first().ok_or_else(|| {
        MessageError::UnsupportedVariant("No choice found in ChatCompletion".to_string())
    })?;

    let mut messages = AssistantTurn {
        content: choice
            .message
            .content
            .clone()
            .or_else(|| choice.message.refusal.clone()),
        tool_calls: choice.message.tool_calls.as_deref(),
        reasoning: choice.message.reasoning_content.as_deref(),
    }
    .into_messages(registry, "ChatCompletion")?;

    if let Some(created) = completion.created {
        messages = messages
            .into_iter()
            .map(|message| message.with_created_at(created))
            .collect();
    }
    if let Some(last) = messages.pop() {
        messages.push(last.with_id(&completion.id));
    }
    Ok(messages)
}

pub fn from_chat_message_param(
    param: &ChatCompletionMessageParam,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let message = match param {
        ChatCompletionMessageParam::System { content, .. } => {
            Message::system(chat_content_to_str(content)?)
                .with_metadata("type", "ChatCompletionSystemMessageParam")
        }
        ChatCompletionMessageParam::Developer { content, .. } => {
            Message::developer(chat_content_to_str(content)?)
                .with_metadata("type", "ChatCompletionDeveloperMessageParam")
        }
        ChatCompletionMessageParam::User { content, .. } => {
            Message::user(chat_content_to_str(content)?)
                .with_metadata("type", "ChatCompletionUserMessageParam")
        }
        ChatCompletionMessageParam::Assistant {
            content,
            refusal,
            tool_calls,
            reasoning_content,
            ..
        } => {
            return AssistantTurn {
                content: content
                    .as_ref()
                    .map(chat_content_to_str)
                    .transpose()?
                    .or_else(|| refusal.clone()),
                tool_calls: tool_calls.as_deref(),
                reasoning: reasoning_content.as_deref(),
            }
            .into_messages(registry, "ChatCompletionAssistantMessageParam");
        }
        ChatCompletionMessageParam::Tool {
            content,
            tool_call_id,
        } => {
            let (name, arguments) = registry.resolve_or_placeholder(tool_call_id);
            Message::tool_call_output(tool_call_id, name, arguments, chat_content_to_str(content)?)?
                .with_metadata("type", "ChatCompletionToolMessageParam")
        }
        ChatCompletionMessageParam::Function { name, .. } => {
            return Err(MessageError::UnsupportedVariant(format!(
                "Deprecated function message `{}` is not supported",
                name
            )));
        }
    };
    Ok(vec![message])
}
