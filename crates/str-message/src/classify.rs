//! Inbound classification of provider payloads into canonical messages.
//!
//! Inputs are matched against [`DISPATCH_RULES`] in order and the first rule
//! whose predicate accepts the input converts it. Untyped JSON values are
//! inspected for explicit discriminants first and otherwise tried against
//! [`SCHEMA_PRIORITY`] in order.

pub mod chat;
pub mod content;
pub mod responses;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{MessageError, MessageResult};
use crate::models::content::{join_parts, ContentPart, DataUrl};
use crate::models::message::Message;
use crate::models::registry::ToolCallRegistry;
use crate::wire::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageParam};
use crate::wire::responses::ResponseInputItem;

/// Anything the classifier accepts
#[derive(Debug, Clone)]
pub enum AnyMessage {
    Message(Message),
    Text(String),
    DataUrl(DataUrl),
    ChatCompletion(ChatCompletion),
    ChatCompletionMessage(ChatCompletionMessage),
    ChatCompletionMessageParam(ChatCompletionMessageParam),
    ResponseItem(ResponseInputItem),
    Untyped(Value),
}

impl AnyMessage {
    /// Short name of the input's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AnyMessage::Message(_) => "Message",
            AnyMessage::Text(_) => "str",
            AnyMessage::DataUrl(_) => "DataUrl",
            AnyMessage::ChatCompletion(_) => "ChatCompletion",
            AnyMessage::ChatCompletionMessage(_) => "ChatCompletionMessage",
            AnyMessage::ChatCompletionMessageParam(_) => "ChatCompletionMessageParam",
            AnyMessage::ResponseItem(_) => "ResponseInputItem",
            AnyMessage::Untyped(value) => json_type_name(value),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Message> for AnyMessage {
    fn from(message: Message) -> Self {
        AnyMessage::Message(message)
    }
}

impl From<&str> for AnyMessage {
    fn from(text: &str) -> Self {
        AnyMessage::Text(text.to_string())
    }
}

impl From<String> for AnyMessage {
    fn from(text: String) -> Self {
        AnyMessage::Text(text)
    }
}

impl From<DataUrl> for AnyMessage {
    fn from(data_url: DataUrl) -> Self {
        AnyMessage::DataUrl(data_url)
    }
}

impl From<ChatCompletion> for AnyMessage {
    fn from(completion: ChatCompletion) -> Self {
        AnyMessage::ChatCompletion(completion)
    }
}

impl From<ChatCompletionMessage> for AnyMessage {
    fn from(message: ChatCompletionMessage) -> Self {
        AnyMessage::ChatCompletionMessage(message)
    }
}

impl From<ChatCompletionMessageParam> for AnyMessage {
    fn from(param: ChatCompletionMessageParam) -> Self {
        AnyMessage::ChatCompletionMessageParam(param)
    }
}

impl From<ResponseInputItem> for AnyMessage {
    fn from(item: ResponseInputItem) -> Self {
        AnyMessage::ResponseItem(item)
    }
}

impl From<Value> for AnyMessage {
    fn from(value: Value) -> Self {
        AnyMessage::Untyped(value)
    }
}

/// One entry of the dispatch table: a predicate and the conversion it guards
pub struct DispatchRule {
    pub name: &'static str,
    pub matches: fn(&AnyMessage) -> bool,
    pub convert: fn(AnyMessage, &mut ToolCallRegistry) -> MessageResult<Vec<Message>>,
}

pub static DISPATCH_RULES: &[DispatchRule] = &[
    DispatchRule {
        name: "canonical",
        matches: is_canonical,
        convert: convert_canonical,
    },
    DispatchRule {
        name: "text",
        matches: is_text,
        convert: convert_text,
    },
    DispatchRule {
        name: "chat_completion",
        matches: is_chat_completion,
        convert: convert_chat_completion,
    },
    DispatchRule {
        name: "chat_completion_message",
        matches: is_chat_completion_message,
        convert: convert_chat_completion_message,
    },
    DispatchRule {
        name: "chat_completion_message_param",
        matches: is_chat_completion_message_param,
        convert: convert_chat_completion_message_param,
    },
    DispatchRule {
        name: "response_input_item",
        matches: is_response_item,
        convert: convert_response_item,
    },
    DispatchRule {
        name: "untyped",
        matches: is_untyped,
        convert: convert_untyped,
    },
];

/// Wire schemas tried, in order, against untyped values without a discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSchema {
    ChatCompletionMessage,
    ChatCompletionMessageParam,
    ResponseInputItem,
}

pub static SCHEMA_PRIORITY: &[WireSchema] = &[
    WireSchema::ChatCompletionMessage,
    WireSchema::ChatCompletionMessageParam,
    WireSchema::ResponseInputItem,
];

impl WireSchema {
    /// Read `value` as this schema, or `None` when it does not validate
    pub fn parse(&self, value: &Value) -> Option<AnyMessage> {
        match self {
            WireSchema::ChatCompletionMessage => ChatCompletionMessage::deserialize(value)
                .ok()
                .map(AnyMessage::ChatCompletionMessage),
            WireSchema::ChatCompletionMessageParam => ChatCompletionMessageParam::deserialize(value)
                .ok()
                .map(AnyMessage::ChatCompletionMessageParam),
            WireSchema::ResponseInputItem => ResponseInputItem::deserialize(value)
                .ok()
                .map(AnyMessage::ResponseItem),
        }
    }
}

/// Classify one input into zero or more canonical messages.
///
/// Tool calls met along the way are recorded in `registry` so later tool
/// outputs can be resolved to their name and arguments.
pub fn messages_from_any<T: Into<AnyMessage>>(
    input: T,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let input = input.into();
    match DISPATCH_RULES.iter().find(|rule| (rule.matches)(&input)) {
        Some(rule) => {
            debug!(rule = rule.name, "Classifying {}", input.type_name());
            (rule.convert)(input, registry)
        }
        None => Err(unsupported(&input)),
    }
}

impl Message {
    pub fn from_any<T: Into<AnyMessage>>(
        input: T,
        registry: &mut ToolCallRegistry,
    ) -> MessageResult<Vec<Message>> {
        messages_from_any(input, registry)
    }
}

/// Pick the shape an untyped value should be read as.
///
/// A JSON string is literal text. Objects are checked for an explicit
/// discriminant before the ordered schema attempts.
pub fn validate_untyped(value: &Value) -> MessageResult<AnyMessage> {
    let object = match value {
        Value::String(text) => return Ok(AnyMessage::Text(text.clone())),
        Value::Object(object) => object,
        other => return Err(MessageError::UnsupportedType(json_type_name(other).to_string())),
    };

    let rejected = |schema: &str, err: serde_json::Error| {
        MessageError::UnsupportedType(format!("invalid {}: {}", schema, err))
    };

    if object.contains_key("kind") && object.contains_key("created_at") {
        let message = Message::deserialize(value).map_err(|err| rejected("Message", err))?;
        return Ok(AnyMessage::Message(message));
    }

    let is_completion = object.get("object").and_then(Value::as_str) == Some("chat.completion")
        || object.get("choices").is_some_and(Value::is_array);
    if is_completion {
        let completion =
            ChatCompletion::deserialize(value).map_err(|err| rejected("ChatCompletion", err))?;
        return Ok(AnyMessage::ChatCompletion(completion));
    }

    if let Some(item_type) = object.get("type").and_then(Value::as_str) {
        if item_type != "message" {
            let item = ResponseInputItem::deserialize(value)
                .map_err(|err| rejected("ResponseInputItem", err))?;
            return Ok(AnyMessage::ResponseItem(item));
        }
    }

    SCHEMA_PRIORITY
        .iter()
        .find_map(|schema| schema.parse(value))
        .ok_or_else(|| MessageError::UnsupportedType("object of unknown schema".to_string()))
}

fn unsupported(input: &AnyMessage) -> MessageError {
    MessageError::UnsupportedType(input.type_name().to_string())
}

fn is_canonical(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::Message(_))
}

fn convert_canonical(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let AnyMessage::Message(message) = input else {
        return Err(unsupported(&input));
    };
    message.validate()?;
    registry.register_message(&message);
    Ok(vec![message])
}

fn is_text(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::Text(_) | AnyMessage::DataUrl(_))
}

fn convert_text(input: AnyMessage, _: &mut ToolCallRegistry) -> MessageResult<Vec<Message>> {
    match input {
        AnyMessage::Text(text) => Ok(vec![Message::user(text)]),
        AnyMessage::DataUrl(data_url) => Ok(vec![Message::user(join_parts(&[
            ContentPart::from_data_url(&data_url),
        ]))]),
        other => Err(unsupported(&other)),
    }
}

fn is_chat_completion(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::ChatCompletion(_))
}

fn convert_chat_completion(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    match input {
        AnyMessage::ChatCompletion(completion) => chat::from_chat_completion(&completion, registry),
        other => Err(unsupported(&other)),
    }
}

fn is_chat_completion_message(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::ChatCompletionMessage(_))
}

fn convert_chat_completion_message(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    match input {
        AnyMessage::ChatCompletionMessage(message) => {
            chat::from_chat_completion_message(&message, registry)
        }
        other => Err(unsupported(&other)),
    }
}

fn is_chat_completion_message_param(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::ChatCompletionMessageParam(_))
}

fn convert_chat_completion_message_param(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    match input {
        AnyMessage::ChatCompletionMessageParam(param) => {
            chat::from_chat_message_param(&param, registry)
        }
        other => Err(unsupported(&other)),
    }
}

fn is_response_item(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::ResponseItem(_))
}

fn convert_response_item(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    match input {
        AnyMessage::ResponseItem(item) => responses::from_response_item(&item, registry),
        other => Err(unsupported(&other)),
    }
}

fn is_untyped(input: &AnyMessage) -> bool {
    matches!(input, AnyMessage::Untyped(_))
}

fn convert_untyped(
    input: AnyMessage,
    registry: &mut ToolCallRegistry,
) -> MessageResult<Vec<Message>> {
    let AnyMessage::Untyped(value) = input else {
        return Err(unsupported(&input));
    };
    let typed = validate_untyped(&value)?;
    messages_from_any(typed, registry)
}
