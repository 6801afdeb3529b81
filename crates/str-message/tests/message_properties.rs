use anyhow::Result;
use serde_json::{json, Value};
use str_message::classify::{WireSchema, SCHEMA_PRIORITY};
use str_message::models::registry::{UNTRACED_TOOL_ARGUMENTS, UNTRACED_TOOL_NAME};
use str_message::serialize::chat::messages_to_chat_cmpl_input_messages;
use str_message::{
    Conversation, InstructionOptions, Message, MessageError, MessageKind, Role, ToolCallRegistry,
};

type Turn = (
    Role,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn turns(messages: &[Message]) -> Vec<Turn> {
    messages
        .iter()
        .map(|message| {
            (
                message.role,
                message.effective_content(),
                message.tool_call_id.clone(),
                message.tool_name.clone(),
                message.tool_call_arguments.clone(),
            )
        })
        .collect()
}

#[test]
fn chat_projection_round_trips() -> Result<()> {
    let original = vec![
        Message::system("You are a taciturn assistant."),
        Message::developer("Answer in one sentence."),
        Message::user("what time in Tokyo now?"),
        Message::user("listen").with_audio(b"ID3abc", "audio/mpeg"),
        Message::tool_call("call_1", "get_time", r#"{"tz":"Asia/Tokyo"}"#)?,
        Message::tool_call_output("call_1", "get_time", r#"{"tz":"Asia/Tokyo"}"#, "12:00")?,
        Message::reasoning("The tool said noon."),
        Message::assistant("It is noon in Tokyo."),
    ];

    let params = messages_to_chat_cmpl_input_messages(&original)?;
    let mut registry = ToolCallRegistry::new();
    let mut restored = Vec::new();
    for param in params {
        // Through JSON, as a provider client would send and receive it
        let value = serde_json::to_value(&param)?;
        restored.extend(Message::from_any(value, &mut registry)?);
    }

    assert_eq!(turns(&restored), turns(&original));
    Ok(())
}

#[test]
fn strict_kinds_require_tool_fields() {
    for (id, name, arguments) in [("", "f", "{}"), ("abc", "", "{}"), ("abc", "f", "")] {
        assert!(matches!(
            Message::tool_call(id, name, arguments),
            Err(MessageError::InvariantViolation(_))
        ));
        assert!(matches!(
            Message::tool_call_output(id, name, arguments, "out"),
            Err(MessageError::InvariantViolation(_))
        ));
    }
    assert!(Message::tool_call("abc", "f", "{}").is_ok());
    assert!(Message::tool_call_output("abc", "f", "{}", "out").is_ok());
}

#[test]
fn tool_outputs_correlate_with_earlier_calls() -> Result<()> {
    let mut conversation = Conversation::new();
    conversation.add_from_any(json!({
        "type": "function_call",
        "call_id": "abc",
        "name": "f",
        "arguments": "{}"
    }))?;
    let output = conversation.add_from_any(json!({
        "type": "function_call_output",
        "call_id": "abc",
        "output": "done"
    }))?;
    assert_eq!(output[0].kind, MessageKind::ToolCallOutput);
    assert_eq!(output[0].tool_name.as_deref(), Some("f"));
    assert_eq!(output[0].tool_call_arguments.as_deref(), Some("{}"));

    let orphan = conversation.add_from_any(json!({
        "role": "tool",
        "tool_call_id": "never_called",
        "content": "done"
    }))?;
    assert_eq!(orphan[0].tool_name.as_deref(), Some(UNTRACED_TOOL_NAME));
    assert_eq!(
        orphan[0].tool_call_arguments.as_deref(),
        Some(UNTRACED_TOOL_ARGUMENTS)
    );
    Ok(())
}

#[test]
fn only_the_first_tool_call_is_kept() -> Result<()> {
    let completion = json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4.1",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {"id": "call_a", "type": "function", "function": {"name": "first", "arguments": "{\"n\":1}"}},
                    {"id": "call_b", "type": "function", "function": {"name": "second", "arguments": "{\"n\":2}"}}
                ]
            }
        }]
    });

    for _ in 0..2 {
        let mut registry = ToolCallRegistry::new();
        let messages = Message::from_any(completion.clone(), &mut registry)?;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::ToolCall);
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(messages[0].tool_name.as_deref(), Some("first"));
        assert_eq!(messages[0].tool_call_arguments.as_deref(), Some("{\"n\":1}"));
        assert!(registry.resolve("call_b").is_none());
    }
    Ok(())
}

#[test]
fn clean_messages_drops_empty_turns() -> Result<()> {
    let mut conversation = Conversation::from_messages(vec![
        Message::user("hi"),
        Message::tool_call("abc", "f", "{}")?,
        Message::new(Role::Assistant, ""),
    ]);
    conversation.clean_messages();

    let kinds: Vec<_> = conversation.messages().iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![MessageKind::User, MessageKind::ToolCall]);
    Ok(())
}

#[test]
fn ambiguous_shape_reads_as_chat_completion_message() -> Result<()> {
    let value = json!({"role": "assistant", "content": "Hello there."});
    assert_eq!(SCHEMA_PRIORITY[0], WireSchema::ChatCompletionMessage);
    assert!(WireSchema::ChatCompletionMessage.parse(&value).is_some());
    assert!(WireSchema::ResponseInputItem.parse(&value).is_some());

    let mut registry = ToolCallRegistry::new();
    let messages = Message::from_any(value, &mut registry)?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Assistant);
    assert_eq!(messages[0].metadata_value("type"), Some("ChatCompletionMessage"));
    Ok(())
}

#[test]
fn unsupported_inputs_are_rejected() {
    let mut registry = ToolCallRegistry::new();
    for value in [json!(42), Value::Null, json!({"foo": "bar"})] {
        let result = Message::from_any(value.clone(), &mut registry);
        assert!(
            matches!(result, Err(MessageError::UnsupportedType(_))),
            "{} should be unsupported, got {:?}",
            value,
            result
        );
    }
}

#[test]
fn conversation_projects_to_every_format() -> Result<()> {
    let messages = vec![
        Message::system("Be terse."),
        Message::user("hi"),
        Message::assistant("hello"),
    ];

    assert_eq!(Message::to_chat_cmpl_input_messages(&messages)?.len(), 3);
    assert_eq!(Message::to_response_input_param(&messages)?.len(), 3);
    assert_eq!(Message::to_sharegpt(&messages).len(), 3);
    assert!(Message::to_harmony(&messages, &[])?.ends_with("hello<|return|>"));
    assert_eq!(
        messages[1].to_instructions(&InstructionOptions::default())?,
        "[user] \"hi\""
    );
    Ok(())
}
