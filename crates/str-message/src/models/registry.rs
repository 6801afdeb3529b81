use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::message::{Message, MessageKind};

/// Tool name substituted when an output's call was never registered
pub const UNTRACED_TOOL_NAME: &str = "__can_not_tracing_tool_call__";
/// Tool arguments substituted when an output's call was never registered
pub const UNTRACED_TOOL_ARGUMENTS: &str = "__can_not_tracing_tool_call_arguments__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredCall {
    pub name: String,
    pub arguments: String,
}

/// Correlates a tool call id with the name and arguments of the call.
///
/// Some payloads only carry the call id on the output side, so the name and
/// arguments recorded when the call was classified are looked up here.
/// One registry belongs to one conversation; entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ToolCallRegistry {
    calls: HashMap<String, RegisteredCall>,
}

impl ToolCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call; a repeated id overwrites the earlier entry
    pub fn register<I, N, A>(&mut self, call_id: I, name: N, arguments: A)
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        self.calls.insert(
            call_id.into(),
            RegisteredCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        );
    }

    /// Record `message` when it is a complete tool call; anything else is ignored
    pub fn register_message(&mut self, message: &Message) {
        if message.kind != MessageKind::ToolCall {
            return;
        }
        if let (Some(id), Some(name), Some(arguments)) = (
            &message.tool_call_id,
            &message.tool_name,
            &message.tool_call_arguments,
        ) {
            self.register(id.as_str(), name.as_str(), arguments.as_str());
        }
    }

    pub fn resolve(&self, call_id: &str) -> Option<&RegisteredCall> {
        self.calls.get(call_id)
    }

    /// Name and arguments for `call_id`, or the placeholder pair on a miss
    pub fn resolve_or_placeholder(&self, call_id: &str) -> (String, String) {
        match self.resolve(call_id) {
            Some(call) => (call.name.clone(), call.arguments.clone()),
            None => (
                UNTRACED_TOOL_NAME.to_string(),
                UNTRACED_TOOL_ARGUMENTS.to_string(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
