use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::message::Message;
use super::registry::ToolCallRegistry;
use super::usage::{calculate_cost, PriceTable, Usage};
use crate::classify::{messages_from_any, AnyMessage};
use crate::errors::MessageResult;
use crate::objectid::create_object_id;
use crate::serialize::chat::messages_to_chat_cmpl_input_messages;
use crate::serialize::responses::messages_to_response_input_param;
use crate::wire::chat::ChatCompletionMessageParam;
use crate::wire::responses::ResponseInputItem;

/// Usage accumulated under one annotation label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub model: String,
    pub usage: Usage,
    /// USD, zero when the model had no known price
    pub cost: f64,
    pub requests: u64,
}

/// An ordered list of messages plus the usage spent producing them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredConversation")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    pub usages: BTreeMap<String, UsageRecord>,
    #[serde(skip)]
    registry: ToolCallRegistry,
}

#[derive(Deserialize)]
struct StoredConversation {
    id: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    usages: BTreeMap<String, UsageRecord>,
}

impl From<StoredConversation> for Conversation {
    fn from(stored: StoredConversation) -> Self {
        let mut conversation = Conversation {
            id: stored.id,
            messages: Vec::new(),
            usages: stored.usages,
            registry: ToolCallRegistry::new(),
        };
        conversation.replace_messages(stored.messages);
        conversation
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Conversation {
            id: create_object_id("conv"),
            messages: Vec::new(),
            usages: BTreeMap::new(),
            registry: ToolCallRegistry::new(),
        }
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut conversation = Self::new();
        conversation.replace_messages(messages);
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn registry(&self) -> &ToolCallRegistry {
        &self.registry
    }

    pub fn add_message(&mut self, message: Message) {
        self.registry.register_message(&message);
        self.messages.push(message);
    }

    /// Classify `input` against this conversation's tool calls and append the result
    pub fn add_from_any<T: Into<AnyMessage>>(&mut self, input: T) -> MessageResult<&[Message]> {
        let added = messages_from_any(input, &mut self.registry)?;
        let start = self.messages.len();
        self.messages.extend(added);
        Ok(&self.messages[start..])
    }

    /// Swap the message list wholesale; the registry is rebuilt from the new list
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.registry.clear();
        self.messages.clear();
        for message in messages {
            self.add_message(message);
        }
    }

    /// Drop messages whose content and tool fields are all empty
    pub fn clean_messages(&mut self) {
        self.messages.retain(|message| !message.has_empty_payload());
    }

    /// Record `usage` under `annotation`.
    ///
    /// A model `prices` does not know is recorded at zero cost.
    pub fn add_usage(
        &mut self,
        annotation: &str,
        model: &str,
        usage: Usage,
        prices: &dyn PriceTable,
    ) {
        let cost = match prices.price(model) {
            Some(pricing) => calculate_cost(&usage, &pricing),
            None => {
                warn!(model = %model, "No price for model, recording zero cost");
                0.0
            }
        };

        let record = self.usages.entry(annotation.to_string()).or_default();
        record.model = model.to_string();
        record.usage += usage;
        record.cost += cost;
        record.requests += 1;
    }

    pub fn total_cost(&self) -> f64 {
        self.usages.values().map(|record| record.cost).sum()
    }

    pub fn total_usage(&self) -> Usage {
        let mut total = Usage::default();
        for record in self.usages.values() {
            total += record.usage;
        }
        total
    }

    pub fn chat_cmpl_input_messages(&self) -> MessageResult<Vec<ChatCompletionMessageParam>> {
        messages_to_chat_cmpl_input_messages(&self.messages)
    }

    pub fn response_input_param(&self) -> MessageResult<Vec<ResponseInputItem>> {
        messages_to_response_input_param(&self.messages)
    }
}
