//! Outbound projections of canonical messages.
//!
//! The provider projections reject message kinds their format has no place
//! for. The display transcripts accept every kind.
pub mod chat;
pub mod harmony;
pub mod responses;
pub mod transcript;

use crate::errors::MessageResult;
use crate::models::message::Message;
use crate::models::tool::FunctionDefinition;
use crate::wire::chat::ChatCompletionMessageParam;
use crate::wire::responses::ResponseInputItem;

use self::transcript::{InstructionOptions, ShareGptTurn};

impl Message {
    pub fn to_chat_cmpl_input_messages(
        messages: &[Message],
    ) -> MessageResult<Vec<ChatCompletionMessageParam>> {
        chat::messages_to_chat_cmpl_input_messages(messages)
    }

    pub fn to_response_input_param(messages: &[Message]) -> MessageResult<Vec<ResponseInputItem>> {
        responses::messages_to_response_input_param(messages)
    }

    pub fn to_sharegpt(messages: &[Message]) -> Vec<ShareGptTurn> {
        transcript::messages_to_sharegpt(messages)
    }

    pub fn to_harmony(
        messages: &[Message],
        functions: &[FunctionDefinition],
    ) -> MessageResult<String> {
        harmony::messages_to_harmony(messages, functions)
    }

    /// This message as one transcript line
    pub fn to_instructions(&self, options: &InstructionOptions) -> MessageResult<String> {
        transcript::to_instructions(self, options)
    }
}
