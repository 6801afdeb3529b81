use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{MessageError, MessageResult};
use crate::wire::chat::ChatCompletionToolParam;
use crate::wire::responses::{McpTool, ResponseToolParam};

lazy_static! {
    static ref INVALID_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    static ref VALID_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments object
    #[serde(default)]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl FunctionDefinition {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        FunctionDefinition {
            name: name.into(),
            description: Some(description.into()),
            parameters,
            strict: None,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

impl From<&McpTool> for FunctionDefinition {
    fn from(tool: &McpTool) -> Self {
        FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
            strict: None,
        }
    }
}

impl From<&FunctionDefinition> for McpTool {
    fn from(function: &FunctionDefinition) -> Self {
        McpTool {
            name: function.name.clone(),
            description: function.description.clone(),
            input_schema: function.parameters.clone(),
            annotations: None,
        }
    }
}

pub fn sanitize_function_name(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").to_string()
}

pub fn is_valid_function_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

pub(crate) fn check_function_names(functions: &[FunctionDefinition]) -> MessageResult<()> {
    let mut names = HashSet::new();
    for function in functions {
        if !is_valid_function_name(&function.name) {
            return Err(MessageError::InvariantViolation(format!(
                "The function name '{}' has invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                function.name
            )));
        }
        if !names.insert(function.name.as_str()) {
            return Err(MessageError::InvariantViolation(format!(
                "Duplicate function name: {}",
                function.name
            )));
        }
    }
    Ok(())
}

pub fn functions_to_chat_cmpl_tools(
    functions: &[FunctionDefinition],
) -> MessageResult<Vec<ChatCompletionToolParam>> {
    check_function_names(functions)?;
    Ok(functions
        .iter()
        .cloned()
        .map(|function| ChatCompletionToolParam::Function { function })
        .collect())
}

pub fn functions_to_response_tools(
    functions: &[FunctionDefinition],
) -> MessageResult<Vec<ResponseToolParam>> {
    check_function_names(functions)?;
    Ok(functions
        .iter()
        .map(|function| ResponseToolParam::Function {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
            strict: function.strict,
        })
        .collect())
}
