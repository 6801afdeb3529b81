//! Response-API input and output item schemas

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use super::chat::InputAudio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseRole {
    User,
    Assistant,
    System,
    Developer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContent {
    InputText {
        text: String,
    },
    InputImage {
        #[serde(default = "default_detail")]
        detail: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
    },
    InputAudio {
        input_audio: InputAudio,
    },
    InputFile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<Value>,
    },
    Refusal {
        refusal: String,
    },
}

fn default_detail() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EasyInputContent {
    Text(String),
    Parts(Vec<ResponseContent>),
}

/// A message whose content may be a bare string; the `type` tag is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EasyInputMessage {
    pub role: ResponseRole,
    pub content: EasyInputContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: ResponseRole,
    pub content: Vec<ResponseContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub id: String,
    pub role: ResponseRole,
    pub content: Vec<ResponseContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub name: String,
    pub arguments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionCallOutputContent {
    Text(String),
    Parts(Vec<ResponseContent>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub output: FunctionCallOutputContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReasoningPart {
    SummaryText { text: String },
    ReasoningText { text: String },
}

impl ReasoningPart {
    pub fn text(&self) -> &str {
        match self {
            ReasoningPart::SummaryText { text } | ReasoningPart::ReasoningText { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningItem {
    pub id: String,
    #[serde(default)]
    pub summary: Vec<ReasoningPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ReasoningPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpListToolsItem {
    pub id: String,
    pub server_label: String,
    pub tools: Vec<McpTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpCallItem {
    pub id: String,
    pub server_label: String,
    pub name: String,
    pub arguments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Item kinds that are recognised but carried through unconverted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum InertItemKind {
    FileSearchCall,
    WebSearchCall,
    ComputerCall,
    ComputerCallOutput,
    ImageGenerationCall,
    CodeInterpreterCall,
    LocalShellCall,
    LocalShellCallOutput,
    McpApprovalRequest,
    McpApprovalResponse,
    CustomToolCall,
    CustomToolCallOutput,
    ItemReference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseInputItem {
    EasyMessage(EasyInputMessage),
    InputMessage(InputMessage),
    OutputMessage(OutputMessage),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
    Reasoning(ReasoningItem),
    McpListTools(McpListToolsItem),
    McpCall(McpCallItem),
    Inert(InertItemKind, Value),
}

impl ResponseInputItem {
    /// The value of the item's `type` discriminant
    pub fn item_type(&self) -> &str {
        match self {
            ResponseInputItem::EasyMessage(_)
            | ResponseInputItem::InputMessage(_)
            | ResponseInputItem::OutputMessage(_) => "message",
            ResponseInputItem::FunctionCall(_) => "function_call",
            ResponseInputItem::FunctionCallOutput(_) => "function_call_output",
            ResponseInputItem::Reasoning(_) => "reasoning",
            ResponseInputItem::McpListTools(_) => "mcp_list_tools",
            ResponseInputItem::McpCall(_) => "mcp_call",
            ResponseInputItem::Inert(kind, _) => kind.as_ref(),
        }
    }

    /// Name of the schema this item was read as, recorded in message metadata
    pub fn schema_name(&self) -> &'static str {
        match self {
            ResponseInputItem::EasyMessage(_) => "EasyInputMessage",
            ResponseInputItem::InputMessage(_) => "ResponseInputMessage",
            ResponseInputItem::OutputMessage(_) => "ResponseOutputMessage",
            ResponseInputItem::FunctionCall(_) => "ResponseFunctionToolCall",
            ResponseInputItem::FunctionCallOutput(_) => "FunctionCallOutput",
            ResponseInputItem::Reasoning(_) => "ResponseReasoningItem",
            ResponseInputItem::McpListTools(_) => "McpListTools",
            ResponseInputItem::McpCall(_) => "McpCall",
            ResponseInputItem::Inert(..) => "ResponseInputItem",
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let item_type = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let item = match item_type.as_deref() {
            None | Some("message") => Self::message_from_value(value)?,
            Some("function_call") => {
                ResponseInputItem::FunctionCall(serde_json::from_value(value)?)
            }
            Some("function_call_output") => {
                ResponseInputItem::FunctionCallOutput(serde_json::from_value(value)?)
            }
            Some("reasoning") => ResponseInputItem::Reasoning(serde_json::from_value(value)?),
            Some("mcp_list_tools") => {
                ResponseInputItem::McpListTools(serde_json::from_value(value)?)
            }
            Some("mcp_call") => ResponseInputItem::McpCall(serde_json::from_value(value)?),
            Some(other) => match other.parse::<InertItemKind>() {
                Ok(kind) => ResponseInputItem::Inert(kind, value),
                Err(_) => {
                    return Err(<serde_json::Error as serde::de::Error>::custom(format!(
                        "unknown response item type `{}`",
                        other
                    )))
                }
            },
        };
        Ok(item)
    }

    /// Messages share one `type`; tell them apart by role, id and content shape
    fn message_from_value(value: Value) -> Result<Self, serde_json::Error> {
        let role = value.get("role").and_then(Value::as_str);
        let content_is_list = value.get("content").is_some_and(Value::is_array);

        if role == Some("assistant") && value.get("id").is_some() && content_is_list {
            Ok(ResponseInputItem::OutputMessage(serde_json::from_value(value)?))
        } else if content_is_list && role != Some("assistant") {
            Ok(ResponseInputItem::InputMessage(serde_json::from_value(value)?))
        } else {
            Ok(ResponseInputItem::EasyMessage(serde_json::from_value(value)?))
        }
    }
}

impl Serialize for ResponseInputItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = match self {
            ResponseInputItem::EasyMessage(item) => serde_json::to_value(item),
            ResponseInputItem::InputMessage(item) => serde_json::to_value(item),
            ResponseInputItem::OutputMessage(item) => serde_json::to_value(item),
            ResponseInputItem::FunctionCall(item) => serde_json::to_value(item),
            ResponseInputItem::FunctionCallOutput(item) => serde_json::to_value(item),
            ResponseInputItem::Reasoning(item) => serde_json::to_value(item),
            ResponseInputItem::McpListTools(item) => serde_json::to_value(item),
            ResponseInputItem::McpCall(item) => serde_json::to_value(item),
            ResponseInputItem::Inert(_, raw) => Ok(raw.clone()),
        }
        .map_err(S::Error::custom)?;

        if let Some(object) = value.as_object_mut() {
            object.insert("type".to_string(), Value::from(self.item_type()));
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponseInputItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ResponseInputItem::from_value(value).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTokensDetails {
    #[serde(default)]
    pub cached_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTokensDetails {
    #[serde(default)]
    pub reasoning_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens_details: Option<InputTokensDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens_details: Option<OutputTokensDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseToolParam {
    Function {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        parameters: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },
}
