use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::MessageResult;
use crate::models::message::{Message, MessageKind};
use crate::models::tool::{check_function_names, FunctionDefinition};
use crate::prompt_template::HARMONY_TOOLS;

const END: &str = "<|end|>";
const CALL: &str = "<|call|>";
const RETURN: &str = "<|return|>";

fn frame(header: &str, content: &str, terminator: &str) -> String {
    format!("<|start|>{}<|message|>{}{}", header, content, terminator)
}

fn join_types(schemas: &[Value]) -> String {
    schemas
        .iter()
        .map(typescript_type)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Approximate a JSON schema as a TypeScript type
fn typescript_type(schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
    }
    if let Some(variants) = schema
        .get("anyOf")
        .or_else(|| schema.get("oneOf"))
        .and_then(Value::as_array)
    {
        return join_types(variants);
    }
    match schema.get("type") {
        Some(Value::String(kind)) => match kind.as_str() {
            "string" => "string".to_string(),
            "number" | "integer" => "number".to_string(),
            "boolean" => "boolean".to_string(),
            "null" => "null".to_string(),
            "array" => match schema.get("items") {
                Some(items) => format!("{}[]", typescript_type(items)),
                None => "any[]".to_string(),
            },
            "object" => match schema.get("properties").and_then(Value::as_object) {
                Some(properties) if !properties.is_empty() => {
                    let required = required_names(schema);
                    let fields = properties
                        .iter()
                        .map(|(name, property)| {
                            let optional = if required.contains(&name.as_str()) { "" } else { "?" };
                            format!("{}{}: {}", name, optional, typescript_type(property))
                        })
                        .collect::<Vec<_>>();
                    format!("{{ {} }}", fields.join(", "))
                }
                _ => "object".to_string(),
            },
            _ => "any".to_string(),
        },
        Some(Value::Array(kinds)) => kinds
            .iter()
            .map(|kind| {
                let schema = Map::from_iter([("type".to_string(), kind.clone())]);
                typescript_type(&Value::Object(schema))
            })
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "any".to_string(),
    }
}

fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// `(_: { ... }) => any`, one commented line per argument
fn function_signature(parameters: &Value) -> String {
    let Some(properties) = parameters
        .get("properties")
        .and_then(Value::as_object)
        .filter(|properties| !properties.is_empty())
    else {
        return "() => any".to_string();
    };

    let required = required_names(parameters);
    let mut lines = vec!["(_: {".to_string()];
    for (name, property) in properties {
        if let Some(description) = property.get("description").and_then(Value::as_str) {
            lines.push(format!("// {}", description));
        }
        let optional = if required.contains(&name.as_str()) { "" } else { "?" };
        let mut line = format!("{}{}: {},", name, optional, typescript_type(property));
        if let Some(default) = property.get("default") {
            line.push_str(&format!(" // default: {}", default));
        }
        lines.push(line);
    }
    lines.push("}) => any".to_string());
    lines.join("\n")
}

#[derive(Serialize)]
struct ToolContext {
    name: String,
    description: String,
    signature: String,
}

fn render_tools(functions: &[FunctionDefinition]) -> MessageResult<String> {
    let functions = functions
        .iter()
        .map(|function| ToolContext {
            name: function.name.clone(),
            description: function.description.clone().unwrap_or_default(),
            signature: function_signature(&function.parameters),
        })
        .collect::<Vec<_>>();
    let rendered = HARMONY_TOOLS.render(&serde_json::json!({ "functions": functions }))?;
    Ok(rendered.trim_end().to_string())
}

/// Render messages as a harmony-format transcript.
///
/// Function definitions are declared in the `functions` namespace of the
/// first developer message, or of a developer message placed after the
/// leading system messages when there is none. A final assistant message at
/// the end of the transcript closes with `<|return|>`.
pub fn messages_to_harmony(
    messages: &[Message],
    functions: &[FunctionDefinition],
) -> MessageResult<String> {
    check_function_names(functions)?;
    let mut tools = if functions.is_empty() {
        None
    } else {
        Some(render_tools(functions)?)
    };
    let has_developer = messages
        .iter()
        .any(|message| message.kind == MessageKind::Developer);

    let mut frames = Vec::with_capacity(messages.len() + 1);
    for (index, message) in messages.iter().enumerate() {
        if !has_developer && message.kind != MessageKind::System {
            if let Some(tools) = tools.take() {
                frames.push(frame("developer", &tools, END));
            }
        }

        let is_last = index + 1 == messages.len();
        let rendered = match message.kind {
            MessageKind::System => frame("system", &message.content, END),
            MessageKind::Developer => {
                let mut content = format!("# Instructions\n\n{}", message.content);
                if let Some(tools) = tools.take() {
                    content.push_str("\n\n");
                    content.push_str(&tools);
                }
                frame("developer", &content, END)
            }
            MessageKind::User => frame("user", &message.content, END),
            MessageKind::Assistant => frame(
                "assistant<|channel|>final",
                &message.content,
                if is_last { RETURN } else { END },
            ),
            MessageKind::Reasoning => frame("assistant<|channel|>analysis", &message.content, END),
            MessageKind::ToolCall => frame(
                &format!(
                    "assistant<|channel|>commentary to=functions.{} <|constrain|>json",
                    message.tool_name.as_deref().unwrap_or_default()
                ),
                message.tool_call_arguments.as_deref().unwrap_or_default(),
                CALL,
            ),
            MessageKind::ToolCallOutput => frame(
                &format!(
                    "functions.{} to=assistant<|channel|>commentary",
                    message.tool_name.as_deref().unwrap_or_default()
                ),
                &message.content,
                END,
            ),
            MessageKind::Generic => {
                let header = match message.channel {
                    Some(channel) => format!("{}<|channel|>{}", message.role, channel),
                    None => message.role.to_string(),
                };
                frame(&header, &message.content, END)
            }
        };
        frames.push(rendered);
    }
    if let Some(tools) = tools {
        frames.push(frame("developer", &tools, END));
    }

    Ok(frames.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use indoc::indoc;
    use serde_json::json;

    fn get_weather() -> FunctionDefinition {
        FunctionDefinition::new(
            "get_current_weather",
            "Gets the current weather in the provided location.",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["celsius", "fahrenheit"],
                        "default": "celsius"
                    }
                },
                "required": ["location"]
            }),
        )
    }

    #[test]
    fn test_function_signature() {
        assert_eq!(
            function_signature(&get_weather().parameters),
            indoc! {r#"
                (_: {
                format?: "celsius" | "fahrenheit", // default: "celsius"
                // The city and state, e.g. San Francisco, CA
                location: string,
                }) => any"#}
        );
        assert_eq!(function_signature(&json!({"type": "object"})), "() => any");
    }

    #[test]
    fn test_typescript_types() {
        assert_eq!(
            typescript_type(&json!({"type": "array", "items": {"type": "integer"}})),
            "number[]"
        );
        assert_eq!(
            typescript_type(&json!({"type": ["string", "null"]})),
            "string | null"
        );
        let object = json!({
            "type": "object",
            "properties": {"a": {"type": "boolean"}},
            "required": ["a"]
        });
        assert_eq!(typescript_type(&object), "{ a: boolean }");
        assert_eq!(typescript_type(&json!({})), "any");
    }

    #[test]
    fn test_conversation_frames() -> Result<()> {
        let messages = vec![
            Message::system("You are ChatGPT."),
            Message::user("What is the weather in Tokyo?"),
            Message::reasoning("Need to use get_current_weather."),
            Message::tool_call("call_1", "get_current_weather", r#"{"location":"Tokyo"}"#)?,
            Message::tool_call_output(
                "call_1",
                "get_current_weather",
                r#"{"location":"Tokyo"}"#,
                r#"{"sunny":true}"#,
            )?,
            Message::assistant("It is sunny."),
        ];
        let harmony = messages_to_harmony(&messages, &[])?;
        assert_eq!(
            harmony,
            concat!(
                "<|start|>system<|message|>You are ChatGPT.<|end|>",
                "<|start|>user<|message|>What is the weather in Tokyo?<|end|>",
                "<|start|>assistant<|channel|>analysis<|message|>Need to use get_current_weather.<|end|>",
                "<|start|>assistant<|channel|>commentary to=functions.get_current_weather <|constrain|>json<|message|>{\"location\":\"Tokyo\"}<|call|>",
                "<|start|>functions.get_current_weather to=assistant<|channel|>commentary<|message|>{\"sunny\":true}<|end|>",
                "<|start|>assistant<|channel|>final<|message|>It is sunny.<|return|>",
            )
        );
        Ok(())
    }

    #[test]
    fn test_tools_go_to_developer_message() -> Result<()> {
        let messages = vec![Message::developer("Answer briefly."), Message::user("hi")];
        let harmony = messages_to_harmony(&messages, &[get_weather()])?;
        assert!(harmony.starts_with(concat!(
            "<|start|>developer<|message|># Instructions\n\nAnswer briefly.\n\n",
            "# Tools\n\n## functions\n\nnamespace functions {\n\n",
            "// Gets the current weather in the provided location.\n",
            "type get_current_weather = (_: {"
        )));
        assert!(harmony.contains("}) => any;\n\n} // namespace functions<|end|><|start|>user"));

        let messages = vec![Message::system("sys"), Message::user("hi")];
        let harmony = messages_to_harmony(&messages, &[get_weather()])?;
        let system_end = harmony.find("<|start|>developer").unwrap();
        let user_start = harmony.find("<|start|>user").unwrap();
        assert!(system_end < user_start);
        assert!(harmony.starts_with("<|start|>system<|message|>sys<|end|>"));
        Ok(())
    }

    #[test]
    fn test_duplicate_functions_rejected() {
        assert!(messages_to_harmony(&[], &[get_weather(), get_weather()]).is_err());
    }
}
