use crate::errors::{MessageError, MessageResult};
use crate::models::content::{join_parts, ContentPart, DataUrl, BLOCK_SEPARATOR};
use crate::wire::chat::{ChatContentPart, ChatMessageContent, FileData};
use crate::wire::responses::{EasyInputContent, FunctionCallOutputContent, ResponseContent};

const OCTET_STREAM: &str = "application/octet-stream";

fn file_part(file_data: Option<&str>, file_id: Option<&str>) -> Option<ContentPart> {
    if let Some(data) = file_data {
        let data_url = DataUrl::parse(data).unwrap_or_else(|| DataUrl {
            mime_type: OCTET_STREAM.to_string(),
            parameters: Vec::new(),
            base64: true,
            data: data.to_string(),
        });
        return Some(ContentPart::from_data_url(&data_url));
    }
    file_id.map(ContentPart::image_id)
}

pub fn chat_part_to_content_part(part: &ChatContentPart) -> MessageResult<ContentPart> {
    match part {
        ChatContentPart::Text { text } => Ok(ContentPart::text(text)),
        ChatContentPart::Refusal { refusal } => Ok(ContentPart::text(refusal)),
        ChatContentPart::ImageUrl { image_url } => Ok(ContentPart::image_url(&image_url.url)),
        ChatContentPart::InputAudio { input_audio } => Ok(ContentPart::audio(
            &DataUrl::from_audio_base64(&input_audio.data, &input_audio.format),
        )),
        ChatContentPart::File {
            file: FileData {
                file_id, file_data, ..
            },
        } => file_part(file_data.as_deref(), file_id.as_deref()).ok_or_else(|| {
            MessageError::UnsupportedVariant("file part without file_id or file_data".to_string())
        }),
    }
}

/// Canonical content string of a chat message's content
pub fn chat_content_to_str(content: &ChatMessageContent) -> MessageResult<String> {
    match content {
        ChatMessageContent::Text(text) => Ok(text.clone()),
        ChatMessageContent::Parts(parts) => {
            let parts = parts
                .iter()
                .map(chat_part_to_content_part)
                .collect::<MessageResult<Vec<_>>>()?;
            Ok(join_parts(&parts))
        }
    }
}

pub fn response_part_to_content_part(part: &ResponseContent) -> MessageResult<ContentPart> {
    match part {
        ResponseContent::InputText { text } | ResponseContent::OutputText { text, .. } => {
            Ok(ContentPart::text(text))
        }
        ResponseContent::Refusal { refusal } => Ok(ContentPart::text(refusal)),
        ResponseContent::InputImage {
            image_url, file_id, ..
        } => match (image_url, file_id) {
            (Some(url), _) => Ok(ContentPart::image_url(url)),
            (None, Some(id)) => Ok(ContentPart::image_id(id)),
            (None, None) => Err(MessageError::UnsupportedVariant(
                "input_image without image_url or file_id".to_string(),
            )),
        },
        ResponseContent::InputAudio { input_audio } => Ok(ContentPart::audio(
            &DataUrl::from_audio_base64(&input_audio.data, &input_audio.format),
        )),
        ResponseContent::InputFile {
            file_id,
            file_data,
            file_url,
            ..
        } => file_part(file_data.as_deref(), file_id.as_deref()).ok_or_else(|| {
            MessageError::UnsupportedVariant(format!(
                "input_file by url is not supported: {}",
                file_url.as_deref().unwrap_or_default()
            ))
        }),
    }
}

pub fn response_parts_to_str(parts: &[ResponseContent]) -> MessageResult<String> {
    let parts = parts
        .iter()
        .map(response_part_to_content_part)
        .collect::<MessageResult<Vec<_>>>()?;
    Ok(join_parts(&parts))
}

pub fn easy_content_to_str(content: &EasyInputContent) -> MessageResult<String> {
    match content {
        EasyInputContent::Text(text) => Ok(text.clone()),
        EasyInputContent::Parts(parts) => response_parts_to_str(parts),
    }
}

pub fn function_output_to_str(output: &FunctionCallOutputContent) -> MessageResult<String> {
    match output {
        FunctionCallOutputContent::Text(text) => Ok(text.clone()),
        FunctionCallOutputContent::Parts(parts) => response_parts_to_str(parts),
    }
}

/// Text of assistant output parts, one block per part
pub fn output_text_to_str(parts: &[ResponseContent]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            ResponseContent::OutputText { text, .. } | ResponseContent::InputText { text } => {
                Some(text.as_str())
            }
            ResponseContent::Refusal { refusal } => Some(refusal.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
