use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Separator between content blocks inside a flattened message content
pub const BLOCK_SEPARATOR: &str = "\n\n";

lazy_static! {
    static ref DATA_URL_RE: Regex = Regex::new(
        r"(?s)^data:(?P<mime>[\w.+-]+/[\w.+-]+)?(?P<params>(?:;[\w.+-]+=[^;,]*)*)(?P<b64>;base64)?,(?P<data>.*)$"
    )
    .unwrap();
    static ref IMAGE_URL_BLOCK_RE: Regex =
        Regex::new(r"^\[image_url\]\((?P<value>\S+)\)$").unwrap();
    static ref IMAGE_ID_BLOCK_RE: Regex = Regex::new(r"^\[image_id\]\((?P<value>\S+)\)$").unwrap();
}

/// An RFC 2397 `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Empty when the URL omitted it, which means `text/plain`
    pub mime_type: String,
    /// Raw `;key=value` parameters, without the leading `;`
    pub parameters: Vec<String>,
    pub base64: bool,
    pub data: String,
}

impl DataUrl {
    pub fn parse(value: &str) -> Option<Self> {
        let captures = DATA_URL_RE.captures(value)?;
        let parameters = captures
            .name("params")
            .map(|m| {
                m.as_str()
                    .split(';')
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            mime_type: captures
                .name("mime")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            parameters,
            base64: captures.name("b64").is_some(),
            data: captures["data"].to_string(),
        })
    }

    /// Encode raw bytes as a base64 data URL
    pub fn from_bytes<T: AsRef<[u8]>, M: Into<String>>(bytes: T, mime_type: M) -> Self {
        Self {
            mime_type: mime_type.into(),
            parameters: Vec::new(),
            base64: true,
            data: STANDARD.encode(bytes.as_ref()),
        }
    }

    /// Wrap already base64-encoded audio in a data URL tagged with its format
    pub fn from_audio_base64<S: Into<String>>(data: S, format: &str) -> Self {
        Self {
            mime_type: format!("audio/{}", format),
            parameters: Vec::new(),
            base64: true,
            data: data.into(),
        }
    }

    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        if self.base64 {
            STANDARD.decode(self.data.as_bytes()).ok()
        } else {
            Some(self.data.as_bytes().to_vec())
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// The audio format tag providers expect, e.g. `wav` or `mp3`
    pub fn audio_format(&self) -> Option<String> {
        let subtype = self.mime_type.strip_prefix("audio/")?;
        let format = match subtype {
            "wav" | "x-wav" | "wave" | "vnd.wave" => "wav",
            "mpeg" | "mp3" | "mpeg3" | "x-mpeg-3" => "mp3",
            other => other,
        };
        Some(format.to_string())
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{}", self.mime_type)?;
        for parameter in &self.parameters {
            write!(f, ";{}", parameter)?;
        }
        if self.base64 {
            write!(f, ";base64")?;
        }
        write!(f, ",{}", self.data)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentPartType {
    Text,
    ImageUrl,
    ImageId,
    Audio,
    DataUrl,
}

/// One typed fragment of a message payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: ContentPartType,
    pub value: String,
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            kind: ContentPartType::Text,
            value: text.into(),
        }
    }

    /// An image by http(s) URL or image data URL
    pub fn image_url<S: Into<String>>(url: S) -> Self {
        Self {
            kind: ContentPartType::ImageUrl,
            value: url.into(),
        }
    }

    /// An image by opaque provider file id
    pub fn image_id<S: Into<String>>(id: S) -> Self {
        Self {
            kind: ContentPartType::ImageId,
            value: id.into(),
        }
    }

    /// An audio data URL, its MIME type normalised to `audio/<format tag>`
    pub fn audio(data_url: &DataUrl) -> Self {
        let mut data_url = data_url.clone();
        if let Some(format) = data_url.audio_format() {
            data_url.mime_type = format!("audio/{}", format);
        }
        Self {
            kind: ContentPartType::Audio,
            value: data_url.to_string(),
        }
    }

    pub fn data_url(data_url: &DataUrl) -> Self {
        Self {
            kind: ContentPartType::DataUrl,
            value: data_url.to_string(),
        }
    }

    /// Classify an arbitrary data URL by its MIME type
    pub fn from_data_url(data_url: &DataUrl) -> Self {
        if data_url.is_image() {
            Self::image_url(data_url.to_string())
        } else if data_url.is_audio() {
            Self::audio(data_url)
        } else {
            Self::data_url(data_url)
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == ContentPartType::Text
    }

    /// Base64 payload and format tag of an audio part
    pub fn audio_payload(&self) -> Option<(String, String)> {
        if self.kind != ContentPartType::Audio {
            return None;
        }
        let data_url = DataUrl::parse(&self.value)?;
        let format = data_url.audio_format()?;
        let data = if data_url.base64 {
            data_url.data
        } else {
            STANDARD.encode(data_url.data.as_bytes())
        };
        Some((data, format))
    }

    /// Render this part as one block of flattened message content
    pub fn to_block(&self) -> String {
        match self.kind {
            ContentPartType::Text | ContentPartType::Audio | ContentPartType::DataUrl => {
                self.value.clone()
            }
            ContentPartType::ImageUrl => {
                if DataUrl::parse(&self.value).is_some() {
                    self.value.clone()
                } else {
                    format!("[image_url]({})", self.value)
                }
            }
            ContentPartType::ImageId => format!("[image_id]({})", self.value),
        }
    }

    /// Recognise a non-text block; plain text yields `None`
    fn from_block(block: &str) -> Option<Self> {
        let block = block.trim();
        if let Some(data_url) = DataUrl::parse(block) {
            return Some(Self::from_data_url(&data_url));
        }
        if let Some(captures) = IMAGE_URL_BLOCK_RE.captures(block) {
            return Some(Self::image_url(&captures["value"]));
        }
        IMAGE_ID_BLOCK_RE
            .captures(block)
            .map(|captures| Self::image_id(&captures["value"]))
    }
}

/// Join parts into one content string, blocks separated by a blank line
pub fn join_parts(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .map(ContentPart::to_block)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Split flattened content back into its ordered parts
pub fn content_parts_from_str(content: &str) -> Vec<ContentPart> {
    if content.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut text_blocks: Vec<&str> = Vec::new();

    for block in content.split(BLOCK_SEPARATOR) {
        match ContentPart::from_block(block) {
            Some(part) => {
                if !text_blocks.is_empty() {
                    parts.push(ContentPart::text(text_blocks.join(BLOCK_SEPARATOR)));
                    text_blocks.clear();
                }
                parts.push(part);
            }
            None => text_blocks.push(block),
        }
    }
    if !text_blocks.is_empty() {
        parts.push(ContentPart::text(text_blocks.join(BLOCK_SEPARATOR)));
    }

    parts
}
