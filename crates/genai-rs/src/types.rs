use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenAiError, Result};

/// Binary payload sent or received inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        serde_json::json!({
            "mimeType": self.mime_type,
            "data": general_purpose::STANDARD.encode(&self.data),
        })
    }

    pub(crate) fn from_json(value: &Value) -> Result<Option<Self>> {
        let data = value.get("data").and_then(Value::as_str).unwrap_or_default();
        if data.is_empty() {
            return Ok(None);
        }
        let bytes = general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| GenAiError::Parse(format!("inline data base64: {e}")))?;
        let mime_type = value
            .get("mimeType")
            .or_else(|| value.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Some(Self {
            mime_type,
            data: bytes,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Inline(InlineData),
    Text(String),
}

/// A single-turn `generateContent` request for image output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

impl ContentRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: Vec::new(),
            aspect_ratio: None,
            image_size: None,
        }
    }

    pub fn inline(mut self, data: InlineData) -> Self {
        self.parts.push(Part::Inline(data));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn image_size(mut self, size: Option<impl Into<String>>) -> Self {
        self.image_size = size.map(Into::into);
        self
    }

    pub(crate) fn to_body(&self) -> Value {
        let parts = self
            .parts
            .iter()
            .map(|part| match part {
                Part::Inline(data) => serde_json::json!({ "inlineData": data.to_json() }),
                Part::Text(text) => serde_json::json!({ "text": text }),
            })
            .collect::<Vec<_>>();

        let mut image_config = serde_json::Map::new();
        if let Some(ratio) = &self.aspect_ratio {
            image_config.insert("aspectRatio".into(), Value::String(ratio.clone()));
        }
        if let Some(size) = &self.image_size {
            image_config.insert("imageSize".into(), Value::String(size.clone()));
        }

        serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "imageConfig": image_config },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentResponse {
    pub parts: Vec<Part>,
}

impl ContentResponse {
    pub(crate) fn from_json(resp: &Value) -> Result<Self> {
        let mut parts = Vec::new();
        let candidates = resp
            .get("candidates")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for candidate in candidates {
            let raw_parts = candidate
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for part in raw_parts {
                let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
                if let Some(inline) = inline {
                    if let Some(data) = InlineData::from_json(inline)? {
                        parts.push(Part::Inline(data));
                    }
                } else if let Some(text) = part.get("text").and_then(Value::as_str) {
                    parts.push(Part::Text(text.to_string()));
                }
            }
        }
        Ok(Self { parts })
    }

    /// First binary part, in response order.
    pub fn first_inline(&self) -> Option<&InlineData> {
        self.parts.iter().find_map(|part| match part {
            Part::Inline(data) => Some(data),
            Part::Text(_) => None,
        })
    }

    /// All text parts joined, or `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let text = self
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Inline(_) => None,
            })
            .collect::<String>();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// A `predictLongRunning` video request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    pub number_of_videos: u32,
    pub resolution: String,
    pub aspect_ratio: String,
    pub image: Option<InlineData>,
}

impl VideoRequest {
    pub(crate) fn to_body(&self) -> Value {
        let mut instance = serde_json::json!({ "prompt": self.prompt });
        if let Some(image) = &self.image {
            instance["image"] = serde_json::json!({ "inlineData": image.to_json() });
        }
        serde_json::json!({
            "instances": [instance],
            "parameters": {
                "numberOfVideos": self.number_of_videos,
                "resolution": self.resolution,
                "aspectRatio": self.aspect_ratio,
            },
        })
    }
}

/// Handle to a long-running video job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub response: Option<Value>,
}

impl Operation {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn from_json(value: Value) -> Result<Self> {
        let op: Operation =
            serde_json::from_value(value).map_err(|e| GenAiError::Parse(e.to_string()))?;
        if op.name.is_empty() {
            return Err(GenAiError::Parse("missing operation name".into()));
        }
        Ok(op)
    }

    /// Error message of a finished, failed operation.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        )
    }

    /// Retrieval locator of the first generated video.
    pub fn video_uri(&self) -> Option<String> {
        let response = self.response.as_ref()?;
        [
            "/generatedVideos/0/video/uri",
            "/generateVideoResponse/generatedSamples/0/video/uri",
            "/generatedVideos/0/uri",
        ]
        .iter()
        .find_map(|pointer| response.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
    }
}
