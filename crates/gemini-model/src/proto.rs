use serde::{Deserialize, Serialize};
use verdant_model::{ModelMessage, ModelRequest};

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData")]
    InlineData(InlineData),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: ResponseContent,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
    }
}

#[inline]
fn create_content(msg: &ModelMessage) -> Content {
    match msg {
        ModelMessage::User { text, image } => {
            let mut parts = Vec::new();
            // The image goes first, matching the order the model was
            // prompted with when the conversation was opened.
            if let Some(image) = image {
                parts.push(Part::InlineData(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }));
            }
            parts.push(Part::Text(text.clone()));
            Content {
                role: "user",
                parts,
            }
        }
        ModelMessage::Assistant(text) => Content {
            role: "model",
            parts: vec![Part::Text(text.clone())],
        },
    }
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn reply_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let mut text = String::new();
        for part in &candidate.content.parts {
            if let Some(part_text) = &part.text {
                text.push_str(part_text);
            }
        }
        Some(text)
    }
}
