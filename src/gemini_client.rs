use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::provider::GenerativeProvider;
use crate::types::{ChatMessage, ChatRole, Scene};
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    chat_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded data
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
}

/// Subset of the OpenAPI schema object accepted by `responseSchema`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Schema {
    fn leaf(schema_type: &str, description: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: Some(description.to_string()),
            items: None,
            properties: None,
            required: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
    pub index: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePredictRequest {
    pub instances: Vec<ImageInstance>,
    pub parameters: ImageParameters,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageParameters {
    #[serde(rename = "sampleCount")]
    pub sample_count: u32,
    #[serde(rename = "outputMimeType")]
    pub output_mime_type: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePredictResponse {
    #[serde(default)]
    pub predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePrediction {
    #[serde(rename = "bytesBase64Encoded")]
    pub bytes_base64_encoded: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

impl ImagePredictResponse {
    /// Wrap the first returned image into a JPEG data URI
    pub fn into_data_uri(self) -> Result<String, ProviderError> {
        let encoded = self
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded.filter(|b| !b.is_empty()))
            .ok_or(ProviderError::NoImage)?;

        // Reject payloads that would render as a broken image
        BASE64_STANDARD
            .decode(&encoded)
            .map_err(|e| ProviderError::Malformed(format!("Failed to decode base64 image: {}", e)))?;

        Ok(format!("data:image/jpeg;base64,{}", encoded))
    }
}

/// Prompt sent to the text model for scene extraction
pub fn build_scene_prompt(script: &str) -> String {
    format!(
        r#"
    You are a professional storyboard artist. Analyze the following script and break it down into distinct, visually compelling scenes.
    For each scene, provide a concise description and a detailed, artistic image generation prompt.
    The image prompt should be suitable for a text-to-image model and include details about characters, setting, lighting, camera angle, and mood.
    Return the output as a JSON array.

    SCRIPT:
    ---
    {}
    ---
  "#,
        script
    )
}

/// Response schema: an array of scene records, all fields required
pub fn scene_schema() -> Schema {
    let mut properties = BTreeMap::new();
    properties.insert(
        "sceneNumber".to_string(),
        Schema::leaf("INTEGER", "The sequential number of the scene."),
    );
    properties.insert(
        "description".to_string(),
        Schema::leaf(
            "STRING",
            "A short description of the action and dialogue in the scene.",
        ),
    );
    properties.insert(
        "imagePrompt".to_string(),
        Schema::leaf(
            "STRING",
            "A detailed prompt for an image generation model. Include style hints like 'cinematic, dramatic lighting, 4k'.",
        ),
    );

    Schema {
        schema_type: "ARRAY".to_string(),
        description: None,
        items: Some(Box::new(Schema {
            schema_type: "OBJECT".to_string(),
            description: None,
            items: None,
            properties: Some(properties),
            required: Some(vec![
                "sceneNumber".to_string(),
                "description".to_string(),
                "imagePrompt".to_string(),
            ]),
        })),
        properties: None,
        required: None,
    }
}

/// Parse the model's JSON text into scenes; anything but an array of scene records fails
pub fn parse_scenes(text: &str) -> Result<Vec<Scene>, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    if !value.is_array() {
        return Err(ProviderError::Malformed(
            "Response is not a JSON array.".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

fn to_content(message: &ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    };
    Content {
        parts: message
            .parts
            .iter()
            .map(|p| Part::Text { text: p.text.clone() })
            .collect(),
        role: Some(role.to_string()),
    }
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        request: &Req,
    ) -> Result<Resp, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        tracing::debug!(
            "Gemini API response (truncated): {}...",
            response_text.chars().take(500).collect::<String>()
        );

        serde_json::from_str::<Resp>(&response_text).map_err(|parse_error| {
            tracing::error!("Failed to parse Gemini response: {}", parse_error);
            ProviderError::Json(parse_error)
        })
    }

    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        tracing::debug!(
            model = %model,
            contents = request.contents.len(),
            "Gemini generateContent request"
        );
        let url = self.endpoint(model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, request).await?;

        if let Some(usage) = &response.usage_metadata {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count,
                completion_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Gemini token usage"
            );
        }
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!("Gemini blocked the prompt: {}", reason);
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn extract_scenes(&self, script: &str) -> Result<Vec<Scene>, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: build_scene_prompt(script),
                }],
                role: Some("user".to_string()),
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(scene_schema()),
            }),
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        let text = response.text().unwrap_or_default();
        parse_scenes(&text).map_err(|e| {
            tracing::error!("Failed to parse Gemini response as JSON: {}", text);
            e
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ImagePredictRequest {
            instances: vec![ImageInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
                aspect_ratio: "16:9".to_string(),
            },
        };

        let url = self.endpoint(&self.image_model, "predict");
        let response: ImagePredictResponse = self.post_json(&url, &request).await?;
        response.into_data_uri()
    }

    async fn chat_reply(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, ProviderError> {
        let mut contents: Vec<Content> = history.iter().map(to_content).collect();
        contents.push(to_content(&ChatMessage::user(message)));

        let request = GenerateContentRequest {
            contents,
            generation_config: None,
        };
        let response = self.generate_content(&self.chat_model, &request).await?;
        response.text().ok_or(ProviderError::EmptyReply)
    }
}
