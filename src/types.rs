// types.rs - Common data structures shared by the storyboard and chat modules
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker stored in place of an image when generation failed for a scene
pub const IMAGE_ERROR_SENTINEL: &str = "error";

// One narrative unit extracted from a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub scene_number: i64,
    pub description: String,
    pub image_prompt: String,
}

/// Image slot of a storyboard item.
///
/// On the wire this is `null` while pending, the string `"error"` when the
/// scene's image call failed, and the data URI otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageUrl {
    #[default]
    Pending,
    Failed,
    Ready(String),
}

impl ImageUrl {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ImageUrl::Pending)
    }

    pub fn as_data_uri(&self) -> Option<&str> {
        match self {
            ImageUrl::Ready(uri) => Some(uri.as_str()),
            _ => None,
        }
    }
}

impl Serialize for ImageUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ImageUrl::Pending => serializer.serialize_none(),
            ImageUrl::Failed => serializer.serialize_str(IMAGE_ERROR_SENTINEL),
            ImageUrl::Ready(uri) => serializer.serialize_str(uri),
        }
    }
}

impl<'de> Deserialize<'de> for ImageUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => ImageUrl::Pending,
            Some(s) if s == IMAGE_ERROR_SENTINEL => ImageUrl::Failed,
            Some(s) => ImageUrl::Ready(s),
        })
    }
}

// A scene paired with its (possibly not yet available) illustration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardItem {
    pub scene: Scene,
    pub image_url: ImageUrl,
    pub is_loading: bool,
}

impl StoryboardItem {
    /// Placeholder shown right after extraction, before any image settles
    pub fn placeholder(scene: Scene) -> Self {
        Self {
            scene,
            image_url: ImageUrl::Pending,
            is_loading: true,
        }
    }
}

/// Settled outcome of one scene's image call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneImage {
    pub scene_number: i64,
    pub image_url: ImageUrl,
}

// Chat roles follow Gemini naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub parts: Vec<ChatPart>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            parts: vec![ChatPart { text: text.into() }],
        }
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("")
    }
}
