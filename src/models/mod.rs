use serde::Deserialize;

/// Body of a LINE webhook callback.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    Message {
        reply_token: String,
        source: EventSource,
        message: Message,
    },
    /// follow, unfollow, postback, join, ...
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

impl EventSource {
    /// Identity sessions are keyed on. Group and room chats without user
    /// consent carry no `userId`, so they share the chat's id instead.
    pub fn session_key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.group_id.as_deref())
            .or(self.room_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        id: String,
        text: String,
    },
    Image {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        id: String,
        file_name: String,
        #[serde(default)]
        file_size: Option<u64>,
    },
    /// sticker, location, audio, video, ...
    #[serde(other)]
    Unsupported,
}

/// What the bot answers with. Sent through the messaging client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Image {
        original_url: String,
        preview_url: String,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        Reply::Image {
            original_url: url.clone(),
            preview_url: url,
        }
    }
}
