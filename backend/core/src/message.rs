use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Who authored a message in the conversation log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
}

/// One finalized entry of the conversation log. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Parameters for one streamed turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRequest {
    /// Text sent to the endpoint as the user message.
    pub prompt: String,
    pub session_id: Option<SessionId>,
    pub topic: Option<String>,
    pub reply_id: Option<String>,
}

impl StreamRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_reply_id(mut self, reply_id: impl Into<String>) -> Self {
        self.reply_id = Some(reply_id.into());
        self
    }

    /// Build the JSON body sent on the wire.
    pub fn to_body(&self) -> ChatRequestBody {
        ChatRequestBody {
            user_message: self.prompt.clone(),
            session_id: self.session_id.map(|id| id.to_string()),
            topic: self.topic.clone(),
            rep_id: self.reply_id.clone(),
        }
    }
}

/// Wire body of the chat stream request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_id: Option<String>,
}
