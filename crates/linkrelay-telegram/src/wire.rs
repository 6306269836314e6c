//! Inbound webhook payload.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! Bot API `Update` object is ignored by serde.

use serde::Deserialize;

use linkrelay_core::types::{InboundMessage, MediaAttachment, MediaKind};

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookUpdate {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<WireMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub chat: WireChat,
    #[serde(default)]
    pub from: Option<WireUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Every size Telegram generated, smallest first.
    #[serde(default)]
    pub photo: Vec<FileRef>,
    #[serde(default)]
    pub animation: Option<FileRef>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    #[serde(default)]
    pub voice: Option<FileRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

impl WebhookUpdate {
    /// The message to process, if any.
    ///
    /// Updates without a `message` (edits, callbacks, member changes), messages
    /// without a sender and messages sent by bots all yield `None`.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let msg = self.message?;
        let from = msg.from.as_ref()?;
        if from.is_bot {
            return None;
        }

        Some(InboundMessage {
            chat_id: msg.chat.id,
            user_id: from.id,
            username: from.username.clone(),
            first_name: from.first_name.clone(),
            media: msg.attachment(),
            text: msg.text,
            caption: msg.caption,
        })
    }
}

impl WireMessage {
    /// The attachment to resend. Animations also carry a `document` field, so
    /// they are checked first.
    fn attachment(&self) -> Option<MediaAttachment> {
        let pick = |kind: MediaKind, file: &FileRef| MediaAttachment {
            kind,
            file_id: file.file_id.clone(),
        };

        if let Some(largest) = self.photo.last() {
            return Some(pick(MediaKind::Photo, largest));
        }
        [
            (MediaKind::Animation, &self.animation),
            (MediaKind::Video, &self.video),
            (MediaKind::Document, &self.document),
            (MediaKind::Audio, &self.audio),
            (MediaKind::Voice, &self.voice),
        ]
        .into_iter()
        .find_map(|(kind, file)| file.as_ref().map(|f| pick(kind, f)))
    }
}
