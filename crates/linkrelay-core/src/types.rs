use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kinds the bot can resend. Each maps to one Bot API send method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    Animation,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Document => write!(f, "document"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Voice => write!(f, "voice"),
            MediaKind::Animation => write!(f, "animation"),
        }
    }
}

/// A single attachment carried by an inbound message, referenced by the
/// platform's file id so it can be resent without downloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub file_id: String,
}

/// One chat message handed from webhook ingress to the dispatcher.
///
/// Transient: built from a single webhook delivery, consumed once, never stored.
/// A message is either text-bearing (`text`) or media-bearing (`media` plus an
/// optional `caption`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media: Option<MediaAttachment>,
}

impl InboundMessage {
    pub fn is_media(&self) -> bool {
        self.media.is_some()
    }

    /// Trimmed command text. Only text messages can carry commands.
    pub fn command_text(&self) -> Option<&str> {
        if self.is_media() {
            return None;
        }
        self.text.as_deref().map(str::trim)
    }

    /// The text scanned for links: the caption for media, the body otherwise.
    pub fn link_source(&self) -> Option<&str> {
        if self.is_media() {
            self.caption.as_deref()
        } else {
            self.text.as_deref()
        }
    }

    /// Label used in log lines.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("unknown")
    }
}

/// Whether the original message content survives into the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    Keep,
    #[default]
    Remove,
}

impl fmt::Display for CaptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionMode::Keep => write!(f, "keep"),
            CaptionMode::Remove => write!(f, "remove"),
        }
    }
}

impl std::str::FromStr for CaptionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "keep" => Ok(CaptionMode::Keep),
            "remove" => Ok(CaptionMode::Remove),
            other => Err(format!("unknown caption mode: {}", other)),
        }
    }
}

/// Per-user settings document exactly as stored. `None` means the field was
/// never set or has been deleted; it is not the same as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    pub header: Option<String>,
    pub footer: Option<String>,
    pub caption_mode: Option<CaptionMode>,
}

/// Settings after defaults are applied. This is what the caption composer reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptionSettings {
    pub header: String,
    pub footer: String,
    pub caption_mode: CaptionMode,
}

impl CaptionSettings {
    /// Merge a stored document (or its absence) with the documented defaults:
    /// empty header, empty footer, `CaptionMode::Remove`.
    pub fn resolve(stored: Option<UserSettings>) -> Self {
        let stored = stored.unwrap_or_default();
        Self {
            header: stored.header.unwrap_or_default(),
            footer: stored.footer.unwrap_or_default(),
            caption_mode: stored.caption_mode.unwrap_or_default(),
        }
    }
}

/// Individually settable fields of a [`UserSettings`] document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    Header,
    Footer,
    CaptionMode,
}

impl SettingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingField::Header => "header",
            SettingField::Footer => "footer",
            SettingField::CaptionMode => "caption_mode",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-field write against a settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    Header(String),
    Footer(String),
    CaptionMode(CaptionMode),
}

impl SettingUpdate {
    pub fn field(&self) -> SettingField {
        match self {
            SettingUpdate::Header(_) => SettingField::Header,
            SettingUpdate::Footer(_) => SettingField::Footer,
            SettingUpdate::CaptionMode(_) => SettingField::CaptionMode,
        }
    }

    /// Stored representation of the new value.
    pub fn value(&self) -> String {
        match self {
            SettingUpdate::Header(v) | SettingUpdate::Footer(v) => v.clone(),
            SettingUpdate::CaptionMode(mode) => mode.to_string(),
        }
    }
}

/// Append-only audit entry written after each successful shortening call.
/// Not attributed to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub long_url: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
}

impl LinkRecord {
    pub fn new(long_url: impl Into<String>, short_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            short_url: short_url.into(),
            created_at: Utc::now(),
        }
    }
}
