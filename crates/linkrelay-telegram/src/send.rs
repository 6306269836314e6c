//! Outbound delivery through the Telegram Bot API.
//!
//! Text messages are capped at 4096 characters by Telegram; we use 4090.
//! Media captions are capped at 1024. Replies are sent as plain text so user
//! headers and URLs never trip a parse mode.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::RequestError;
use tracing::{debug, warn};

use linkrelay_core::config::TelegramConfig;
use linkrelay_core::types::{MediaAttachment, MediaKind};
use linkrelay_pipeline::{DeliveryError, Messenger};

use crate::error::TelegramError;

/// Maximum bytes per text message (limit is 4096 characters; 4090 bytes is always under it).
const CHUNK_MAX: usize = 4090;

/// Maximum characters in a media caption.
const CAPTION_MAX: usize = 1024;

/// Split `text` into chunks of at most [`CHUNK_MAX`] bytes, preferring line
/// boundaries and then spaces. Never splits inside a UTF-8 character.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let cost = if current.is_empty() {
            line.len()
        } else {
            1 + line.len()
        };

        if !current.is_empty() && current.len() + cost > CHUNK_MAX {
            chunks.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    // A single line longer than CHUNK_MAX still needs a hard split.
    let mut result = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if chunk.len() <= CHUNK_MAX {
            result.push(chunk);
            continue;
        }
        let mut remaining = chunk.as_str();
        while remaining.len() > CHUNK_MAX {
            let window = &remaining[..floor_char_boundary(remaining, CHUNK_MAX)];
            match window.rfind(' ').filter(|&i| i > 0) {
                // The separating space is consumed; any other whitespace is kept.
                Some(space) => {
                    result.push(remaining[..space].to_string());
                    remaining = &remaining[space + 1..];
                }
                None => {
                    result.push(window.to_string());
                    remaining = &remaining[window.len()..];
                }
            }
        }
        if !remaining.is_empty() {
            result.push(remaining.to_string());
        }
    }

    result
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut i = max.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Bot API client implementing the pipeline's [`Messenger`] port.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    timeout_secs: u64,
}

impl TelegramMessenger {
    /// Build a bot whose every request is bounded by `reply_timeout_secs`.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }

        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(config.reply_timeout_secs))
            .build()
            .map_err(|e| TelegramError::Client(e.to_string()))?;
        let mut bot = Bot::with_client(&config.bot_token, client);

        if let Some(url) = config.api_url.as_deref() {
            let parsed = reqwest::Url::parse(url).map_err(|e| TelegramError::InvalidApiUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            bot = bot.set_api_url(parsed);
        }

        Ok(Self {
            bot,
            timeout_secs: config.reply_timeout_secs,
        })
    }

    fn map_err(&self, e: RequestError) -> DeliveryError {
        match e {
            RequestError::Network(ref inner) if inner.is_timeout() => DeliveryError::Timeout {
                secs: self.timeout_secs,
            },
            other => DeliveryError::SendFailed(other.to_string()),
        }
    }

    async fn resend(
        &self,
        chat_id: ChatId,
        media: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<(), RequestError> {
        let file = InputFile::file_id(media.file_id.clone());

        macro_rules! send_with_caption {
            ($request:expr) => {{
                let request = $request;
                match caption {
                    Some(c) => request.caption(c).await.map(drop),
                    None => request.await.map(drop),
                }
            }};
        }

        match media.kind {
            MediaKind::Photo => send_with_caption!(self.bot.send_photo(chat_id, file)),
            MediaKind::Video => send_with_caption!(self.bot.send_video(chat_id, file)),
            MediaKind::Document => send_with_caption!(self.bot.send_document(chat_id, file)),
            MediaKind::Audio => send_with_caption!(self.bot.send_audio(chat_id, file)),
            MediaKind::Voice => send_with_caption!(self.bot.send_voice(chat_id, file)),
            MediaKind::Animation => send_with_caption!(self.bot.send_animation(chat_id, file)),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let chunks = split_chunks(text);
        for (i, chunk) in chunks.iter().enumerate() {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| self.map_err(e))?;

            if i + 1 < chunks.len() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        debug!(chat_id, chunks = chunks.len(), "text sent");
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media: &MediaAttachment,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let overflow = caption.filter(|c| c.chars().count() > CAPTION_MAX);
        if overflow.is_some() {
            warn!(
                chat_id,
                kind = %media.kind,
                "caption too long; sending it as a separate message"
            );
        }
        let inline = if overflow.is_some() { None } else { caption };

        self.resend(ChatId(chat_id), media, inline)
            .await
            .map_err(|e| self.map_err(e))?;

        if let Some(text) = overflow {
            self.send_text(chat_id, text).await?;
        }
        Ok(())
    }
}
