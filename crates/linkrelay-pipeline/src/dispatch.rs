//! Per-message dispatcher.
//!
//! Stateless between calls: every decision depends on the message itself and
//! on what the settings store returns right now. Nothing in here returns an
//! error; storage, shortening and delivery failures are logged and folded
//! into the returned [`Outcome`].

use tracing::{debug, info, warn};

use linkrelay_core::types::{
    CaptionMode, CaptionSettings, InboundMessage, LinkRecord, MediaAttachment, SettingField,
    SettingUpdate,
};

use crate::command::{Command, Usage};
use crate::compose::compose;
use crate::context::PipelineContext;
use crate::extract::extract_urls;

const CONFIG_REQUIRED: &str =
    "⚠️ No API key configured yet.\n\nSet yours with /set_api <your_api_key> and send the link again.";
const ALL_FAILED: &str = "❌ Could not shorten the link(s). Please try again.";
const SAVE_FAILED: &str = "❌ Could not save your settings. Please try again.";

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `/start`: usage text sent.
    Help,
    /// `/myid`: user id sent.
    ShowedId,
    /// A configuration command was stored.
    Saved(SettingChange),
    /// A configuration command could not be stored; the user was told.
    SaveFailed(SettingChange),
    /// A command was missing its argument; usage text sent.
    Usage(Usage),
    /// Link path without a stored API key; no shortening attempted.
    ConfigurationRequired,
    /// Link path, but the text had no links (or the message carried neither
    /// text nor media). Nothing sent.
    NoLinks,
    /// Media without links, resent with only the user's header and footer.
    Decorated,
    /// Every link failed to shorten; one notice sent.
    AllFailed { attempted: usize },
    /// Reply composed and handed to the messenger.
    Delivered { shortened: usize, failed: usize },
    /// Links were shortened but the composed reply was empty.
    NothingToSend,
}

/// Which piece of configuration a command touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    ApiKey,
    Set(SettingField),
    Unset(SettingField),
}

/// Route one message: run a configuration command or shorten its links.
pub async fn process_message<C: PipelineContext + ?Sized>(
    ctx: &C,
    msg: &InboundMessage,
) -> Outcome {
    let command = Command::parse(msg.command_text());
    debug!(user_id = msg.user_id, chat_id = msg.chat_id, ?command, "dispatching");

    match command {
        Command::Start => {
            reply(ctx, msg, &help_text(msg)).await;
            Outcome::Help
        }
        Command::MyId => {
            reply(ctx, msg, &format!("Your User ID: {}", msg.user_id)).await;
            Outcome::ShowedId
        }
        Command::SetApiKey(key) => {
            let result = ctx.settings().set_api_key(msg.user_id, &key).await;
            confirm(
                ctx,
                msg,
                SettingChange::ApiKey,
                result,
                "✅ API key saved.",
            )
            .await
        }
        Command::SetHeader(text) => {
            let result = ctx
                .settings()
                .set_field(msg.user_id, &SettingUpdate::Header(text))
                .await;
            confirm(
                ctx,
                msg,
                SettingChange::Set(SettingField::Header),
                result,
                "✅ Header saved.",
            )
            .await
        }
        Command::SetFooter(text) => {
            let result = ctx
                .settings()
                .set_field(msg.user_id, &SettingUpdate::Footer(text))
                .await;
            confirm(
                ctx,
                msg,
                SettingChange::Set(SettingField::Footer),
                result,
                "✅ Footer saved.",
            )
            .await
        }
        Command::DeleteHeader => {
            let result = ctx.settings().unset_field(msg.user_id, SettingField::Header).await;
            confirm(
                ctx,
                msg,
                SettingChange::Unset(SettingField::Header),
                result,
                "🗑 Header removed.",
            )
            .await
        }
        Command::DeleteFooter => {
            let result = ctx.settings().unset_field(msg.user_id, SettingField::Footer).await;
            confirm(
                ctx,
                msg,
                SettingChange::Unset(SettingField::Footer),
                result,
                "🗑 Footer removed.",
            )
            .await
        }
        Command::SetCaptionMode(mode) => {
            let result = ctx
                .settings()
                .set_field(msg.user_id, &SettingUpdate::CaptionMode(mode))
                .await;
            let ack = match mode {
                CaptionMode::Keep => "✅ Original caption will be kept.",
                CaptionMode::Remove => "✅ Original caption will be replaced by the short links.",
            };
            confirm(
                ctx,
                msg,
                SettingChange::Set(SettingField::CaptionMode),
                result,
                ack,
            )
            .await
        }
        Command::Malformed(usage) => {
            reply(ctx, msg, usage.text()).await;
            Outcome::Usage(usage)
        }
        Command::Links => shorten_links(ctx, msg).await,
    }
}

/// Default path: shorten every link in the text (or caption) and reply.
async fn shorten_links<C: PipelineContext + ?Sized>(ctx: &C, msg: &InboundMessage) -> Outcome {
    // Stickers, locations and service messages: nothing to act on.
    if !msg.is_media() && msg.text.is_none() {
        debug!(user_id = msg.user_id, "message has neither text nor media; ignoring");
        return Outcome::NoLinks;
    }

    let Some(api_key) = ctx.settings().get_api_key(msg.user_id).await else {
        info!(user_id = msg.user_id, "no api key stored; asking user to configure");
        reply(ctx, msg, CONFIG_REQUIRED).await;
        return Outcome::ConfigurationRequired;
    };

    let settings = ctx.settings().get_settings(msg.user_id).await;

    let urls = extract_urls(msg.link_source().unwrap_or(""));
    if urls.is_empty() {
        if let Some(media) = &msg.media {
            if !settings.header.is_empty() || !settings.footer.is_empty() {
                return decorate(ctx, msg, media, &settings).await;
            }
        }
        debug!(user_id = msg.user_id, "no links in message; ignoring");
        return Outcome::NoLinks;
    }

    let mut shortened = Vec::with_capacity(urls.len());
    for url in &urls {
        match ctx.shortener().shorten(url, &api_key).await {
            Ok(short) => {
                let record = LinkRecord::new(url.as_str(), short.as_str());
                if let Err(e) = ctx.links().record(&record).await {
                    warn!(url = %url, error = %e, "failed to record shortened link");
                }
                shortened.push(short);
            }
            Err(e) => {
                warn!(user_id = msg.user_id, url = %url, error = %e, "shortening failed");
            }
        }
    }

    let failed = urls.len() - shortened.len();
    if shortened.is_empty() {
        reply(ctx, msg, ALL_FAILED).await;
        return Outcome::AllFailed {
            attempted: urls.len(),
        };
    }

    let text = compose(&shortened, msg.link_source(), &settings);

    match &msg.media {
        Some(media) => {
            let caption = (!text.is_empty()).then_some(text.as_str());
            if let Err(e) = ctx.messenger().send_media(msg.chat_id, media, caption).await {
                warn!(
                    chat_id = msg.chat_id,
                    kind = %media.kind,
                    error = %e,
                    "failed to resend media"
                );
            }
        }
        None => {
            if text.is_empty() {
                return Outcome::NothingToSend;
            }
            reply(ctx, msg, &text).await;
        }
    }

    info!(
        user = msg.display_name(),
        user_id = msg.user_id,
        shortened = shortened.len(),
        failed,
        "links shortened"
    );
    Outcome::Delivered {
        shortened: shortened.len(),
        failed,
    }
}

/// Resend link-less media wrapped in the user's header and footer.
async fn decorate<C: PipelineContext + ?Sized>(
    ctx: &C,
    msg: &InboundMessage,
    media: &MediaAttachment,
    settings: &CaptionSettings,
) -> Outcome {
    let caption = compose(&[], msg.link_source(), settings);
    if let Err(e) = ctx
        .messenger()
        .send_media(msg.chat_id, media, Some(&caption))
        .await
    {
        warn!(chat_id = msg.chat_id, kind = %media.kind, error = %e, "failed to resend media");
    }
    debug!(user_id = msg.user_id, "media without links decorated");
    Outcome::Decorated
}

async fn confirm<C: PipelineContext + ?Sized>(
    ctx: &C,
    msg: &InboundMessage,
    change: SettingChange,
    result: linkrelay_core::Result<()>,
    ack: &str,
) -> Outcome {
    match result {
        Ok(()) => {
            info!(user_id = msg.user_id, ?change, "settings updated");
            reply(ctx, msg, ack).await;
            Outcome::Saved(change)
        }
        Err(e) => {
            warn!(user_id = msg.user_id, ?change, error = %e, "settings write failed");
            reply(ctx, msg, SAVE_FAILED).await;
            Outcome::SaveFailed(change)
        }
    }
}

async fn reply<C: PipelineContext + ?Sized>(ctx: &C, msg: &InboundMessage, text: &str) {
    if let Err(e) = ctx.messenger().send_text(msg.chat_id, text).await {
        warn!(chat_id = msg.chat_id, error = %e, "failed to send reply");
    }
}

fn help_text(msg: &InboundMessage) -> String {
    let name = msg.first_name.as_deref().unwrap_or("there");
    format!(
        "👋 Welcome {name}!\n\n\
         🔗 Send me any link to shorten.\n\
         📷 You can also send media with links in the caption.\n\n\
         Commands:\n\
         /set_api <key> — save your shortener API key\n\
         /set_header <text> — text shown above your links\n\
         /set_footer <text> — text shown below your links\n\
         /delete_header — remove the header\n\
         /delete_footer — remove the footer\n\
         /keep — keep the original caption\n\
         /remove — replace the caption with the short links\n\
         /myid — show your user ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_text_greets_by_first_name() {
        let msg = InboundMessage {
            first_name: Some("Asha".into()),
            ..Default::default()
        };
        assert!(help_text(&msg).starts_with("👋 Welcome Asha!"));
        assert!(help_text(&InboundMessage::default()).starts_with("👋 Welcome there!"));
    }

    #[test]
    fn help_text_lists_every_command() {
        let help = help_text(&InboundMessage::default());
        for cmd in [
            "/set_api",
            "/set_header",
            "/set_footer",
            "/delete_header",
            "/delete_footer",
            "/keep",
            "/remove",
            "/myid",
        ] {
            assert!(help.contains(cmd), "missing {cmd}");
        }
    }
}
