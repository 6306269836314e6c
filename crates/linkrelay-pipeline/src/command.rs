//! Command parsing: one pass from message text to a [`Command`].
//!
//! Checked in order, first match wins:
//!   `/start` (prefix)        — usage text
//!   `/myid` (prefix)         — show the caller's user id
//!   `/set_api <key>`         — store the shortening API key
//!     (argument separated by whitespace; an `@botname` suffix is ignored)
//!   `/set_header <text>`     — text placed above the reply
//!   `/set_footer <text>`     — text placed below the reply
//!   `/delete_header`, `/delete_footer` (exact)
//!   `/keep`, `/remove` (exact) — caption mode
//! Anything else (including every media message) takes the link path.

use linkrelay_core::types::CaptionMode;

/// Commands whose required argument was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    SetApi,
    SetHeader,
    SetFooter,
}

impl Usage {
    pub fn text(&self) -> &'static str {
        match self {
            Usage::SetApi => "⚠️ Usage: /set_api <your_api_key>",
            Usage::SetHeader => "⚠️ Usage: /set_header <text>",
            Usage::SetFooter => "⚠️ Usage: /set_footer <text>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    MyId,
    SetApiKey(String),
    SetHeader(String),
    SetFooter(String),
    DeleteHeader,
    DeleteFooter,
    SetCaptionMode(CaptionMode),
    /// A recognised command with its argument missing.
    Malformed(Usage),
    /// Not a command: extract and shorten links.
    Links,
}

impl Command {
    /// Parse trimmed message text. `None` (media messages) is always `Links`.
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text.map(str::trim) else {
            return Command::Links;
        };

        if text.starts_with("/start") {
            return Command::Start;
        }
        if text.starts_with("/myid") {
            return Command::MyId;
        }
        // `/cmd@botname rest`: the mention is dropped, the rest is the argument.
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let name = head.split_once('@').map_or(head, |(name, _)| name);

        match (name, rest) {
            ("/set_api", rest) => with_argument(rest, Usage::SetApi, Command::SetApiKey),
            ("/set_header", rest) => with_argument(rest, Usage::SetHeader, Command::SetHeader),
            ("/set_footer", rest) => with_argument(rest, Usage::SetFooter, Command::SetFooter),
            ("/delete_header", "") => Command::DeleteHeader,
            ("/delete_footer", "") => Command::DeleteFooter,
            ("/keep", "") => Command::SetCaptionMode(CaptionMode::Keep),
            ("/remove", "") => Command::SetCaptionMode(CaptionMode::Remove),
            _ => Command::Links,
        }
    }
}

fn with_argument(arg: &str, usage: Usage, build: fn(String) -> Command) -> Command {
    if arg.is_empty() {
        Command::Malformed(usage)
    } else {
        build(arg.to_string())
    }
}
