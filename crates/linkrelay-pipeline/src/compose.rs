use linkrelay_core::types::{CaptionMode, CaptionSettings};

/// Build the outgoing text from shortened links, the original text/caption
/// and the user's settings.
///
/// - `Remove`: header, one shortened link per line, footer.
/// - `Keep`: header, trimmed original text, footer. Shortened links are not
///   included in this mode.
///
/// Empty parts are skipped; the rest are joined with `\n`.
pub fn compose(shortened: &[String], original: Option<&str>, settings: &CaptionSettings) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(shortened.len() + 2);

    if !settings.header.is_empty() {
        parts.push(&settings.header);
    }

    match settings.caption_mode {
        CaptionMode::Remove => parts.extend(shortened.iter().map(String::as_str)),
        CaptionMode::Keep => {
            let original = original.map(str::trim).unwrap_or("");
            if !original.is_empty() {
                parts.push(original);
            }
        }
    }

    if !settings.footer.is_empty() {
        parts.push(&settings.footer);
    }

    parts.join("\n")
}
