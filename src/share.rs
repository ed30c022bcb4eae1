//! Copy and share payloads for the current verse
use crate::verse::VerseRecord;
use url::Url;

const WHATSAPP_SEND: &str = "https://api.whatsapp.com/send";

/// Text placed on the clipboard and in share messages
///
/// # Example
/// ```
/// use daily_verse::{share::share_text, VerseRecord};
///
/// let verse = VerseRecord::new("Be still", "Ps 46:10", "Rest today.");
/// assert_eq!(share_text(&verse), "Be still — Ps 46:10\n\nRest today.");
/// ```
pub fn share_text(verse: &VerseRecord) -> String {
    format!(
        "{} — {}\n\n{}",
        verse.text, verse.reference, verse.reflection
    )
}

/// WhatsApp "send" link pre-filled with [`share_text`]
pub fn whatsapp_url(verse: &VerseRecord) -> Result<Url, url::ParseError> {
    Url::parse_with_params(WHATSAPP_SEND, &[("text", share_text(verse))])
}
