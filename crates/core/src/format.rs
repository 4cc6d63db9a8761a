//! Display formatting shared by the screens.

use bewell_types::EmailAddress;
use chrono::{DateTime, NaiveDate, Utc};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y, %H:%M").to_string()
}

/// Cuts `text` to at most `max_chars` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// First letter of the display name, uppercased, for the header avatar.
pub fn avatar_initial(display_name: &str) -> Option<String> {
    display_name
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect())
}

/// Display name used when a user has no profile row.
pub fn display_name_from_email(email: &EmailAddress) -> String {
    email.local_part().to_string()
}
