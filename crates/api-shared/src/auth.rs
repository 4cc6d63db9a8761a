/// Header carrying the opaque session id issued by `POST /sessions`.
pub const SESSION_HEADER: &str = "x-session-id";

const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionHeaderError {
    #[error("Missing x-session-id header")]
    Missing,
    #[error("Malformed x-session-id header")]
    Malformed,
}

/// Validates the raw session header value.
///
/// Session ids are short lowercase-hex tokens; anything else is rejected before it reaches the
/// session store.
pub fn session_id_from_header(value: Option<&str>) -> Result<String, SessionHeaderError> {
    let value = value.map(str::trim).ok_or(SessionHeaderError::Missing)?;
    if value.is_empty() {
        return Err(SessionHeaderError::Missing);
    }

    let ok = value.len() <= MAX_SESSION_ID_LEN
        && value
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !ok {
        return Err(SessionHeaderError::Malformed);
    }

    Ok(value.to_string())
}
