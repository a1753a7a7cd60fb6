//! Pagination token codec.
//!
//! Converts between the opaque token handed to callers and the store's
//! native [`PagingState`]. There is exactly one wire format:
//!
//! ```text
//! token = base64url-nopad( [CODEC_VERSION] ++ paging_state_bytes )
//! ```
//!
//! Decoding accepts only canonical tokens of this version, so
//! `encode(decode(t)) == t` for every token `encode` produced. The codec holds
//! no state; the whole continuation lives in the token.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};
use crate::traits::PagingState;

/// Version byte prefixed to every encoded paging state.
pub const CODEC_VERSION: u8 = 1;

// Upper bound on accepted token length, checked before decoding.
const MAX_TOKEN_LEN: usize = 4096;

/// An opaque pagination token.
///
/// Tokens are only meaningful together with the filter and limit that
/// produced them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Wrap a token string received from a caller.
    ///
    /// No validation happens here; [`decode`] rejects malformed tokens.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PageToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Encode a native paging state as a token. `None` (end of results) stays `None`.
pub fn encode(state: Option<&PagingState>) -> Option<PageToken> {
    let state = state?;
    let mut payload = Vec::with_capacity(state.as_bytes().len() + 1);
    payload.push(CODEC_VERSION);
    payload.extend_from_slice(state.as_bytes());
    Some(PageToken(URL_SAFE_NO_PAD.encode(payload)))
}

/// Decode a caller token into the native paging state. `None` (first page) stays `None`.
///
/// # Errors
///
/// Returns [`InvalidInputError::Cursor`] if the token is empty, too long,
/// not canonical base64url, or was produced by a different codec version.
pub fn decode(token: Option<&PageToken>) -> Result<Option<PagingState>, Error> {
    let Some(token) = token else {
        return Ok(None);
    };
    let s = token.as_str();

    if s.is_empty() {
        return Err(mismatch("token is empty"));
    }

    if s.len() > MAX_TOKEN_LEN {
        return Err(mismatch(&format!(
            "token exceeds max length: {} chars (max {})",
            s.len(),
            MAX_TOKEN_LEN
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| mismatch(&format!("not a base64url token: {}", e)))?;

    match payload.split_first() {
        Some((&CODEC_VERSION, rest)) if !rest.is_empty() => Ok(Some(PagingState::new(rest))),
        Some((&CODEC_VERSION, _)) => Err(mismatch("token carries no paging state")),
        Some((version, _)) => Err(mismatch(&format!(
            "unsupported token version {} (expected {})",
            version, CODEC_VERSION
        ))),
        None => Err(mismatch("token is empty")),
    }
}

fn mismatch(reason: &str) -> Error {
    InvalidInputError::Cursor {
        reason: reason.to_string(),
    }
    .into()
}
