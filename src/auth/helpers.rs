use chrono::Utc;

use super::token_key;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Identity;

/// Resolves the raw `authorization` header value to an identity.
///
/// A missing or empty header, an unknown token and an expired token all
/// produce [`Error::InvalidToken`]; callers cannot tell them apart.
pub fn resolve_identity(store: &dyn Store, auth_header: Option<&str>) -> Result<Identity> {
    let raw_token = auth_header
        .filter(|h| !h.is_empty())
        .ok_or(Error::InvalidToken)?;

    let identity = store
        .get_identity(&token_key(raw_token))?
        .ok_or(Error::InvalidToken)?;

    if identity.is_expired(Utc::now()) {
        return Err(Error::InvalidToken);
    }

    Ok(identity)
}
