//! Read-only access to what the login flow leaves in client storage.

use crate::domain::notification::UserProfile;
use crate::domain::ports::{ClientStorage, TOKEN_KEY, USER_KEY};

/// Loads the stored user profile. Absent, unreadable, or malformed data all
/// mean "no profile".
pub fn load_profile(storage: &dyn ClientStorage) -> Option<UserProfile> {
    let raw = match storage.get(USER_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read stored user profile");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed stored user profile");
            None
        }
    }
}

/// Loads the stored bearer token. Blank tokens count as absent.
pub fn load_token(storage: &dyn ClientStorage) -> Option<String> {
    match storage.get(TOKEN_KEY) {
        Ok(raw) => raw
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read stored token");
            None
        }
    }
}
