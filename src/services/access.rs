//! Edit access
//!
//! A visitor may change a project's content only when the GitHub account they
//! signed in with is one of the repository's contributors. Signed-in ids look
//! like `github|12345`; the number after the tag is compared with contributor
//! ids. Anything that does not parse is simply "not allowed".

use crate::models::{Contributor, SessionIdentity};

/// Provider tag accepted for edit access
pub const GITHUB_PROVIDER: &str = "github";

/// Extract the GitHub account id from an external user id.
///
/// Returns `None` unless the id is exactly `github|<digits>`.
pub fn parse_account_id(external_user_id: &str) -> Option<i64> {
    let (provider, account) = external_user_id.split_once('|')?;
    if provider != GITHUB_PROVIDER {
        return None;
    }
    if account.is_empty() || !account.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    account.parse().ok()
}

/// Whether `identity` may edit a repository with these contributors
pub fn can_edit(identity: Option<&SessionIdentity>, contributors: &[Contributor]) -> bool {
    let Some(identity) = identity else {
        return false;
    };
    let Some(account_id) = parse_account_id(&identity.external_user_id) else {
        tracing::debug!(
            "Identity '{}' has no usable account id",
            identity.external_user_id
        );
        return false;
    };
    contributors.iter().any(|c| c.id == account_id)
}
