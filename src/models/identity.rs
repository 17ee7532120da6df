//! Session identity model

use serde::{Deserialize, Serialize};

/// The visitor established by a successful sign-in.
///
/// `external_user_id` is the provider-namespaced subject, e.g. `github|12345`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub external_user_id: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl SessionIdentity {
    pub fn new(
        external_user_id: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            external_user_id: external_user_id.into(),
            display_name: display_name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}
