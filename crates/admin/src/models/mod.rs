//! Session-stored admin state.

use serde::{Deserialize, Serialize};
use yousuf_rice_core::models::AdminUser;
use yousuf_rice_core::{AdminRole, AdminUserId};

/// Session keys for admin data.
pub mod session_keys {
    /// The signed-in [`super::CurrentAdmin`].
    pub const CURRENT_ADMIN: &str = "current_admin";
}

/// Identity of the signed-in admin, as kept in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub username: String,
    pub email: String,
    pub role: AdminRole,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
