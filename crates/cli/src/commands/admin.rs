//! Admin user management commands.
//!
//! # Environment Variables
//!
//! Every `APPWRITE_*` variable read by [`yousuf_rice_backend::BackendConfig`].

use thiserror::Error;
use yousuf_rice_backend::{
    AdminUserRepository, Backend, BackendConfig, BackendError, ConfigError,
};
use yousuf_rice_core::AdminRole;
use yousuf_rice_core::models::AdminUser;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid role: {0}. Valid roles: admin, manager")]
    InvalidRole(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Admin user already exists: {0}")]
    UserExists(String),
}

/// Create a new admin user in the backend.
pub async fn create_user(username: &str, email: &str, role: &str) -> Result<AdminUser, AdminError> {
    dotenvy::dotenv().ok();

    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let backend = Backend::appwrite(BackendConfig::from_env()?)?;
    tracing::info!("Creating admin user: {} ({})", username, role);

    let user = create(&backend.admin_users(), username, email, role).await?;
    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(user)
}

/// Validate and insert; usernames and emails are unique.
pub async fn create(
    repo: &AdminUserRepository,
    username: &str,
    email: &str,
    role: AdminRole,
) -> Result<AdminUser, AdminError> {
    let username = username.trim();
    if username.is_empty() || username.contains(char::is_whitespace) {
        return Err(AdminError::InvalidUsername(username.to_owned()));
    }
    let email = email.trim();
    if !email.contains('@') || !email.contains('.') {
        return Err(AdminError::InvalidEmail(email.to_owned()));
    }

    let existing = repo.list().await?;
    if let Some(user) = existing
        .iter()
        .find(|u| u.username == username || u.email.eq_ignore_ascii_case(email))
    {
        return Err(AdminError::UserExists(user.username.clone()));
    }

    Ok(repo.create(username, email, role).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use yousuf_rice_backend::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_create_admin_user() {
        let repo = Backend::in_memory(MemoryStore::new()).admin_users();

        let user = create(&repo, "ayesha", "ayesha@yousufrice.com", AdminRole::Manager)
            .await
            .unwrap();
        assert_eq!(user.username, "ayesha");
        assert_eq!(user.role, AdminRole::Manager);
        assert!(user.is_active);

        let found = repo.find_active_by_username("ayesha").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_rejects_duplicates_and_bad_input() {
        let repo = Backend::in_memory(MemoryStore::new()).admin_users();
        create(&repo, "admin", "admin@yousufrice.com", AdminRole::Admin)
            .await
            .unwrap();

        assert!(matches!(
            create(&repo, "admin", "other@yousufrice.com", AdminRole::Admin).await,
            Err(AdminError::UserExists(_))
        ));
        assert!(matches!(
            create(&repo, "second", "ADMIN@yousufrice.com", AdminRole::Admin).await,
            Err(AdminError::UserExists(_))
        ));
        assert!(matches!(
            create(&repo, "two words", "x@yousufrice.com", AdminRole::Admin).await,
            Err(AdminError::InvalidUsername(_))
        ));
        assert!(matches!(
            create(&repo, "third", "not-an-email", AdminRole::Admin).await,
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
