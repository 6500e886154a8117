/// Caller identity resolution for write operations
///
/// Writes record who performed them (project owner, task creator). The
/// caller is the authenticated user when a valid token was sent. Anonymous
/// writes fall back to a placeholder user when the deployment allows it: the
/// earliest registered user, or a `demo` account created on first use.
///
/// The placeholder path exists for local demos and must not be relied on in
/// production; callers log every use of it.

use sqlx::PgPool;
use uuid::Uuid;

use super::password::{hash_password, PasswordError};
use crate::models::user::{CreateUser, User};

/// Username of the account created when no user exists yet
pub const PLACEHOLDER_USERNAME: &str = "demo";

pub const PLACEHOLDER_EMAIL: &str = "demo@demo.com";

pub const PLACEHOLDER_PASSWORD: &str = "demo";

/// Error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// A token was valid but its user has since been deleted
    #[error("User {0} no longer exists")]
    UnknownUser(Uuid),
}

/// The user a write is attributed to
#[derive(Debug, Clone)]
pub enum Actor {
    /// Identified by a verified access token
    Authenticated(User),

    /// Substituted for an anonymous caller
    Placeholder(User),
}

impl Actor {
    pub fn user(&self) -> &User {
        match self {
            Actor::Authenticated(user) | Actor::Placeholder(user) => user,
        }
    }

    pub fn id(&self) -> Uuid {
        self.user().id
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Actor::Placeholder(_))
    }
}

/// Loads the authenticated user behind a token's subject
pub async fn resolve_authenticated(pool: &PgPool, user_id: Uuid) -> Result<Actor, IdentityError> {
    User::find_by_id(pool, user_id)
        .await?
        .map(Actor::Authenticated)
        .ok_or(IdentityError::UnknownUser(user_id))
}

/// Picks the placeholder user, creating the demo account if the user table
/// is empty
pub async fn resolve_placeholder(pool: &PgPool) -> Result<Actor, IdentityError> {
    if let Some(user) = User::first(pool).await? {
        return Ok(Actor::Placeholder(user));
    }

    let user = User::create_or_get(
        pool,
        CreateUser {
            username: PLACEHOLDER_USERNAME.to_string(),
            email: PLACEHOLDER_EMAIL.to_string(),
            password_hash: hash_password(PLACEHOLDER_PASSWORD)?,
            ..Default::default()
        },
    )
    .await?;

    Ok(Actor::Placeholder(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_actor_accessors() {
        let authenticated = Actor::Authenticated(user("ana"));
        assert!(!authenticated.is_placeholder());
        assert_eq!(authenticated.user().username, "ana");

        let placeholder = Actor::Placeholder(user(PLACEHOLDER_USERNAME));
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.id(), placeholder.user().id);
    }

    #[test]
    fn test_unknown_user_message() {
        let id = Uuid::nil();
        assert_eq!(
            IdentityError::UnknownUser(id).to_string(),
            format!("User {} no longer exists", id)
        );
    }
}
