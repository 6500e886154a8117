/// Authentication primitives
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access and refresh tokens
/// - [`middleware`]: bearer token extraction into an [`middleware::AuthContext`]
/// - [`identity`]: who a write is attributed to
///
/// # Example
///
/// ```no_run
/// use kanbanflow_shared::auth::jwt::issue_token_pair;
/// use kanbanflow_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let (access, refresh) = issue_token_pair(Uuid::new_v4(), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
