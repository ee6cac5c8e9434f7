//! Credential validation against the remote user directory.

use std::sync::Arc;

use gatehouse_auth::verify_password;
use gatehouse_core::UserId;
use gatehouse_rpc::{IdentityService, RpcError, UserRecord};

use crate::error::{ControlError, Result};

/// Looks up users and checks their passwords.
pub struct CredentialValidator<I: IdentityService> {
    users: Arc<I>,
}

impl<I: IdentityService> CredentialValidator<I> {
    /// Create a validator over the given identity service.
    #[must_use]
    pub fn new(users: Arc<I>) -> Self {
        Self { users }
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no user has this email.
    pub async fn lookup_by_email(&self, email: &str) -> std::result::Result<UserRecord, RpcError> {
        self.users.get_user_by_email(email).await
    }

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NOT_FOUND` if no user has this ID.
    pub async fn lookup_by_id(&self, id: UserId) -> std::result::Result<UserRecord, RpcError> {
        self.users.get_user_by_id(id).await
    }

    /// Check an email and password pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown user or a wrong password,
    /// and `Rpc` if the user service cannot answer.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord> {
        let user = match self.lookup_by_email(email).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                tracing::warn!(email = %email, "Login attempt for unknown user");
                return Err(ControlError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(email = %email, error = %e, "Failed to look up user");
                return Err(e.into());
            }
        };

        if !verify_password(password, &user.password) {
            tracing::warn!(email = %email, "Invalid password attempt");
            return Err(ControlError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_auth::hash_password;
    use gatehouse_rpc::memory::MemoryIdentityService;

    fn setup() -> (CredentialValidator<MemoryIdentityService>, Arc<MemoryIdentityService>) {
        let users = Arc::new(MemoryIdentityService::new());
        users.insert(UserRecord {
            id: UserId::new(1),
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            password: hash_password("correct horse").unwrap(),
            is_admin: false,
        });
        (CredentialValidator::new(Arc::clone(&users)), users)
    }

    #[tokio::test]
    async fn correct_password_authenticates() {
        let (validator, _) = setup();
        let user = validator
            .authenticate("ada@x.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new(1));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let (validator, _) = setup();

        let unknown = validator
            .authenticate("nobody@x.com", "correct horse")
            .await
            .unwrap_err();
        let wrong = validator
            .authenticate("ada@x.com", "battery staple")
            .await
            .unwrap_err();

        assert!(matches!(unknown, ControlError::InvalidCredentials));
        assert!(matches!(wrong, ControlError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn directory_outage_is_not_a_credential_error() {
        let (validator, users) = setup();
        users.fail("GetUser", RpcError::unavailable("down"));

        let err = validator
            .authenticate("ada@x.com", "correct horse")
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Rpc(_)));
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let (validator, _) = setup();
        assert_eq!(
            validator.lookup_by_id(UserId::new(1)).await.unwrap().email,
            "ada@x.com"
        );
        assert!(validator
            .lookup_by_id(UserId::new(9))
            .await
            .unwrap_err()
            .is_not_found());
    }
}
