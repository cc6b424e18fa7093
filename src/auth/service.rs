use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{hash_password, verify_password, AuthError, TokenService};
use crate::error::{require_text, Error, Result};
use crate::models::{NewUser, Role, User};
use crate::repositories::UserRepository;
use crate::{settle, PostgresUnitOfWork, UnitOfWork, UnitOfWorkSession};

/// Account registration, login and profile lookup.
pub struct AuthService<U = PostgresUnitOfWork> {
    uow: U,
    tokens: TokenService,
}

impl<U: UnitOfWork> AuthService<U> {
    pub fn new(uow: U, tokens: TokenService) -> Self {
        Self { uow, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, request: NewUser) -> Result<User> {
        self.create_account(request, Role::User).await
    }

    /// Create an account with an explicit role; used to provision administrators.
    pub async fn create_account(&self, request: NewUser, role: Role) -> Result<User> {
        let name = require_text("name", &request.name)?;
        let email = normalize_email(&request.email)?;
        let password_hash = hash_password(&request.password)?;

        let session = self.uow.begin().await?;
        let outcome = UserRepository::new(session.executor().clone())
            .create(&name, &email, &password_hash, role)
            .await
            .map_err(Error::from)
            .and_then(|user| {
                user.ok_or_else(|| Error::Conflict("An account with this email already exists".into()))
            });
        let user = settle(session, outcome).await?;
        info!(user_id = %user.id, ?role, "Account created");
        Ok(user)
    }

    /// Make sure an administrator with this email exists.
    ///
    /// A missing account is created with the given name and password. An
    /// existing account keeps its password and is promoted if needed, so
    /// repeated startups leave the account untouched.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn ensure_admin(&self, account: NewUser) -> Result<User> {
        let name = require_text("name", &account.name)?;
        let email = normalize_email(&account.email)?;
        let password_hash = hash_password(&account.password)?;

        let session = self.uow.begin().await?;
        let users = UserRepository::new(session.executor().clone());
        let outcome = async {
            match users.find_by_email(&email).await? {
                Some(user) if user.role == Role::Admin => Ok::<_, Error>(user),
                Some(user) => {
                    warn!(user_id = %user.id, "Promoting existing account to administrator");
                    users
                        .set_role(user.id, Role::Admin)
                        .await?
                        .ok_or(Error::NotFound("User"))
                }
                None => {
                    let user = users
                        .create(&name, &email, &password_hash, Role::Admin)
                        .await?
                        .ok_or_else(|| Error::Conflict("An account with this email already exists".into()))?;
                    info!(user_id = %user.id, "Administrator account created");
                    Ok(user)
                }
            }
        }
        .await;
        settle(session, outcome).await
    }

    /// Exchange credentials for a bearer token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;

        let session = self.uow.begin().await?;
        let outcome = UserRepository::new(session.executor().clone())
            .find_by_email(&email)
            .await
            .map_err(Error::from);
        let user = settle(session, outcome).await?;

        let Some(user) = user else {
            warn!("Login for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(&user.password_hash, password)? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(self.tokens.issue(user.id, user.role)?)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        let session = self.uow.begin().await?;
        let outcome = UserRepository::new(session.executor().clone())
            .find_by_id(user_id)
            .await
            .map_err(Error::from)
            .and_then(|user| user.ok_or(Error::NotFound("User")));
        settle(session, outcome).await
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail("email address is invalid".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
    }

    #[test]
    fn email_needs_both_sides_of_the_at() {
        for bad in ["", "ana", "@example.com", "ana@"] {
            assert!(normalize_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
