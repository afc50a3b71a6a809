use uuid::Uuid;

use super::tokens::TokenKeys;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{normalize_email, NewUser, Role, User};

pub struct AuthSession {
    pub token: String,
    pub user: User,
}

pub struct AuthService<R> {
    repo: R,
    tokens: TokenKeys,
    hash_cost: u32,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R, tokens: TokenKeys) -> Self {
        Self::with_hash_cost(repo, tokens, bcrypt::DEFAULT_COST)
    }

    pub fn with_hash_cost(repo: R, tokens: TokenKeys, hash_cost: u32) -> Self {
        Self {
            repo,
            tokens,
            hash_cost,
        }
    }

    /// Self-service sign-up always creates a regular user.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let email = normalize_email(email);
        if self.repo.find_by_email(&email)?.is_some() {
            return Err(DomainError::Conflict("User already exists".into()));
        }

        let password_hash = bcrypt::hash(password, self.hash_cost)
            .map_err(|e| DomainError::Internal(format!("password hashing failed: {}", e)))?;
        let user = self.repo.create(NewUser {
            name: name.trim().to_string(),
            email,
            password_hash,
            role: Role::User,
        })?;
        log::info!("Registered user {}", user.id);

        self.session(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let user = self
            .repo
            .find_by_email(&normalize_email(email))?
            .ok_or(DomainError::InvalidCredentials)?;

        // A malformed stored hash is treated like a wrong password.
        if !bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
            return Err(DomainError::InvalidCredentials);
        }

        self.session(user)
    }

    pub fn current_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::NotFound("User not found".into()))
    }

    fn session(&self, user: User) -> Result<AuthSession, DomainError> {
        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }
}
