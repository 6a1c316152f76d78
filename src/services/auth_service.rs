use crate::{
    auth::jwt::{JwtConfig, generate_token, validate_token},
    db::user_store::UserStore,
    error::{AppError, Result},
    models::user::{LoginResponse, Role, UserIdentity},
};

/// Registration, login and token checks for the HTTP layer.
///
/// The stores never hand out sessions; tokens are issued here so that each
/// request carries its own identity.
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(users: UserStore, jwt: JwtConfig) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<()> {
        self.users.register(username, password, role).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let identity = self.users.login(username, password).await?;
        let token = generate_token(&identity, &self.jwt)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(LoginResponse {
            token,
            username: identity.username,
            role: identity.role,
        })
    }

    /// Resolve a bearer token back into the identity it was issued for
    pub fn authenticate(&self, token: &str) -> Result<UserIdentity> {
        let claims = validate_token(token, &self.jwt).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(UserIdentity::from(claims))
    }
}
