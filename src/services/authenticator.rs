// src/services/authenticator.rs
use crate::config::AppConfig;
use crate::errors::AuthError;
use crate::models::auth::{Account, AccountId, AccountRef, Claims, NewAccount};
use crate::store::UserStore;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Decides which identity is the administrator. Exact, case-sensitive email match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdministratorPredicate {
    email: Option<String>,
}

impl AdministratorPredicate {
    pub fn new(email: Option<String>) -> Self {
        Self { email }
    }

    pub fn matches(&self, identity: &AccountRef) -> bool {
        self.email.as_deref() == Some(identity.email.as_str())
    }

    pub fn is_configured(&self) -> bool {
        self.email.is_some()
    }
}

/// Signed proof of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub identity: AccountRef,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Seconds until expiry, for the cookie's Max-Age.
    pub fn remaining_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

pub struct SessionAuthenticator {
    users: Arc<dyn UserStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_hours: i64,
    bcrypt_cost: u32,
    admin: AdministratorPredicate,
    // Logged-out session ids with their expiry, pruned once expired
    revoked: RwLock<HashMap<String, usize>>,
}

impl SessionAuthenticator {
    pub fn new(users: Arc<dyn UserStore>, config: &AppConfig) -> Self {
        let secret = config.session.secret.as_bytes();

        // No grace period after `exp`, so pruning revocations at `exp` is safe
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_hours: config.session.ttl_hours,
            bcrypt_cost: config.session.bcrypt_cost,
            admin: AdministratorPredicate::new(config.admin_email.clone()),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an account and logs it in. Email uniqueness is left to the store.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(Account, Session), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingField);
        }

        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_display_name(email));

        let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;

        let account = self
            .users
            .insert(NewAccount {
                email: email.to_string(),
                password_hash,
                display_name,
            })
            .await
            .map_err(|e| {
                tracing::warn!("Registration failed for {}: {}", email, e);
                AuthError::from(e)
            })?;

        tracing::info!("✨ Registered account {} ({})", account.id, account.email);

        let session = self.issue_session(account.to_ref())?;
        Ok((account, session))
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = match self.users.find_by_email(email).await? {
            Some(account) => account,
            None => {
                tracing::info!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password.to_string(), account.password_hash.clone()).await? {
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!("👤 Account {} logged in", account.id);
        self.issue_session(account.to_ref())
    }

    pub async fn current_identity(&self, token: &str) -> Result<AccountRef, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Session verification failed: {}", e);
                AuthError::Unauthenticated
            })?
            .claims;

        if self.revoked.read().await.contains_key(&claims.sid) {
            return Err(AuthError::Unauthenticated);
        }

        let id = claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| AuthError::Unauthenticated)?;

        Ok(AccountRef {
            id,
            email: claims.email,
            display_name: claims.display_name,
        })
    }

    /// Ends a session. Invalid or already expired tokens are ignored.
    pub async fn logout(&self, token: &str) {
        let Ok(data) = decode::<Claims>(token, &self.decoding_key, &self.validation) else {
            return;
        };

        let now = Utc::now().timestamp().max(0) as usize;
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp >= now);
        revoked.insert(data.claims.sid, data.claims.exp);
        tracing::info!("Account {} logged out", data.claims.sub);
    }

    pub fn is_administrator(&self, identity: &AccountRef) -> bool {
        self.admin.matches(identity)
    }

    pub fn administrator(&self) -> &AdministratorPredicate {
        &self.admin
    }

    fn issue_session(&self, identity: AccountRef) -> Result<Session, AuthError> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Internal("session expiry out of range".to_string()))?;

        let claims = Claims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            sid: uuid::Uuid::new_v4().to_string(),
            exp: expires_at.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Error generating session token: {}", e);
            AuthError::Internal(e.to_string())
        })?;

        Ok(Session {
            token,
            identity,
            expires_at,
        })
    }
}

/// Local part of the email, or the whole email when the local part is empty.
pub fn default_display_name(email: &str) -> String {
    match email.trim().split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => email.trim().to_string(),
    }
}

/// Salted bcrypt hash, computed off the async workers.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::error!("Error hashing password: {}", e);
            AuthError::Internal(e.to_string())
        })
}

pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::error!("Error verifying password: {}", e);
            AuthError::Internal(e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use crate::test_support::{test_authenticator, test_config, ADMIN_EMAIL};

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let auth = test_authenticator();
        let (account, session) = auth.register("ada@example.com", "hunter22", Some("Ada")).await.unwrap();
        assert_eq!(account.display_name, "Ada");
        assert_ne!(account.password_hash, "hunter22");

        let identity = auth.current_identity(&session.token).await.unwrap();
        assert_eq!(identity.id, account.id);

        let login = auth.authenticate("ada@example.com", "hunter22").await.unwrap();
        let identity = auth.current_identity(&login.token).await.unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.display_name, "Ada");
    }

    #[tokio::test]
    async fn test_display_name_defaults_to_local_part() {
        let auth = test_authenticator();
        let (account, _) = auth.register("grace.hopper@navy.mil", "cobol", None).await.unwrap();
        assert_eq!(account.display_name, "grace.hopper");

        let (account, _) = auth.register("alan@example.com", "enigma", Some("   ")).await.unwrap();
        assert_eq!(account.display_name, "alan");
    }

    #[tokio::test]
    async fn test_register_requires_email_and_password() {
        let auth = test_authenticator();
        assert!(matches!(auth.register("", "pw", None).await, Err(AuthError::MissingField)));
        assert!(matches!(auth.register("a@b.c", "", None).await, Err(AuthError::MissingField)));
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_original_untouched() {
        let users = Arc::new(InMemoryUserStore::new());
        let auth = SessionAuthenticator::new(users.clone(), &test_config());
        let (original, _) = auth.register("ada@example.com", "first", Some("Ada")).await.unwrap();

        let err = auth.register("ada@example.com", "second", Some("Impostor")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));

        let stored = users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.display_name, "Ada");
        assert_eq!(stored.password_hash, original.password_hash);
        assert!(auth.authenticate("ada@example.com", "first").await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let auth = test_authenticator();
        auth.register("ada@example.com", "right", None).await.unwrap();

        let wrong = auth.authenticate("ada@example.com", "wrong").await.unwrap_err();
        let unknown = auth.authenticate("nobody@example.com", "right").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let auth = test_authenticator();
        auth.register("Ada@example.com", "pw", None).await.unwrap();
        assert!(auth.authenticate("ada@example.com", "pw").await.is_err());
        assert!(auth.authenticate("Ada@example.com", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_and_tampered_tokens_are_rejected() {
        let auth = test_authenticator();
        let (_, session) = auth.register("ada@example.com", "pw", None).await.unwrap();

        assert!(matches!(auth.current_identity("not-a-token").await, Err(AuthError::Unauthenticated)));

        // Another account's claims under this session's signature
        let (_, other_session) = auth.register("eve@example.com", "pw", None).await.unwrap();
        let ours: Vec<&str> = session.token.split('.').collect();
        let theirs: Vec<&str> = other_session.token.split('.').collect();
        let spliced = format!("{}.{}.{}", ours[0], theirs[1], ours[2]);
        assert!(auth.current_identity(&spliced).await.is_err());

        let mut other_config = test_config();
        other_config.session.secret = "another-secret".to_string();
        let other = SessionAuthenticator::new(Arc::new(InMemoryUserStore::new()), &other_config);
        assert!(other.current_identity(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let mut config = test_config();
        config.session.ttl_hours = -2;
        let auth = SessionAuthenticator::new(Arc::new(InMemoryUserStore::new()), &config);
        let (_, session) = auth.register("ada@example.com", "pw", None).await.unwrap();
        assert!(matches!(auth.current_identity(&session.token).await, Err(AuthError::Unauthenticated)));
    }

    fn token_with_exp(auth: &SessionAuthenticator, sid: &str, exp: i64) -> String {
        let claims = Claims {
            sub: "1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "ada".to_string(),
            sid: sid.to_string(),
            exp: exp as usize,
            iat: (exp - 3600) as usize,
        };
        encode(&Header::default(), &claims, &auth.encoding_key).unwrap()
    }

    #[tokio::test]
    async fn test_recently_expired_token_is_rejected() {
        let auth = test_authenticator();
        let token = token_with_exp(&auth, "late", Utc::now().timestamp() - 10);
        assert!(matches!(auth.current_identity(&token).await, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_pruned_revocations_stay_unusable() {
        let auth = test_authenticator();
        let now = Utc::now().timestamp();
        let short_lived = token_with_exp(&auth, "short", now + 1);
        assert!(auth.current_identity(&short_lived).await.is_ok());

        auth.logout(&short_lived).await;
        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        // This logout prunes the expired entry for the first session
        let (_, other) = auth.register("bob@example.com", "pw", None).await.unwrap();
        auth.logout(&other.token).await;
        assert!(!auth.revoked.read().await.contains_key("short"));

        assert!(auth.current_identity(&short_lived).await.is_err());
        assert!(auth.current_identity(&other.token).await.is_err());
    }

    #[tokio::test]
    async fn test_session_lifetime_out_of_range_is_an_error() {
        let mut config = test_config();
        config.session.ttl_hours = i64::MAX / 2;
        let auth = SessionAuthenticator::new(Arc::new(InMemoryUserStore::new()), &config);
        let err = auth.register("ada@example.com", "pw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_session_remaining_seconds_follow_ttl() {
        let auth = test_authenticator();
        let (_, session) = auth.register("ada@example.com", "pw", None).await.unwrap();
        let remaining = session.remaining_seconds();
        assert!(remaining > 24 * 3600 - 60 && remaining <= 24 * 3600, "{}", remaining);
    }

    #[tokio::test]
    async fn test_logout_ends_only_that_session() {
        let auth = test_authenticator();
        let (_, first) = auth.register("ada@example.com", "pw", None).await.unwrap();
        let second = auth.authenticate("ada@example.com", "pw").await.unwrap();

        auth.logout(&first.token).await;
        assert!(matches!(auth.current_identity(&first.token).await, Err(AuthError::Unauthenticated)));
        assert!(auth.current_identity(&second.token).await.is_ok());

        // Ignored
        auth.logout("garbage").await;
    }

    #[tokio::test]
    async fn test_administrator_is_exact_email_match() {
        let auth = test_authenticator();
        let (admin, _) = auth.register(ADMIN_EMAIL, "pw", None).await.unwrap();
        let (user, _) = auth.register("user@example.com", "pw", None).await.unwrap();
        let (shouting, _) = auth.register(&ADMIN_EMAIL.to_uppercase(), "pw", None).await.unwrap();

        assert!(auth.is_administrator(&admin.to_ref()));
        assert!(!auth.is_administrator(&user.to_ref()));
        assert!(!auth.is_administrator(&shouting.to_ref()));
    }

    #[test]
    fn test_unconfigured_predicate_matches_nobody() {
        let predicate = AdministratorPredicate::default();
        let identity = AccountRef { id: 1, email: String::new(), display_name: String::new() };
        assert!(!predicate.is_configured());
        assert!(!predicate.matches(&identity));
    }

    #[test]
    fn test_default_display_name() {
        assert_eq!(default_display_name("ada@example.com"), "ada");
        assert_eq!(default_display_name("@example.com"), "@example.com");
        assert_eq!(default_display_name("plain"), "plain");
    }
}
