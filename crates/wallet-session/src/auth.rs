//! Email OTP and social (OAuth) login.
//!
//! A redirect login leaves the process and comes back through
//! [`AuthFlow::complete_redirect`]; the session-scoped attempt flags bridge
//! the two halves and are consumed on the way back.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, WalletError};
use crate::storage::{keys, WalletStorage};

/// Path OAuth providers send the user back to, relative to the redirect base.
pub const CALLBACK_PATH: &str = "/oauth/callback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoginType {
    Email,
    Social,
}

impl LoginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginType::Email => "EMAIL",
            LoginType::Social => "SOCIAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Redirect,
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Facebook,
    Apple,
    Github,
    Twitter,
    Discord,
    Telegram,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Facebook => "facebook",
            SocialProvider::Apple => "apple",
            SocialProvider::Github => "github",
            SocialProvider::Twitter => "twitter",
            SocialProvider::Discord => "discord",
            SocialProvider::Telegram => "telegram",
        }
    }

    /// Telegram only supports the popup flow.
    pub fn default_login_mode(&self) -> LoginMode {
        match self {
            SocialProvider::Telegram => LoginMode::Popup,
            _ => LoginMode::Redirect,
        }
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            SocialProvider::Google => &["email", "profile"],
            _ => &[],
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialProvider {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(SocialProvider::Google),
            "facebook" => Ok(SocialProvider::Facebook),
            "apple" => Ok(SocialProvider::Apple),
            "github" => Ok(SocialProvider::Github),
            "twitter" => Ok(SocialProvider::Twitter),
            "discord" => Ok(SocialProvider::Discord),
            "telegram" => Ok(SocialProvider::Telegram),
            other => Err(WalletError::Config(format!("unsupported login provider {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    pub provider: SocialProvider,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// Login half of the embedded-wallet SDK. Tokens are DID tokens.
#[async_trait]
pub trait AuthSdk: Send + Sync {
    fn login_mode(&self, provider: SocialProvider) -> LoginMode {
        provider.default_login_mode()
    }

    async fn login_with_email_otp(&self, email: &str) -> Result<SecretString, ProviderError>;

    /// Starts the provider's redirect. Returning `Ok` means the user is
    /// being sent away.
    async fn login_with_redirect(&self, request: &RedirectRequest) -> Result<(), ProviderError>;

    async fn login_with_popup(&self, provider: SocialProvider) -> Result<SecretString, ProviderError>;

    /// Token from a completed redirect, or `None` when nothing is pending.
    async fn redirect_result(&self) -> Result<Option<SecretString>, ProviderError>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum SocialLoginOutcome {
    /// Control returns through [`AuthFlow::complete_redirect`].
    Redirecting,
    LoggedIn,
}

pub struct AuthFlow {
    sdk: Arc<dyn AuthSdk>,
    storage: WalletStorage,
    redirect_base: String,
}

impl AuthFlow {
    pub fn new(sdk: Arc<dyn AuthSdk>, storage: WalletStorage, redirect_base: impl Into<String>) -> Self {
        Self {
            sdk,
            storage,
            redirect_base: redirect_base.into(),
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}{CALLBACK_PATH}", self.redirect_base.trim_end_matches('/'))
    }

    fn save_token(&self, token: &SecretString, login_type: LoginType) -> Result<(), WalletError> {
        self.storage.durable().set(keys::TOKEN, token.expose_secret())?;
        self.storage.durable().set(keys::LOGIN_TYPE, login_type.as_str())?;
        Ok(())
    }

    fn clear_attempt(&self) -> Result<(), WalletError> {
        let attempt = self.storage.session().remove(keys::OAUTH_ATTEMPT);
        let provider = self.storage.session().remove(keys::OAUTH_PROVIDER);
        attempt?;
        provider?;
        Ok(())
    }

    pub async fn login_with_email(&self, email: &str) -> Result<(), WalletError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(WalletError::InvalidInput("email address is required".into()));
        }
        let token = self.sdk.login_with_email_otp(email).await?;
        self.save_token(&token, LoginType::Email)?;
        info!(login_type = LoginType::Email.as_str(), "logged in");
        Ok(())
    }

    pub async fn begin_social_login(&self, provider: SocialProvider) -> Result<SocialLoginOutcome, WalletError> {
        if self.sdk.login_mode(provider) == LoginMode::Popup {
            let token = self.sdk.login_with_popup(provider).await?;
            self.save_token(&token, LoginType::Social)?;
            info!(%provider, "logged in via popup");
            return Ok(SocialLoginOutcome::LoggedIn);
        }

        self.storage.session().set(keys::OAUTH_ATTEMPT, "true")?;
        self.storage.session().set(keys::OAUTH_PROVIDER, provider.as_str())?;

        let request = RedirectRequest {
            provider,
            redirect_uri: self.redirect_uri(),
            scopes: provider.scopes().iter().map(|s| s.to_string()).collect(),
        };
        match self.sdk.login_with_redirect(&request).await {
            Ok(()) => {
                debug!(%provider, redirect_uri = %request.redirect_uri, "redirecting to provider");
                Ok(SocialLoginOutcome::Redirecting)
            }
            Err(e) => {
                warn!(%provider, error = %e, "social login failed to start");
                self.clear_attempt()?;
                Err(e.into())
            }
        }
    }

    /// Finish a redirect login on return. Returns whether a login completed.
    /// Errors are surfaced only when this process started a redirect; on an
    /// ordinary start they are logged and swallowed.
    pub async fn complete_redirect(&self) -> Result<bool, WalletError> {
        // Both flags are consumed even when one of them cannot be read.
        let attempt = self.storage.session().take(keys::OAUTH_ATTEMPT);
        let provider = self.storage.session().take(keys::OAUTH_PROVIDER);
        let attempted = attempt?.as_deref() == Some("true");
        let provider = provider?;

        match self.sdk.redirect_result().await {
            Ok(Some(token)) => {
                self.save_token(&token, LoginType::Social)?;
                info!(provider = provider.as_deref().unwrap_or("unknown"), "logged in via redirect");
                Ok(true)
            }
            Ok(None) => {
                debug!("no pending redirect result");
                Ok(false)
            }
            Err(e) if attempted => {
                warn!(error = %e, "redirect login failed");
                Err(e.into())
            }
            Err(e) => {
                debug!(error = %e, "no redirect login in progress");
                Ok(false)
            }
        }
    }
}
