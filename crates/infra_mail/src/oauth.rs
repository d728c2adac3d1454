//! OAuth authorization-code flow for connecting mailboxes
//!
//! Google and Microsoft both follow the same shape: redirect the admin to
//! the consent page, exchange the returned code for an access and refresh
//! token pair, then refresh the access token whenever it is about to lapse.

use chrono::Utc;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use domain_intake::{MailProviderKind, Mailbox};

use crate::error::MailError;
use crate::http::check;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.send",
];

pub const MICROSOFT_LOGIN_BASE: &str = "https://login.microsoftonline.com";
pub const MICROSOFT_SCOPES: &[&str] = &["offline_access", "Mail.ReadWrite", "Mail.Send", "User.Read"];

/// Registered application credentials for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Azure AD tenant; ignored for Google
    #[serde(default = "default_tenant")]
    pub tenant: String,
}

fn default_tenant() -> String {
    "common".to_string()
}

/// Tokens returned by a code exchange or refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    google: Option<OAuthCredentials>,
    microsoft: Option<OAuthCredentials>,
    google_token_url: String,
    microsoft_login_base: String,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, google: Option<OAuthCredentials>, microsoft: Option<OAuthCredentials>) -> Self {
        Self {
            http,
            google,
            microsoft,
            google_token_url: GOOGLE_TOKEN_URL.to_string(),
            microsoft_login_base: MICROSOFT_LOGIN_BASE.to_string(),
        }
    }

    /// Sends token requests to other endpoints, e.g. a local stub
    pub fn with_token_endpoints(mut self, google_token_url: &str, microsoft_login_base: &str) -> Self {
        self.google_token_url = google_token_url.to_string();
        self.microsoft_login_base = microsoft_login_base.trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self, kind: MailProviderKind) -> bool {
        self.credentials(kind).is_ok()
    }

    fn credentials(&self, kind: MailProviderKind) -> Result<&OAuthCredentials, MailError> {
        let creds = match kind {
            MailProviderKind::Gmail => self.google.as_ref(),
            MailProviderKind::Outlook => self.microsoft.as_ref(),
        };
        creds.ok_or_else(|| MailError::NotConfigured(format!("no OAuth credentials for {}", kind)))
    }

    fn token_url(&self, kind: MailProviderKind, creds: &OAuthCredentials) -> String {
        match kind {
            MailProviderKind::Gmail => self.google_token_url.clone(),
            MailProviderKind::Outlook => {
                format!("{}/{}/oauth2/v2.0/token", self.microsoft_login_base, creds.tenant)
            }
        }
    }

    /// Consent page the admin is redirected to
    ///
    /// `state` is echoed back on the callback and must be checked there.
    pub fn authorize_url(&self, kind: MailProviderKind, state: &str) -> Result<Url, MailError> {
        let creds = self.credentials(kind)?;
        let url = match kind {
            MailProviderKind::Gmail => Url::parse_with_params(
                GOOGLE_AUTH_URL,
                &[
                    ("client_id", creds.client_id.as_str()),
                    ("redirect_uri", creds.redirect_uri.as_str()),
                    ("response_type", "code"),
                    ("scope", GOOGLE_SCOPES.join(" ").as_str()),
                    ("access_type", "offline"),
                    ("include_granted_scopes", "true"),
                    ("prompt", "consent"),
                    ("state", state),
                ],
            ),
            MailProviderKind::Outlook => Url::parse_with_params(
                &format!("{}/{}/oauth2/v2.0/authorize", MICROSOFT_LOGIN_BASE, creds.tenant),
                &[
                    ("client_id", creds.client_id.as_str()),
                    ("redirect_uri", creds.redirect_uri.as_str()),
                    ("response_type", "code"),
                    ("response_mode", "query"),
                    ("scope", MICROSOFT_SCOPES.join(" ").as_str()),
                    ("state", state),
                ],
            ),
        };
        url.map_err(|e| MailError::NotConfigured(e.to_string()))
    }

    /// Trades the callback code for tokens
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, kind: MailProviderKind, code: &str) -> Result<TokenGrant, MailError> {
        let creds = self.credentials(kind)?;
        let scopes = MICROSOFT_SCOPES.join(" ");
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("redirect_uri", creds.redirect_uri.as_str()),
        ];
        if kind == MailProviderKind::Outlook {
            form.push(("scope", scopes.as_str()));
        }
        self.token_request(kind, creds, &form).await
    }

    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, kind: MailProviderKind, refresh_token: &str) -> Result<TokenGrant, MailError> {
        let creds = self.credentials(kind)?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
        ];
        self.token_request(kind, creds, &form).await
    }

    async fn token_request(
        &self,
        kind: MailProviderKind,
        creds: &OAuthCredentials,
        form: &[(&str, &str)],
    ) -> Result<TokenGrant, MailError> {
        let response = self.http.post(self.token_url(kind, creds)).form(form).send().await?;
        let grant: TokenGrant = check(response, "OAuth token endpoint").await?.json().await?;
        if grant.access_token.is_empty() {
            return Err(MailError::Decode("token response has no access_token".to_string()));
        }
        Ok(grant)
    }

    /// Refreshes the mailbox's access token when it is close to expiry
    ///
    /// Returns whether the tokens changed and must be saved.
    pub async fn ensure_fresh(&self, mailbox: &mut Mailbox) -> Result<bool, MailError> {
        if !mailbox.needs_refresh(Utc::now()) {
            return Ok(false);
        }
        let refresh_token = mailbox
            .refresh_token
            .clone()
            .ok_or_else(|| MailError::Unauthorized(format!("{} has no refresh token", mailbox.email_address)))?;

        let grant = self.refresh(mailbox.provider, &refresh_token).await?;
        mailbox.update_tokens(grant.access_token, grant.refresh_token, grant.expires_in);
        info!(mailbox = %mailbox.email_address, "refreshed mailbox access token");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> OAuthCredentials {
        OAuthCredentials {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://desk.example.com/api/mailboxes/oauth/callback".to_string(),
            tenant: "common".to_string(),
        }
    }

    #[test]
    fn test_google_authorize_url_requests_offline_access() {
        let client = OAuthClient::new(reqwest::Client::new(), Some(creds()), None);
        let url = client.authorize_url(MailProviderKind::Gmail, "st4te").unwrap();
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert!(params.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(params.contains(&("state".to_string(), "st4te".to_string())));
        let scope = params.iter().find(|(k, _)| k == "scope").map(|(_, v)| v.clone()).unwrap();
        assert!(scope.contains("gmail.modify"));
    }

    #[test]
    fn test_microsoft_authorize_url_uses_tenant() {
        let mut microsoft = creds();
        microsoft.tenant = "contoso.onmicrosoft.com".to_string();
        let client = OAuthClient::new(reqwest::Client::new(), None, Some(microsoft));
        let url = client.authorize_url(MailProviderKind::Outlook, "s").unwrap();

        assert_eq!(url.path(), "/contoso.onmicrosoft.com/oauth2/v2.0/authorize");
        assert!(url.query().unwrap_or_default().contains("offline_access"));
    }

    #[test]
    fn test_unconfigured_provider() {
        let client = OAuthClient::new(reqwest::Client::new(), Some(creds()), None);
        assert!(client.is_configured(MailProviderKind::Gmail));
        assert!(!client.is_configured(MailProviderKind::Outlook));
        assert!(matches!(
            client.authorize_url(MailProviderKind::Outlook, "s"),
            Err(MailError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_fresh_skips_valid_token() {
        let client = OAuthClient::new(reqwest::Client::new(), Some(creds()), None);
        let mut mailbox = Mailbox::connect(MailProviderKind::Gmail, "claims@example.com", "tok".to_string(), None, Some(3600));
        assert!(!client.ensure_fresh(&mut mailbox).await.unwrap());
        assert_eq!(mailbox.access_token, "tok");
    }

    #[tokio::test]
    async fn test_ensure_fresh_without_refresh_token() {
        let client = OAuthClient::new(reqwest::Client::new(), Some(creds()), None);
        let mut mailbox = Mailbox::connect(MailProviderKind::Gmail, "claims@example.com", "tok".to_string(), None, Some(0));
        let err = client.ensure_fresh(&mut mailbox).await.unwrap_err();
        assert!(matches!(err, MailError::Unauthorized(_)));
    }
}
