//! API configuration

use serde::Deserialize;
use std::time::Duration;

use domain_dispatch::DEFAULT_GEOFENCE_RADIUS_KM;
use domain_cases::DEFAULT_DUE_DAYS;
use infra_db::DatabaseConfig;
use infra_mail::OAuthCredentials;

/// API configuration
///
/// Loaded from `API_*` environment variables; every field has a default
/// so a bare development checkout starts without any configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// Session lifetime in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub db_acquire_timeout_secs: u64,
    /// Log level
    pub log_level: String,
    /// Root directory for attachments and evidence photos
    pub upload_dir: String,
    /// Maximum distance between an evidence photo and the incident
    pub geofence_radius_km: f64,
    /// Days from receipt to due date for new cases
    pub case_due_days: i64,
    /// Seconds between background mailbox polls; 0 disables the poller
    pub poll_interval_secs: u64,
    /// Messages fetched per mailbox per poll
    pub poll_max_messages: usize,
    pub gmail_client_id: String,
    pub gmail_client_secret: String,
    pub graph_client_id: String,
    pub graph_client_secret: String,
    pub graph_tenant: String,
    /// Callback registered with both OAuth providers
    pub oauth_redirect_uri: String,
    /// Connected mailbox used to send codes and reset links; empty logs them instead
    pub notifier_mailbox: String,
    /// Base URL of the web app, used in reset links
    pub frontend_url: String,
    pub site_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 7 * 24 * 3600,
            database_url: "postgres://localhost/claims_desk".to_string(),
            db_max_connections: 10,
            db_min_connections: 2,
            db_acquire_timeout_secs: 30,
            log_level: "info".to_string(),
            upload_dir: "uploads".to_string(),
            geofence_radius_km: DEFAULT_GEOFENCE_RADIUS_KM,
            case_due_days: DEFAULT_DUE_DAYS,
            poll_interval_secs: 0,
            poll_max_messages: 25,
            gmail_client_id: String::new(),
            gmail_client_secret: String::new(),
            graph_client_id: String::new(),
            graph_client_secret: String::new(),
            graph_tenant: "common".to_string(),
            oauth_redirect_uri: "http://localhost:3000/intake/oauth/callback".to_string(),
            notifier_mailbox: String::new(),
            frontend_url: "http://localhost:3000".to_string(),
            site_name: domain_identity::DEFAULT_SITE_NAME.to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// Any malformed variable fails the whole load; callers must not fall
    /// back to [`ApiConfig::default`], which carries a public JWT secret.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("API"))
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder().add_source(source).build()?.try_deserialize()
    }

    /// Pool settings for [`infra_db::create_pool`]
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn google_credentials(&self) -> Option<OAuthCredentials> {
        credentials(&self.gmail_client_id, &self.gmail_client_secret, &self.oauth_redirect_uri, "common")
    }

    pub fn microsoft_credentials(&self) -> Option<OAuthCredentials> {
        credentials(&self.graph_client_id, &self.graph_client_secret, &self.oauth_redirect_uri, &self.graph_tenant)
    }

    /// Address of the mailbox that sends notifications, if any
    pub fn notifier_address(&self) -> Option<&str> {
        Some(self.notifier_mailbox.trim()).filter(|a| !a.is_empty())
    }
}

fn credentials(client_id: &str, client_secret: &str, redirect_uri: &str, tenant: &str) -> Option<OAuthCredentials> {
    if client_id.trim().is_empty() || client_secret.trim().is_empty() {
        return None;
    }
    Some(OAuthCredentials {
        client_id: client_id.trim().to_string(),
        client_secret: client_secret.trim().to_string(),
        redirect_uri: redirect_uri.to_string(),
        tenant: tenant.to_string(),
    })
}
