//! HTTP API Layer
//!
//! This crate provides the REST API for the claims desk using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each route group
//! - **Middleware**: Session authentication and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//! - **Poller**: Mailbox polling shared by the server and the `intake-poller` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(pool, config)?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod notify;
pub mod poller;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_identity::{LogNotifier, Notifier};
use domain_intake::IntakeService;
use infra_db::adapters::{PgCaseStore, PgIntakeStore};
use infra_db::repositories::{
    CaseRepository, ClientRepository, EvidenceRepository, IntakeRepository, TokenRepository,
    UserRepository, VendorRepository,
};
use infra_db::FileStore;
use infra_mail::{build_http_client, MailError, OAuthClient};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{
    cases, clients, dashboard, health, intake, super_admin, users, vendor_portal, vendors,
};
use crate::notify::DeskNotifier;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub notifier: Arc<dyn Notifier>,
    pub files: FileStore,
    /// Client for the mail provider APIs
    pub http: reqwest::Client,
    pub oauth: OAuthClient,
    pub intake: IntakeService,
}

impl AppState {
    /// Wires repositories, the intake pipeline and the notifier
    ///
    /// Notifications go through the configured notifier mailbox, or to
    /// the log when none is set.
    pub fn new(pool: PgPool, config: ApiConfig) -> Result<Self, MailError> {
        let http = build_http_client()?;
        let oauth = OAuthClient::new(http.clone(), config.google_credentials(), config.microsoft_credentials());
        let files = FileStore::new(&config.upload_dir);
        let intake = IntakeService::new(
            Arc::new(PgIntakeStore::new(pool.clone(), Some(files.clone()))),
            Arc::new(PgCaseStore::new(pool.clone())),
        )
        .with_due_days(config.case_due_days);

        let notifier: Arc<dyn Notifier> = match config.notifier_address() {
            Some(address) => Arc::new(DeskNotifier::new(
                IntakeRepository::new(pool.clone()),
                http.clone(),
                oauth.clone(),
                address,
            )),
            None => Arc::new(LogNotifier),
        };

        Ok(Self { pool, config, notifier, files, http, oauth, intake })
    }

    /// Replaces the notifier, e.g. with a recording one in tests
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn tokens(&self) -> TokenRepository {
        TokenRepository::new(self.pool.clone())
    }

    pub fn vendors(&self) -> VendorRepository {
        VendorRepository::new(self.pool.clone())
    }

    pub fn cases(&self) -> CaseRepository {
        CaseRepository::new(self.pool.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn intake_records(&self) -> IntakeRepository {
        IntakeRepository::new(self.pool.clone())
    }

    pub fn evidence(&self) -> EvidenceRepository {
        EvidenceRepository::new(self.pool.clone())
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let public_auth_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/login/resend-2fa", post(handlers::auth::resend_two_factor_code))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/password/forgot", post(handlers::auth::forgot_password))
        .route("/auth/password/forgot-link", post(handlers::auth::forgot_password_link))
        .route("/auth/password/verify-code", post(handlers::auth::verify_reset_code))
        .route("/auth/password/reset", post(handlers::auth::reset_password))
        .route("/auth/password/reset-token", post(handlers::auth::reset_password_with_token));

    let session_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/logout/all", post(handlers::auth::logout_all))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/session", get(handlers::auth::session))
        .route("/auth/token/refresh", post(handlers::auth::refresh_token))
        .route("/auth/password/change", post(handlers::auth::change_password))
        .route("/auth/2fa/status", get(handlers::auth::two_factor_status))
        .route("/auth/2fa/enable", post(handlers::auth::enable_two_factor))
        .route("/auth/2fa/verify", post(handlers::auth::verify_two_factor))
        .route("/auth/2fa/disable", post(handlers::auth::disable_two_factor));

    // Super admin routes
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/:id", get(users::get_user).put(users::update_user).delete(users::delete_user));

    let vendor_routes = Router::new()
        .route("/", get(vendors::list_vendors).post(vendors::create_vendor))
        .route(
            "/:id",
            get(vendors::get_vendor).put(vendors::update_vendor).delete(vendors::delete_vendor),
        )
        .route("/:id/activate", post(vendors::activate_vendor))
        .route("/:id/deactivate", post(vendors::deactivate_vendor));

    let super_admin_routes = Router::new()
        .route("/dashboard", get(super_admin::dashboard))
        .route("/users/stats", get(super_admin::user_stats))
        .route("/vendors/stats", get(super_admin::vendor_stats));

    // Admin routes
    let case_routes = Router::new()
        .route("/", get(cases::list_cases).post(cases::create_case))
        .route("/:id", get(cases::get_case))
        .route("/:id/status", put(cases::update_status))
        .route("/:id/assign", post(cases::assign_vendor))
        .route("/:id/auto-assign-vendor", post(cases::auto_assign_vendor))
        .route("/:id/checklist", put(cases::update_checklist))
        .route("/:id/documents", get(cases::list_documents));

    let dashboard_routes = Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/case-volume", get(dashboard::case_volume))
        .route("/case-status", get(dashboard::case_status))
        .route("/recent-activity", get(dashboard::recent_activity));

    let client_routes = Router::new()
        .route("/", get(clients::list_clients).post(clients::create_client))
        .route("/:id", get(clients::get_client).put(clients::update_client));

    let intake_routes = Router::new()
        .route("/emails", get(intake::list_emails))
        .route("/emails/stats", get(intake::email_stats))
        .route("/emails/:id", get(intake::get_email))
        .route("/emails/:id/reprocess", post(intake::reprocess_email))
        .route("/messages", post(intake::ingest_message))
        .route("/poll", post(intake::poll_mailboxes))
        .route("/mailboxes", get(intake::list_mailboxes))
        .route("/mailboxes/:provider/authorize-url", get(intake::authorize_url))
        .route("/mailboxes/:provider/connect", post(intake::connect_mailbox));

    // Vendor routes
    let vendor_portal_routes = Router::new()
        .route("/cases", get(vendor_portal::list_cases))
        .route("/cases/:id", get(vendor_portal::get_case))
        .route(
            "/cases/:id/evidence",
            get(vendor_portal::list_evidence).post(vendor_portal::upload_evidence),
        )
        .layer(DefaultBodyLimit::max(vendor_portal::MAX_EVIDENCE_BYTES));

    // Protected API routes
    let protected_routes = Router::new()
        .merge(session_routes)
        .nest("/users", user_routes)
        .nest("/vendors", vendor_routes)
        .nest("/super-admin", super_admin_routes)
        .nest("/cases", case_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/clients", client_routes)
        .nest("/intake", intake_routes)
        .nest("/vendor", vendor_portal_routes)
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .merge(public_auth_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
