//! HTTP API.
//!
//! A JSON API over [`Storage`], served with axum. Storage calls run on the
//! blocking pool behind a single mutex; that one connection is the whole
//! concurrency model. A background task applies announcement publish and
//! archive times every `server.announcement_refresh_secs`.

mod auth;
mod error;
mod extract;
mod handlers;

use std::sync::{Arc, Mutex};

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use chrono::{Local, NaiveDate, Utc};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mail::{LogMailer, Mailer};
use crate::storage::Storage;

pub use auth::{AdminUser, AuthUser};
pub use error::ApiError;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The record store.
    pub storage: Arc<Mutex<Storage>>,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Outgoing mail.
    pub mailer: Arc<dyn Mailer>,
    signer: Arc<TokenSigner>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the shared state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no token secret is configured.
    pub fn new(storage: Storage, config: Config, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let signer = TokenSigner::new(config.token_secret()?);
        Ok(Self {
            storage: Arc::new(Mutex::new(storage)),
            config: Arc::new(config),
            mailer,
            signer: Arc::new(signer),
        })
    }

    pub(crate) fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Run a storage call on the blocking pool.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let storage = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            f(&storage)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

/// The calendar date used for ages, codes and validity periods.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    use handlers::{accounts, announcements, complaints, documents, households, residents};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/stats", get(handlers::stats))
        // Auth
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/password/forgot", post(handlers::auth::forgot_password))
        .route("/api/auth/password/reset", post(handlers::auth::reset_password))
        .route("/api/auth/password/change", post(handlers::auth::change_password))
        // Residents
        .route("/api/residents", get(residents::list).post(residents::register))
        .route(
            "/api/residents/:code",
            get(residents::get)
                .patch(residents::update)
                .delete(residents::delete),
        )
        .route("/api/residents/:code/status", post(residents::set_status))
        // Households
        .route("/api/households", get(households::list).post(households::create))
        .route(
            "/api/households/:code",
            get(households::get)
                .patch(households::update)
                .delete(households::delete),
        )
        .route(
            "/api/households/:code/members/:resident",
            post(households::add_member).delete(households::remove_member),
        )
        .route("/api/households/:code/head/:resident", post(households::set_head))
        // Documents
        .route("/api/documents", get(documents::list).post(documents::request))
        .route("/api/documents/export", get(documents::export))
        .route("/api/documents/:number", get(documents::get))
        .route("/api/documents/:number/approve", post(documents::approve))
        .route("/api/documents/:number/reject", post(documents::reject))
        .route("/api/documents/:number/release", post(documents::release))
        .route("/api/documents/:number/certificate", get(documents::certificate))
        // Announcements
        .route("/api/announcements/public", get(announcements::public))
        .route(
            "/api/announcements",
            get(announcements::list).post(announcements::create),
        )
        .route(
            "/api/announcements/:id",
            get(announcements::get)
                .patch(announcements::update)
                .delete(announcements::delete),
        )
        .route("/api/announcements/:id/archive", post(announcements::archive))
        // Complaints
        .route("/api/complaints", get(complaints::list).post(complaints::file))
        .route(
            "/api/complaints/:case",
            get(complaints::get).delete(complaints::delete),
        )
        .route("/api/complaints/:case/transition", post(complaints::transition))
        // Accounts
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route("/api/accounts/:username/active", post(accounts::set_active))
        .route("/api/accounts/:username/role", post(accounts::set_role))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open storage and serve the API until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the configuration has no token secret, the database
/// can't be opened, or the listener can't bind.
pub async fn serve(config: Config) -> Result<()> {
    config.validate()?;
    let storage = Storage::open(config.database_path())?;
    let state = AppState::new(storage, config, Arc::new(LogMailer))?;

    let refresher = tokio::spawn(refresh_announcements(state.clone()));

    let address = state.config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Barangay records API listening on http://{}", address);

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    refresher.abort();
    info!("Server stopped");
    served.map_err(Error::from)
}

/// Apply announcement publish and archive times on a fixed interval.
async fn refresh_announcements(state: AppState) {
    let mut interval = tokio::time::interval(state.config.announcement_refresh_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match state
            .run(|storage| storage.refresh_announcements(Utc::now()))
            .await
        {
            Ok(outcome) if outcome.published + outcome.archived > 0 => info!(
                "Announcements refreshed: {} published, {} archived",
                outcome.published, outcome.archived
            ),
            Ok(_) => debug!("No announcements due"),
            Err(e) => error!("Announcement refresh failed: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl-C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
