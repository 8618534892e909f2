use std::sync::Arc;

use adfeed::access::{Access, authorize};
use adfeed::auth::AuthProvider;
use adfeed::auth::postgres::PgAuthProvider;
use adfeed::auth::rest::RestAuthProvider;
use adfeed::config::{AppConfig, Backend};
use adfeed::profile::ProfileStore;
use adfeed::profile::postgres::PgProfileStore;
use adfeed::profile::rest::RestProfileStore;
use adfeed::rest::RestClient;
use adfeed::{SessionBootstrapper, db};

type Collaborators = (Arc<dyn AuthProvider>, Arc<dyn ProfileStore>);

async fn build_backend(backend: Backend) -> Result<Collaborators, Box<dyn std::error::Error>> {
    match backend {
        Backend::Postgres { database_url, session_token } => {
            let pool = db::connect(&database_url).await?;
            let auth = PgAuthProvider::new(pool.clone(), session_token);
            Ok((Arc::new(auth), Arc::new(PgProfileStore::new(pool))))
        }
        Backend::Rest { url, anon_key, access_token, http_timeout } => {
            let client = RestClient::new(&url, anon_key, http_timeout)?;
            let auth = RestAuthProvider::new(client.clone(), access_token);
            Ok((Arc::new(auth), Arc::new(RestProfileStore::new(client))))
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let (auth, profiles) = build_backend(config.backend)
        .await
        .expect("backend init failed");

    let boot = SessionBootstrapper::start(auth, profiles, config.bootstrap);

    // Loading screen: report each transition until bootstrap finishes.
    let mut rx = boot.watch();
    let loading_screen = tokio::spawn(async move {
        loop {
            {
                let state = rx.borrow_and_update();
                tracing::info!(progress = state.progress, message = %state.message, "loading");
                if !state.loading {
                    break;
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    });

    let state = boot.ready().await;
    let _ = loading_screen.await;

    match (&state.user, &state.error) {
        (Some(user), _) => tracing::info!(user_id = %user.id, email = ?user.email, route = "home", "session resolved"),
        (None, Some(err)) => tracing::warn!(code = err.code(), reason = %err, route = "login", "session not resolved"),
        (None, None) => tracing::info!(route = "login", "no active session"),
    }
    let admin = authorize(&state, &["admin"]) == Access::Granted;
    tracing::info!(admin, "admin panel access");

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    boot.stop().await;
}
