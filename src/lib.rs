pub mod auth;
pub mod blogs;
pub mod comments;
pub mod config;
pub mod core;
pub mod external;
pub mod likes;
pub mod models;
pub mod notifications;
pub mod router;
pub mod static_server;
pub mod upload;
pub mod users;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`. Later
/// calls are no-ops.
pub fn init_logging() {
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
}

// === Component entrypoint ===

#[cfg(target_arch = "wasm32")]
#[spin_sdk::http_component]
async fn handle(req: spin_sdk::http::Request) -> anyhow::Result<impl spin_sdk::http::IntoResponse> {
    init_logging();

    let config = config::AppConfig::load();
    let store = spin_sdk::key_value::Store::open_default()?;
    if config.seed_demo {
        if let Err(e) = crate::core::db::seed_demo_data(&store) {
            tracing::warn!("Demo data not seeded: {}", e);
        }
    }

    let ctx = router::AppContext::from_config(store, config);
    Ok(router::route(&ctx, req).await)
}
