use std::sync::Arc;

use tracing::{error, info, warn};

use alumni_connect::auth::permission::visible_pages;
use alumni_connect::config::Backend;
use alumni_connect::{Config, DataService, MemoryDataService, RestDataService, SessionStore};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = alumni_connect::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        alumni_connect::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    info!("AlumniConnect starting");
    match config.remote.backend {
        Backend::Memory => {
            info!("Using in-process data service");
            run(MemoryDataService::new()).await;
        }
        Backend::Rest => match RestDataService::from_config(&config.remote) {
            Ok(service) => {
                info!(url = %config.remote.url, "Using hosted data service");
                run(service).await;
            }
            Err(e) => {
                error!("Failed to create data service client: {e}");
                std::process::exit(1);
            }
        },
    }
}

async fn run<S: DataService + 'static>(service: S) {
    let store = Arc::new(SessionStore::new(service));
    let listener = store.spawn_auth_listener();

    if let Err(e) = store.restore_session().await {
        warn!("Session restore failed: {e}");
    }
    let snapshot = store.wait_ready().await;

    match snapshot.profile() {
        Some(profile) => info!(
            user = %profile.full_name,
            role = %profile.role(),
            approved = profile.is_effectively_approved(),
            "Signed in"
        ),
        None if snapshot.is_degraded() => warn!("Signed in without a profile"),
        None => info!("No active session"),
    }

    let pages: Vec<&str> = visible_pages(snapshot.profile())
        .iter()
        .map(|page| page.path())
        .collect();
    info!(state = %snapshot.state(), pages = ?pages, "Session ready");

    listener.abort();
}
