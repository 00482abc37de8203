use finance_hub::{
    auth::{gotrue::GoTrueProvider, profile::ProfileStore, session::SessionManager},
    config::{auth::AuthConfig, database, settings},
    core::{category, filter::TransactionFilter, metrics::CurrencyStyle, report},
    errors::{Error, Result},
    prefs::PreferenceStore,
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_PREFS_PATH: &str = "data/preferences.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml and the local preference file
    let app_config = settings::load_default_config()?;
    let prefs_path = env::var("FINANCE_PREFS").unwrap_or_else(|_| DEFAULT_PREFS_PATH.to_string());
    let currency = CurrencyStyle::from(&app_config.display);
    let prefs = PreferenceStore::open_with_defaults(prefs_path, app_config.categories);
    info!("Interface language: {:?}", prefs.language());

    // 4. Connect and make sure the schema exists
    let db = Arc::new(
        database::create_connection()
            .await
            .inspect(|_| info!("Database connected"))
            .inspect_err(|e| error!("Failed to connect to the database: {e}"))?,
    );
    database::create_tables(&db).await?;

    // 5. Without an auth provider there is nobody to report for
    let auth_config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            info!("{e}; skipping sign-in");
            return Ok(());
        }
    };

    let provider = Arc::new(GoTrueProvider::new(auth_config, reqwest::Client::new()));
    let profiles: Arc<dyn ProfileStore> = db.clone();
    let sessions = Arc::new(SessionManager::new(provider, profiles));
    let listener = sessions.spawn_listener();
    sessions.initialize().await?;

    // 6. Sign in and print the dashboard
    let email = env::var("FINANCE_EMAIL")
        .inspect_err(|e| error!("FINANCE_EMAIL not found: {e}"))
        .map_err(Error::EnvVar)?;
    let password = env::var("FINANCE_PASSWORD")
        .inspect_err(|e| error!("FINANCE_PASSWORD not found: {e}"))
        .map_err(Error::EnvVar)?;
    let user = sessions.login(&email, &password).await?;

    category::seed_default_categories(&db, &user.id, prefs.categories()).await?;
    let dashboard =
        report::generate_dashboard(&db, &user.id, &TransactionFilter::default()).await?;
    info!("\n{}", report::format_dashboard_summary(&dashboard, &currency));

    sessions.logout().await?;
    listener.abort();
    Ok(())
}
