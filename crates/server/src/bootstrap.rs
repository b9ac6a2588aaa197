use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tracing::info;

use tia_agent::{AgentRuntime, CatalogToolkit, OpenAiChatClient, SessionStore};
use tia_core::config::{AppConfig, ConfigError, LoadOptions};
use tia_core::render::TextTableRenderer;
use tia_db::{connect, migrations, CatalogStore, DbPool};
use tia_whatsapp::{router as webhook_router, WebhookState, WhatsAppClient};

use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Wires the full inbound path: pool, migrations, catalog tools, agent
/// runtime, WhatsApp client, and the combined webhook + health router.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    // Serving chat traffic needs outbound credentials; fail before binding.
    config.validate_transport()?;

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let store = CatalogStore::new(db_pool.clone());
    let registry = CatalogToolkit::registry(
        store,
        Arc::new(TextTableRenderer),
        config.advisor.recommendation_limit,
    );

    let llm = OpenAiChatClient::new(
        config.llm.base_url.clone(),
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.timeout_secs,
        config.llm.temperature,
    )
    .map_err(BootstrapError::Llm)?;

    let runtime = AgentRuntime::new(
        Arc::new(llm),
        registry,
        SessionStore::new(config.advisor.history_window),
    );

    let client = WhatsAppClient::new(
        config.whatsapp.access_token.clone(),
        config.whatsapp.phone_number_id.clone(),
        config.whatsapp.api_version.clone(),
    );

    let webhook_state = Arc::new(WebhookState {
        runtime,
        client,
        verify_token: config.whatsapp.verify_token.clone(),
    });

    let router = webhook_router(webhook_state).merge(health::router(db_pool.clone()));
    info!(event_name = "system.bootstrap.ready", "inbound routes wired");

    Ok(Application { config, db_pool, router })
}

#[cfg(test)]
mod tests {
    use tia_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_without_transport_credentials() {
        // Default config carries no WhatsApp or LLM secrets.
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("whatsapp"));
    }
}
