//! Wiring of config, stores, gateways and services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use hookchat_application::{
    ChatEvent, ConversationService, LocaleResolver, RetryPolicy, SettingsService,
};
use hookchat_core::Locale;
use hookchat_core::state::StateRepository;
use hookchat_infrastructure::config::GeoConfig;
use hookchat_infrastructure::{
    AppConfig, JsonConversationRepository, JsonSettingsRepository, LocalStore,
    StateRepositoryImpl,
};
use hookchat_interaction::{IpInfoGeoLocator, WebhookChatGateway, WebhookTitleGenerator};

use crate::render::Palette;

/// Everything a command needs.
pub struct App {
    pub conversations: ConversationService,
    pub settings: Arc<SettingsService>,
    pub locale: Arc<LocaleResolver>,
    pub events: mpsc::UnboundedReceiver<ChatEvent>,
}

impl App {
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let store_dir = config
            .resolve_data_dir()
            .context("Failed to resolve the data directory")?;
        tracing::info!(store = %store_dir.display(), chat_webhook = %config.chat_webhook_url, "[App] Starting");

        let store = LocalStore::new(store_dir);
        let keys = &config.storage;
        let conversation_repository = Arc::new(JsonConversationRepository::new(
            store.clone(),
            keys.conversations.clone(),
        ));
        let state_repository: Arc<dyn StateRepository> =
            Arc::new(StateRepositoryImpl::new(store.clone(), keys));
        let settings_repository = Arc::new(JsonSettingsRepository::new(store, keys.settings.clone()));

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let gateway = Arc::new(WebhookChatGateway::new(
            config.chat_webhook_url.clone(),
            timeout,
        ));
        let titles = Arc::new(WebhookTitleGenerator::new(
            config.title_webhook_url.clone(),
            timeout,
        ));
        let geo = Arc::new(IpInfoGeoLocator::new(
            config.geo.url.clone(),
            config.geo.token.clone(),
            Duration::from_millis(config.geo.timeout_ms),
        ));

        let (tx, events) = mpsc::unbounded_channel();
        let conversations = ConversationService::new(
            conversation_repository,
            state_repository.clone(),
            gateway,
            titles,
            Locale::default(),
        )
        .with_events(tx);

        Ok(Self {
            conversations,
            settings: Arc::new(SettingsService::load(settings_repository).await),
            locale: Arc::new(LocaleResolver::new(
                state_repository,
                geo,
                retry_policy(&config.geo),
            )),
            events,
        })
    }

    /// Resolves the UI language and hands it to the conversation service.
    pub async fn resolve_locale(&self) -> Locale {
        let locale = self.locale.resolve().await;
        self.conversations.set_locale(locale).await;
        locale
    }

    pub async fn palette(&self) -> Palette {
        Palette::for_mode(self.settings.current().await.dark_mode)
    }
}

fn retry_policy(geo: &GeoConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: geo.max_attempts,
        base_delay: Duration::from_millis(geo.backoff_base_ms),
        attempt_timeout: Duration::from_millis(geo.timeout_ms),
    }
}
