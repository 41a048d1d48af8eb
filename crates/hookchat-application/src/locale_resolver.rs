//! Picks the UI language on start-up.
//!
//! A stored choice wins. Otherwise the country of the caller's IP decides,
//! with bounded retries; any failure settles on English.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use hookchat_core::Locale;
use hookchat_core::gateway::{FailureCategory, GatewayError, GeoLocator};
use hookchat_core::state::StateRepository;

/// Retry schedule for the geolocation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound for one attempt, on top of the client's own timeout.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleState {
    Unresolved,
    /// Taken from the stored choice.
    Cached(Locale),
    Detecting,
    /// Settled by detection, an explicit choice, or the English default.
    Resolved { locale: Locale, detected: bool },
}

impl LocaleState {
    pub fn locale(&self) -> Option<Locale> {
        match self {
            Self::Cached(locale) | Self::Resolved { locale, .. } => Some(*locale),
            Self::Unresolved | Self::Detecting => None,
        }
    }
}

pub struct LocaleResolver {
    state_repository: Arc<dyn StateRepository>,
    geo_locator: Arc<dyn GeoLocator>,
    policy: RetryPolicy,
    state: RwLock<LocaleState>,
}

impl LocaleResolver {
    pub fn new(
        state_repository: Arc<dyn StateRepository>,
        geo_locator: Arc<dyn GeoLocator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            state_repository,
            geo_locator,
            policy,
            state: RwLock::new(LocaleState::Unresolved),
        }
    }

    pub async fn state(&self) -> LocaleState {
        *self.state.read().await
    }

    /// Returns the locale to use, resolving it on first call.
    pub async fn resolve(&self) -> Locale {
        if let Some(locale) = self.state().await.locale() {
            return locale;
        }

        if let Some(locale) = self.state_repository.get_language().await {
            tracing::debug!(%locale, "[LocaleResolver] Using stored language");
            *self.state.write().await = LocaleState::Cached(locale);
            return locale;
        }

        *self.state.write().await = LocaleState::Detecting;
        match self.detect_country().await {
            Some(country) => {
                let locale = Locale::from_country_code(&country);
                tracing::info!(%country, %locale, "[LocaleResolver] Detected language from location");
                self.state_repository.set_language(locale).await;
                *self.state.write().await = LocaleState::Resolved {
                    locale,
                    detected: true,
                };
                locale
            }
            None => {
                let locale = Locale::default();
                *self.state.write().await = LocaleState::Resolved {
                    locale,
                    detected: false,
                };
                locale
            }
        }
    }

    /// Explicit user choice; overrides and persists.
    pub async fn set_locale(&self, locale: Locale) {
        self.state_repository.set_language(locale).await;
        *self.state.write().await = LocaleState::Resolved {
            locale,
            detected: false,
        };
    }

    async fn detect_country(&self) -> Option<String> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            let result = tokio::time::timeout(self.policy.attempt_timeout, self.geo_locator.country_code())
                .await
                .unwrap_or_else(|_| Err(GatewayError::Network("geolocation timed out".to_string())));

            match result {
                Ok(country) => return Some(country),
                Err(e) if attempt < attempts && is_transient(&e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(attempt, error = %e, ?delay, "[LocaleResolver] Geolocation failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "[LocaleResolver] Geolocation failed, using default language");
                    return None;
                }
            }
        }
        None
    }
}

fn is_transient(err: &GatewayError) -> bool {
    matches!(
        err.category(),
        FailureCategory::Network | FailureCategory::Server
    )
}
