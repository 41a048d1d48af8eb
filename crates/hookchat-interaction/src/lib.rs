//! HTTP clients for the remote services hookchat depends on: the n8n chat
//! and title webhooks and the IP geolocation lookup.

mod http;
pub mod ipinfo_geo_locator;
pub mod reply;
pub mod webhook_chat_gateway;
pub mod webhook_title_generator;

pub use crate::ipinfo_geo_locator::IpInfoGeoLocator;
pub use crate::webhook_chat_gateway::WebhookChatGateway;
pub use crate::webhook_title_generator::WebhookTitleGenerator;
