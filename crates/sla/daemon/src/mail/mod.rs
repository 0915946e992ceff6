//! Mail transports

mod log;
mod webhook;

pub use self::log::LogMailTransport;
pub use self::webhook::WebhookMailTransport;
