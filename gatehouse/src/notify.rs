//! Operator notification channel.
//!
//! The core never talks to a GUI; it emits events into a sink. The desktop
//! front end maps these to dialogs, the CLI and tests map them to logs.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ServiceId;

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorEvent {
    /// No credential is available; a human must complete the login.
    ManualLoginRequired { portal_login_url: String },
    /// Periodic heartbeat while waiting out a manual login.
    LoginProgress { waited: Duration },
    LoginConfirmed,
    NavigationSucceeded {
        service: ServiceId,
        display_name: String,
    },
    /// Exactly one of these per fatal navigation failure.
    NavigationFailed {
        service: ServiceId,
        display_name: String,
        reason: String,
        remedy: String,
    },
    /// The session was torn down to cross between independently-sessioned
    /// services.
    SessionReset,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: OperatorEvent);
}

/// Notification sink that renders events as structured log lines.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: OperatorEvent) {
        match event {
            OperatorEvent::ManualLoginRequired { portal_login_url } => {
                tracing::warn!(url = %portal_login_url, "manual login required: complete the login in the browser window");
            }
            OperatorEvent::LoginProgress { waited } => {
                tracing::info!(waited_secs = waited.as_secs(), "still waiting for login to complete");
            }
            OperatorEvent::LoginConfirmed => {
                tracing::info!("portal login confirmed");
            }
            OperatorEvent::NavigationSucceeded { service, display_name } => {
                tracing::info!(%service, %display_name, "service page ready");
            }
            OperatorEvent::NavigationFailed {
                service,
                display_name,
                reason,
                remedy,
            } => {
                tracing::error!(%service, %display_name, %reason, %remedy, "navigation failed");
            }
            OperatorEvent::SessionReset => {
                tracing::warn!("browser session was reset; previously returned page handles are invalid");
            }
        }
    }
}
