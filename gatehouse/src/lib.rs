//! Session and navigation state machine for a multi-portal login landscape.
//!
//! A central identity portal gates two independently-sessioned downstream
//! services. This crate classifies where the browser currently is, decides
//! whether credentials can be supplied silently or a human must act, waits
//! out login completion without false positives, navigates to a requested
//! service, and recovers from broken connections and cross-domain session
//! mismatches.
//!
//! Browser/DOM primitives are not implemented here: the machine drives the
//! [`Page`]/[`BrowserConnection`] capability traits supplied by a driver.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub mod config;
pub mod credentials;
pub mod errors;
pub mod login;
pub mod navigator;
pub mod notify;
pub mod page;
pub mod selector;
pub mod session;
pub mod state;
#[cfg(test)]
mod tests;

pub use config::{
    PortalConfig, ServiceCatalog, ServiceId, ServiceProfile, SessionScope, Timeouts,
};
pub use credentials::{default_credential_path, CredentialSource, FileCredentialSource, Secret};
pub use errors::NavigationError;
pub use login::{LoginCoordinator, LoginOutcome};
pub use navigator::ServiceNavigator;
pub use notify::{LogNotifier, Notifier, OperatorEvent};
pub use page::{BrowserConnection, BrowserLauncher, Page};
pub use selector::Selector;
pub use session::Session;
pub use state::{classify, NavigationState};

/// The main entry point: one explicitly constructed portal automation
/// session with clear ownership of the browser connection.
///
/// There is deliberately no global instance; construct one, keep it for the
/// process lifetime, and serialize navigation requests against it.
pub struct Portal {
    config: Arc<PortalConfig>,
    session: Arc<Session>,
    navigator: ServiceNavigator,
    login: LoginCoordinator,
    cancel: CancellationToken,
}

impl Portal {
    pub fn new(
        config: PortalConfig,
        launcher: Arc<dyn BrowserLauncher>,
        credentials: Arc<dyn CredentialSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config);
        let cancel = CancellationToken::new();
        let session = Arc::new(Session::new(launcher));
        let login = LoginCoordinator::new(
            config.clone(),
            credentials,
            notifier.clone(),
            cancel.clone(),
        );
        let navigator = ServiceNavigator::new(
            config.clone(),
            session.clone(),
            login.clone(),
            notifier,
        );
        Self {
            config,
            session,
            navigator,
            login,
            cancel,
        }
    }

    /// Convenience constructor using the file-based credential source from
    /// the config (or the platform default path).
    pub fn with_file_credentials(
        config: PortalConfig,
        launcher: Arc<dyn BrowserLauncher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let credentials = Arc::new(FileCredentialSource::from_config(&config));
        Self::new(config, launcher, credentials, notifier)
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Navigate to the requested service; see [`ServiceNavigator::navigate_to`].
    pub async fn navigate_to(
        &self,
        service: ServiceId,
    ) -> Result<Arc<dyn Page>, NavigationError> {
        self.navigator.navigate_to(service).await
    }

    /// Establish a portal login on the active tab without navigating further.
    pub async fn ensure_logged_in(&self) -> LoginOutcome {
        match self.session.active_page().await {
            Ok(page) => self.login.ensure_logged_in(&self.session, &page).await,
            Err(NavigationError::ConnectionLost(reason)) => LoginOutcome::ConnectionLost(reason),
            Err(e) => LoginOutcome::Failed(e.to_string()),
        }
    }

    /// Classify the active tab's current URL. Launches the browser if none
    /// is running yet.
    pub async fn classify_here(&self) -> Result<NavigationState, NavigationError> {
        let page = self.session.active_page().await?;
        let url = page.current_url().await?;
        Ok(classify(&url, &self.config.catalog))
    }

    /// Pessimistic cross-service fallback; see
    /// [`Session::reset_for_service_switch`].
    pub async fn reset_for_service_switch(&self) {
        self.session.reset_for_service_switch().await;
    }

    /// Raise the cancel signal: polling loops return promptly instead of
    /// waiting out their timeouts. Used when the operator closes the app.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel in-flight waits and tear down the browser session.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.session.shutdown().await;
    }
}
