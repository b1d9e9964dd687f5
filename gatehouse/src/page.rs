//! Capability surface consumed from the browser-automation collaborator.
//!
//! The state machine never drives a DOM directly; it talks to these traits.
//! Production code plugs in a real driver (CDP, WebDriver, a Playwright
//! sidecar); tests plug in scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::NavigationError;
use crate::selector::Selector;

/// A single open browser tab.
///
/// Handles are cheap to clone (`Arc`) but exclusively owned by the
/// [`Session`](crate::session::Session) for navigation purposes: no caller may
/// navigate a tracked page without going through the navigator, or the
/// classified state and the actual page state diverge.
#[async_trait]
pub trait Page: Send + Sync {
    async fn current_url(&self) -> Result<String, NavigationError>;

    async fn goto(&self, url: &str) -> Result<(), NavigationError>;

    async fn reload(&self) -> Result<(), NavigationError>;

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), NavigationError>;

    async fn wait_for_selector(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<(), NavigationError>;

    async fn click(&self, selector: &Selector) -> Result<(), NavigationError>;

    async fn fill(&self, selector: &Selector, text: &str) -> Result<(), NavigationError>;

    /// Wait for a popup (new tab) opened by the last interaction.
    ///
    /// Returns `Timeout` when no popup appears; same-tab navigations are the
    /// caller's fallback in that case.
    async fn wait_for_popup(&self, timeout: Duration) -> Result<Arc<dyn Page>, NavigationError>;

    async fn bring_to_front(&self) -> Result<(), NavigationError>;

    fn is_closed(&self) -> bool;

    async fn close(&self) -> Result<(), NavigationError>;
}

/// One live browser process/context with shared cookies across its tabs.
#[async_trait]
pub trait BrowserConnection: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn new_page(&self) -> Result<Arc<dyn Page>, NavigationError>;

    /// All currently open tabs, in creation order.
    async fn pages(&self) -> Result<Vec<Arc<dyn Page>>, NavigationError>;

    async fn close(&self) -> Result<(), NavigationError>;
}

/// Factory used by the session to (re)establish a browser connection.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserConnection>, NavigationError>;
}
