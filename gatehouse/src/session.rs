//! Session store: browser connection, per-service page handles, auth state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ServiceId;
use crate::errors::NavigationError;
use crate::page::{BrowserConnection, BrowserLauncher, Page};

/// Owns the browser connection and every page handle the machine tracks.
///
/// One session supports one navigation/login sequence at a time; callers
/// serialize requests (a single dispatch queue per session). The session
/// itself only guards its internal maps.
pub struct Session {
    launcher: Arc<dyn BrowserLauncher>,
    inner: Mutex<Inner>,
    authenticated: AtomicBool,
    closing: AtomicBool,
}

#[derive(Default)]
struct Inner {
    connection: Option<Arc<dyn BrowserConnection>>,
    /// The tab currently driving portal navigation.
    active: Option<Arc<dyn Page>>,
    /// Verified per-service tabs. Never holds a closed handle beyond one
    /// access cycle: every read validates and evicts.
    pages: HashMap<ServiceId, Arc<dyn Page>>,
}

impl Session {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            inner: Mutex::new(Inner::default()),
            authenticated: AtomicBool::new(false),
            closing: AtomicBool::new(false),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    /// Monotonic: once closing, always closing.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// The live browser connection, (re)launched on demand.
    ///
    /// A relaunch invalidates every tracked page and the authenticated flag;
    /// cookies do not survive the browser process.
    pub async fn connection(&self) -> Result<Arc<dyn BrowserConnection>, NavigationError> {
        let mut inner = self.inner.lock().await;
        self.connection_locked(&mut inner).await
    }

    async fn connection_locked(
        &self,
        inner: &mut Inner,
    ) -> Result<Arc<dyn BrowserConnection>, NavigationError> {
        if self.is_closing() {
            return Err(NavigationError::ConnectionLost(
                "session is closing".to_string(),
            ));
        }
        if let Some(connection) = &inner.connection {
            if connection.is_connected() {
                return Ok(connection.clone());
            }
            warn!("browser connection is gone, relaunching");
            inner.connection = None;
            inner.active = None;
            inner.pages.clear();
            self.set_authenticated(false);
        }
        let connection = self.launcher.launch().await?;
        info!("browser connection established");
        inner.connection = Some(connection.clone());
        Ok(connection)
    }

    /// The tab driving navigation, replaced transparently when closed.
    pub async fn active_page(&self) -> Result<Arc<dyn Page>, NavigationError> {
        let mut inner = self.inner.lock().await;
        if let Some(page) = &inner.active {
            if !page.is_closed() {
                return Ok(page.clone());
            }
            debug!("active page is closed, opening a replacement");
            inner.active = None;
        }
        let connection = self.connection_locked(&mut inner).await?;
        let page = connection.new_page().await?;
        inner.active = Some(page.clone());
        Ok(page)
    }

    /// Make `page` the tab that drives subsequent navigation.
    pub async fn adopt_active(&self, page: Arc<dyn Page>) {
        let mut inner = self.inner.lock().await;
        inner.active = Some(page);
    }

    /// The tracked tab for `service`, if it is still open.
    pub async fn service_page(&self, service: ServiceId) -> Option<Arc<dyn Page>> {
        let mut inner = self.inner.lock().await;
        match inner.pages.get(&service) {
            Some(page) if !page.is_closed() => Some(page.clone()),
            Some(_) => {
                debug!(%service, "evicting closed service page");
                inner.pages.remove(&service);
                None
            }
            None => None,
        }
    }

    pub async fn track_page(&self, service: ServiceId, page: Arc<dyn Page>) {
        let mut inner = self.inner.lock().await;
        inner.pages.insert(service, page);
    }

    /// All open tabs of the current connection; best-effort, used for the
    /// reuse scan.
    pub async fn open_tabs(&self) -> Vec<Arc<dyn Page>> {
        let connection = {
            let inner = self.inner.lock().await;
            inner.connection.clone()
        };
        let Some(connection) = connection else {
            return Vec::new();
        };
        if !connection.is_connected() {
            return Vec::new();
        }
        match connection.pages().await {
            Ok(pages) => pages.into_iter().filter(|p| !p.is_closed()).collect(),
            Err(e) => {
                debug!(error = %e, "open-tab scan failed");
                Vec::new()
            }
        }
    }

    /// Cross-service safety valve: close the browser connection entirely so
    /// the next navigation rebuilds everything from a cold state.
    ///
    /// Any page handle held outside the session is invalid afterwards.
    pub async fn reset_for_service_switch(&self) {
        warn!("resetting browser session for service switch");
        self.teardown_connection().await;
    }

    /// Drop a broken connection so the next access relaunches.
    pub async fn invalidate_connection(&self) {
        warn!("discarding browser connection after a connection loss");
        self.teardown_connection().await;
    }

    async fn teardown_connection(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(connection) = inner.connection.take() {
            if let Err(e) = connection.close().await {
                debug!(error = %e, "error while closing browser connection");
            }
        }
        inner.active = None;
        inner.pages.clear();
        self.set_authenticated(false);
    }

    /// Terminal teardown. Idempotent; sets `closing` before touching the
    /// browser so in-flight loops observe it.
    pub async fn shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        info!("shutting down browser session");
        self.teardown_connection().await;
    }
}
