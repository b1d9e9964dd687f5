//! The navigation state machine: from "wherever the browser is" to "looking
//! at the requested service page".

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{PortalConfig, ServiceId, SessionScope};
use crate::errors::NavigationError;
use crate::login::{LoginCoordinator, LoginOutcome};
use crate::notify::{Notifier, OperatorEvent};
use crate::page::Page;
use crate::selector::Selector;
use crate::session::Session;
use crate::state::{classify, NavigationState};

/// Cycle guard for one navigation request. Every legitimate path reaches the
/// target in far fewer hops.
const MAX_TRANSITIONS: usize = 8;

pub struct ServiceNavigator {
    config: Arc<PortalConfig>,
    session: Arc<Session>,
    login: LoginCoordinator,
    notifier: Arc<dyn Notifier>,
}

impl ServiceNavigator {
    pub fn new(
        config: Arc<PortalConfig>,
        session: Arc<Session>,
        login: LoginCoordinator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            session,
            login,
            notifier,
        }
    }

    /// Bring the browser to the requested service and return its tab.
    ///
    /// Every outcome, success or fatal failure, produces exactly one operator
    /// notification; errors additionally carry a suggested manual remedy.
    pub async fn navigate_to(
        &self,
        service: ServiceId,
    ) -> Result<Arc<dyn Page>, NavigationError> {
        let display_name = self.config.catalog.service(service).display_name.clone();
        let result = self.navigate_inner(service).await;
        match &result {
            Ok(_) => {
                self.notifier
                    .notify(OperatorEvent::NavigationSucceeded {
                        service,
                        display_name,
                    })
                    .await;
            }
            Err(e) => {
                self.notifier
                    .notify(OperatorEvent::NavigationFailed {
                        service,
                        display_name,
                        reason: e.to_string(),
                        remedy: e.suggested_remedy().to_string(),
                    })
                    .await;
            }
        }
        result
    }

    async fn navigate_inner(
        &self,
        service: ServiceId,
    ) -> Result<Arc<dyn Page>, NavigationError> {
        if let Some(page) = self.find_existing(service).await {
            debug!(%service, "reusing existing service tab");
            return Ok(page);
        }

        let mut reconnected = false;
        let mut reset_done = false;
        loop {
            match self.run_machine(service).await {
                Ok(page) => return Ok(page),
                Err(NavigationError::ConnectionLost(reason))
                    if !reconnected && !self.session.is_closing() =>
                {
                    reconnected = true;
                    warn!(%reason, "connection lost mid-navigation, reconnecting once");
                    self.session.invalidate_connection().await;
                }
                Err(e @ NavigationError::SessionMismatch { .. }) if !reset_done => {
                    reset_done = true;
                    warn!(error = %e, "cross-service session mismatch, retrying from a cold session");
                    self.session.reset_for_service_switch().await;
                    self.notifier.notify(OperatorEvent::SessionReset).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// True when `url` is a usable page of `service`: on the service host
    /// and not its own login/SSO variant.
    fn is_usable_landing(&self, url: &str, service: ServiceId) -> bool {
        let catalog = &self.config.catalog;
        classify(url, catalog).is_on(service)
            && !catalog.service(service).is_login_redirect(url)
    }

    /// Reuse path: a tracked handle or any open tab already sitting on the
    /// target service. Performs zero navigations.
    async fn find_existing(&self, service: ServiceId) -> Option<Arc<dyn Page>> {
        if let Some(page) = self.session.service_page(service).await {
            if let Ok(url) = page.current_url().await {
                if self.is_usable_landing(&url, service) {
                    let _ = page.bring_to_front().await;
                    return Some(page);
                }
            }
        }
        for page in self.session.open_tabs().await {
            if let Ok(url) = page.current_url().await {
                if self.is_usable_landing(&url, service) {
                    debug!(%service, "adopting an already-open service tab");
                    let _ = page.bring_to_front().await;
                    self.session.track_page(service, page.clone()).await;
                    return Some(page);
                }
            }
        }
        None
    }

    async fn run_machine(&self, service: ServiceId) -> Result<Arc<dyn Page>, NavigationError> {
        let catalog = &self.config.catalog;
        let timeouts = &self.config.timeouts;
        let profile = catalog.service(service);
        let mut unknown_attempted = false;
        let mut link_retry_done = false;

        for _ in 0..MAX_TRANSITIONS {
            if self.session.is_closing() {
                return Err(NavigationError::ConnectionLost(
                    "session is closing".to_string(),
                ));
            }

            let page = self.session.active_page().await?;
            let url = page.current_url().await?;
            let state = classify(&url, catalog);
            debug!(%url, ?state, %service, "classified current page");

            match state {
                NavigationState::OnService(s) if s == service => {
                    if profile.is_login_redirect(&url) {
                        // The service bounced the tab to its own login
                        // variant; the portal session did not carry over.
                        // Route back through the portal to get a fresh link.
                        warn!(%url, "landed on the service's login redirect, routing via the portal");
                        page.goto(&catalog.portal_home_url).await?;
                        page.wait_for_network_idle(timeouts.network_idle()).await?;
                        continue;
                    }
                    page.bring_to_front().await?;
                    self.session.track_page(service, page.clone()).await;
                    return Ok(page);
                }
                NavigationState::OnService(other) => {
                    // Portal-issued tokens can be scoped narrowly; a direct
                    // cross-domain goto may land on the wrong login variant.
                    // Either reset (isolated policy) or route via the portal.
                    if self.config.session_scope == SessionScope::Isolated
                        && self.session.is_authenticated()
                    {
                        info!(from = %other, "isolated session scope, resetting before the switch");
                        self.session.reset_for_service_switch().await;
                        self.notifier.notify(OperatorEvent::SessionReset).await;
                        continue;
                    }
                    info!(from = %other, "routing back through the portal home");
                    page.goto(&catalog.portal_home_url).await?;
                    page.wait_for_network_idle(timeouts.network_idle()).await?;
                }
                NavigationState::PortalHome => {
                    match self.open_from_portal(&page, service).await {
                        Ok(target) => {
                            let landed = target.current_url().await?;
                            if self.is_usable_landing(&landed, service) {
                                target.bring_to_front().await?;
                                self.session.track_page(service, target.clone()).await;
                                self.session.adopt_active(target.clone()).await;
                                return Ok(target);
                            }
                            warn!(%landed, expected = %profile.host_fragment, "landed off the target domain");
                            if !Arc::ptr_eq(&target, &page) {
                                let _ = target.close().await;
                            }
                            if !link_retry_done {
                                link_retry_done = true;
                                self.refresh_portal_session(&page).await?;
                                continue;
                            }
                            return Err(NavigationError::SessionMismatch {
                                expected: profile.host_fragment.clone(),
                                landed,
                            });
                        }
                        Err(
                            e @ (NavigationError::ElementNotFound(_)
                            | NavigationError::Timeout(_)),
                        ) => {
                            if !link_retry_done {
                                link_retry_done = true;
                                debug!(error = %e, "service link attempt failed, refreshing portal session");
                                self.refresh_portal_session(&page).await?;
                                continue;
                            }
                            return Err(NavigationError::LinkNotFound(
                                profile.display_name.clone(),
                            ));
                        }
                        Err(e) => return Err(e),
                    }
                }
                NavigationState::LoginRequired => {
                    match self.login.ensure_logged_in(&self.session, &page).await {
                        LoginOutcome::Success => {
                            // Loop re-classifies; the expected next state is
                            // PortalHome.
                        }
                        LoginOutcome::TimedOut => return Err(NavigationError::LoginTimedOut),
                        LoginOutcome::ConnectionLost(reason) => {
                            return Err(NavigationError::ConnectionLost(reason))
                        }
                        LoginOutcome::Failed(reason) => {
                            return Err(NavigationError::LoginFailed(reason))
                        }
                    }
                }
                NavigationState::Unknown => {
                    if unknown_attempted {
                        return Err(NavigationError::UnrecognizedPage(url));
                    }
                    unknown_attempted = true;
                    info!(%url, "unknown page, navigating to the service home directly");
                    page.goto(&profile.home_url).await?;
                    page.wait_for_network_idle(timeouts.network_idle()).await?;
                }
            }
        }

        Err(NavigationError::UnrecognizedPage(
            "transition budget exhausted without reaching the target service".to_string(),
        ))
    }

    /// From the portal home: find the service link by accessible role+name,
    /// click it, and follow either the popup or the same-tab navigation.
    async fn open_from_portal(
        &self,
        page: &Arc<dyn Page>,
        service: ServiceId,
    ) -> Result<Arc<dyn Page>, NavigationError> {
        let profile = self.config.catalog.service(service);
        let timeouts = &self.config.timeouts;
        let link = Selector::link(&profile.link_name);

        page.wait_for_selector(&link, timeouts.selector_wait()).await?;
        info!(link = %link, service = %profile.display_name, "clicking service link");
        page.click(&link).await?;

        let target = match page.wait_for_popup(timeouts.popup_wait()).await {
            Ok(popup) => popup,
            Err(NavigationError::Timeout(_)) => page.clone(),
            Err(e) => return Err(e),
        };
        target.wait_for_network_idle(timeouts.network_idle()).await?;
        Ok(target)
    }

    /// Reload the portal page and let it settle so portal-issued tokens
    /// finish materializing before the next link attempt.
    async fn refresh_portal_session(&self, page: &Arc<dyn Page>) -> Result<(), NavigationError> {
        info!("refreshing portal session");
        page.reload().await?;
        page.wait_for_network_idle(self.config.timeouts.network_idle())
            .await?;
        tokio::time::sleep(self.config.timeouts.settle()).await;
        Ok(())
    }
}
