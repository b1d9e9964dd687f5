//! Drives the portal login page to completion, automatically when a
//! credential is available, otherwise by waiting on a human.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PortalConfig;
use crate::credentials::{CredentialSource, Secret};
use crate::errors::NavigationError;
use crate::notify::{Notifier, OperatorEvent};
use crate::page::Page;
use crate::session::Session;

/// Result of one login attempt. Produced once; a failed attempt never
/// partially updates session state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success,
    Failed(String),
    TimedOut,
    /// The browser went away mid-login. Recoverable by reconnecting, unlike
    /// `Failed`.
    ConnectionLost(String),
}

enum LoginWait {
    Confirmed,
    CeilingExceeded,
}

#[derive(Clone)]
pub struct LoginCoordinator {
    config: Arc<PortalConfig>,
    credentials: Arc<dyn CredentialSource>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl LoginCoordinator {
    pub fn new(
        config: Arc<PortalConfig>,
        credentials: Arc<dyn CredentialSource>,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            credentials,
            notifier,
            cancel,
        }
    }

    /// Establish an authenticated portal session on `page`.
    ///
    /// Idempotent: once the session is authenticated this returns `Success`
    /// without touching the page. A failed attempt leaves the browser
    /// connection alone; callers may simply retry.
    pub async fn ensure_logged_in(&self, session: &Session, page: &Arc<dyn Page>) -> LoginOutcome {
        if session.is_authenticated() {
            debug!("session already authenticated, skipping login");
            return LoginOutcome::Success;
        }

        match self.drive_login(page).await {
            Ok(LoginWait::Confirmed) => {
                session.set_authenticated(true);
                self.dismiss_post_login_notice(page).await;
                self.notifier.notify(OperatorEvent::LoginConfirmed).await;
                LoginOutcome::Success
            }
            Ok(LoginWait::CeilingExceeded) => LoginOutcome::TimedOut,
            Err(NavigationError::Cancelled) => {
                LoginOutcome::Failed("login wait cancelled".to_string())
            }
            Err(NavigationError::ConnectionLost(reason)) => {
                warn!(%reason, "connection lost during login");
                LoginOutcome::ConnectionLost(reason)
            }
            Err(e) => {
                warn!(error = %e, "login attempt failed");
                LoginOutcome::Failed(e.to_string())
            }
        }
    }

    async fn drive_login(&self, page: &Arc<dyn Page>) -> Result<LoginWait, NavigationError> {
        let timeouts = &self.config.timeouts;
        let login_url = &self.config.catalog.portal_login_url;

        page.goto(login_url).await?;
        page.wait_for_network_idle(timeouts.network_idle()).await?;

        let manual = match self.credentials.secret()? {
            Some(secret) => {
                info!("credential available, driving certificate login");
                self.drive_certificate_login(page, &secret).await?;
                false
            }
            None => {
                info!("no credential available, requesting manual login");
                self.notifier
                    .notify(OperatorEvent::ManualLoginRequired {
                        portal_login_url: login_url.clone(),
                    })
                    .await;
                true
            }
        };

        let wait = self.wait_for_completion(page).await?;
        if manual && matches!(wait, LoginWait::Confirmed) {
            self.enhance_manual_session(page).await;
        }
        Ok(wait)
    }

    /// A human-driven login can leave portal-issued tokens still
    /// materializing. Reload and let the page settle before any
    /// cross-service link is used. Best-effort.
    async fn enhance_manual_session(&self, page: &Arc<dyn Page>) {
        let timeouts = &self.config.timeouts;
        debug!("refreshing portal page after manual login");
        if let Err(e) = page.reload().await {
            debug!(error = %e, "post-login refresh failed, continuing");
            return;
        }
        if let Err(e) = page.wait_for_network_idle(timeouts.network_idle()).await {
            debug!(error = %e, "post-login settle wait failed, continuing");
        }
        tokio::time::sleep(timeouts.settle()).await;
    }

    async fn drive_certificate_login(
        &self,
        page: &Arc<dyn Page>,
        secret: &Secret,
    ) -> Result<(), NavigationError> {
        let ui = &self.config.login;
        let timeouts = &self.config.timeouts;

        page.click(&ui.certificate_button()).await?;
        // The certificate prompt renders asynchronously after the first click.
        page.wait_for_selector(&ui.password_field(), timeouts.prompt_wait())
            .await?;
        page.fill(&ui.password_field(), secret.expose()).await?;
        page.click(&ui.confirm_button()).await?;
        Ok(())
    }

    /// Layered completion detection: the URL leaving the login pattern is
    /// only trusted once the landing probe confirms it, with bounded
    /// re-checks, then a ceiling-bounded poll for a human to finish.
    async fn wait_for_completion(
        &self,
        page: &Arc<dyn Page>,
    ) -> Result<LoginWait, NavigationError> {
        let timeouts = &self.config.timeouts;
        let catalog = &self.config.catalog;
        let probe = self.config.login.landing_probe();
        let started = Instant::now();
        let mut probe_rechecks = 0u32;
        let mut last_progress = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                return Err(NavigationError::Cancelled);
            }
            if started.elapsed() >= timeouts.login_ceiling() {
                warn!("login wait exceeded the ceiling");
                return Ok(LoginWait::CeilingExceeded);
            }

            let url = page.current_url().await?;
            if !url.contains(&catalog.login_fragment) {
                // The URL alone is not success: a redirect may still be in
                // flight. Confirm against an element unique to the
                // authenticated landing page.
                match page.wait_for_selector(&probe, timeouts.probe_wait()).await {
                    Ok(()) => {
                        info!(%url, "login confirmed by landing probe");
                        return Ok(LoginWait::Confirmed);
                    }
                    Err(NavigationError::Timeout(_)) | Err(NavigationError::ElementNotFound(_)) => {
                        probe_rechecks += 1;
                        if probe_rechecks <= timeouts.probe_rechecks {
                            debug!(attempt = probe_rechecks, "landing probe not ready, re-checking");
                            continue;
                        }
                    }
                    Err(e) => return Err(e),
                }
            }

            if last_progress.elapsed() >= timeouts.progress_every() {
                self.notifier
                    .notify(OperatorEvent::LoginProgress {
                        waited: started.elapsed(),
                    })
                    .await;
                last_progress = Instant::now();
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(NavigationError::Cancelled),
                _ = tokio::time::sleep(timeouts.poll_interval()) => {}
            }
        }
    }

    /// The portal may show a notice dialog right after login. Dismissing it
    /// is best-effort; most days there is none.
    async fn dismiss_post_login_notice(&self, page: &Arc<dyn Page>) {
        let ui = &self.config.login;
        let timeouts = &self.config.timeouts;

        match page
            .wait_for_selector(&ui.notice_checkbox(), timeouts.notice_wait())
            .await
        {
            Ok(()) => {
                debug!("dismissing post-login notice");
                if let Err(e) = page.click(&ui.notice_checkbox()).await {
                    debug!(error = %e, "notice checkbox click failed, leaving notice open");
                    return;
                }
                if let Err(e) = page.click(&ui.notice_close_button()).await {
                    debug!(error = %e, "notice close click failed");
                }
            }
            Err(_) => debug!("no post-login notice"),
        }
    }
}
