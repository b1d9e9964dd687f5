use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::config::PortalConfig;
use crate::credentials::CredentialSource;
use crate::login::{LoginCoordinator, LoginOutcome};
use crate::notify::{Notifier, OperatorEvent};
use crate::page::{BrowserLauncher, Page};
use crate::session::Session;
use crate::tests::fixtures::{
    test_config, FakeBrowser, FakeLauncher, FakePage, RecordingNotifier, StaticCredentials,
    LOGIN_URL, PORTAL_HOME_URL,
};
use crate::tests::init_tracing;

struct LoginHarness {
    coordinator: LoginCoordinator,
    cancel: CancellationToken,
    session: Session,
    notifier: Arc<RecordingNotifier>,
}

fn login_harness(config: PortalConfig, credentials: Arc<dyn CredentialSource>) -> LoginHarness {
    init_tracing();
    let notifier = RecordingNotifier::new();
    let cancel = CancellationToken::new();
    let coordinator = LoginCoordinator::new(
        Arc::new(config),
        credentials,
        notifier.clone() as Arc<dyn Notifier>,
        cancel.clone(),
    );
    let session = Session::new(FakeLauncher::new(FakeBrowser::new()) as Arc<dyn BrowserLauncher>);
    LoginHarness {
        coordinator,
        cancel,
        session,
        notifier,
    }
}

#[tokio::test]
async fn authenticated_session_short_circuits() {
    let h = login_harness(test_config(), StaticCredentials::absent());
    h.session.set_authenticated(true);
    let page = FakePage::new(LOGIN_URL);

    for _ in 0..2 {
        let outcome = h
            .coordinator
            .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
            .await;
        assert_eq!(outcome, LoginOutcome::Success);
    }
    assert!(page.gotos().is_empty(), "no navigation on the short circuit");
    assert!(h.notifier.events().is_empty());
}

#[tokio::test]
async fn certificate_login_fills_the_password_and_confirms() {
    let config = test_config();
    let page = FakePage::new("about:blank");
    page.add_selector(&config.login.password_field());
    page.add_selector(&config.login.landing_probe());
    page.on_click_navigate(&config.login.confirm_button(), PORTAL_HOME_URL);

    let h = login_harness(config.clone(), StaticCredentials::present("hunter2"));
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(outcome, LoginOutcome::Success);
    assert!(h.session.is_authenticated());
    assert_eq!(page.gotos(), vec![config.catalog.portal_login_url.clone()]);
    assert_eq!(
        page.fills(),
        vec![(config.login.password_field.clone(), "hunter2".to_string())]
    );
    assert_eq!(h.notifier.manual_login_requests(), 0);
    assert_eq!(
        h.notifier
            .count(|e| matches!(e, OperatorEvent::LoginConfirmed)),
        1
    );
}

#[tokio::test]
async fn manual_login_is_requested_once_and_polled_to_success() {
    let config = test_config();
    let page = FakePage::new("about:blank");
    page.add_selector(&config.login.landing_probe());
    // The human takes a few poll intervals before the portal redirects.
    page.script_urls([LOGIN_URL, LOGIN_URL, LOGIN_URL, PORTAL_HOME_URL]);

    let h = login_harness(config, StaticCredentials::absent());
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(outcome, LoginOutcome::Success);
    assert!(h.session.is_authenticated());
    assert_eq!(h.notifier.manual_login_requests(), 1);
    assert!(page.fills().is_empty(), "manual login drives no fields");
    // Manual logins get a session-enhancement refresh.
    assert_eq!(page.reload_count(), 1);
}

#[tokio::test]
async fn url_change_alone_is_not_success() {
    // Landed off the login URL but the probe never confirms: the wait must
    // keep polling until the ceiling rather than declare success.
    let mut config = test_config();
    config.timeouts.login_ceiling_ms = 50;
    let page = FakePage::new("about:blank");
    page.script_urls([PORTAL_HOME_URL]);

    let h = login_harness(config, StaticCredentials::absent());
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(outcome, LoginOutcome::TimedOut);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn ceiling_exceeded_reports_timeout() {
    let mut config = test_config();
    config.timeouts.login_ceiling_ms = 40;
    let page = FakePage::new(LOGIN_URL);

    let h = login_harness(config, StaticCredentials::absent());
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(outcome, LoginOutcome::TimedOut);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.notifier.manual_login_requests(), 1);
    assert_eq!(page.reload_count(), 0, "no enhancement without confirmation");
}

#[tokio::test]
async fn cancellation_interrupts_the_wait_promptly() {
    let mut config = test_config();
    config.timeouts.login_ceiling_ms = 60_000;
    let page = FakePage::new(LOGIN_URL);

    let h = login_harness(config, StaticCredentials::absent());
    let cancel = h.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(
        outcome,
        LoginOutcome::Failed("login wait cancelled".to_string())
    );
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn missing_certificate_prompt_fails_the_attempt() {
    // Credential present but the password field never renders.
    let config = test_config();
    let page = FakePage::new("about:blank");

    let h = login_harness(config, StaticCredentials::present("hunter2"));
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert!(matches!(outcome, LoginOutcome::Failed(_)), "got {outcome:?}");
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn connection_loss_during_login_is_distinguished() {
    let config = test_config();
    let page = FakePage::new("about:blank");
    page.fail_next_goto("browser went away");

    let h = login_harness(config, StaticCredentials::present("hunter2"));
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(
        outcome,
        LoginOutcome::ConnectionLost("browser went away".to_string())
    );
}

#[tokio::test]
async fn post_login_notice_is_dismissed() {
    let config = test_config();
    let page = FakePage::new("about:blank");
    page.add_selector(&config.login.password_field());
    page.add_selector(&config.login.landing_probe());
    page.add_selector(&config.login.notice_checkbox());
    page.add_selector(&config.login.notice_close_button());
    page.on_click_navigate(&config.login.confirm_button(), PORTAL_HOME_URL);

    let h = login_harness(config.clone(), StaticCredentials::present("hunter2"));
    let outcome = h
        .coordinator
        .ensure_logged_in(&h.session, &(page.clone() as Arc<dyn Page>))
        .await;

    assert_eq!(outcome, LoginOutcome::Success);
    let clicks = page.clicks();
    assert!(clicks.contains(&config.login.notice_checkbox().to_string()));
    assert!(clicks.contains(&config.login.notice_close_button().to_string()));
}
