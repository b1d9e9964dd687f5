use crate::config::ServiceId;
use crate::state::{classify, NavigationState};
use crate::tests::fixtures::{test_config, FINANCE_URL, LOGIN_URL, PORTAL_HOME_URL, RECORDS_URL};
use crate::tests::init_tracing;

#[test]
fn login_page_requires_login() {
    init_tracing();
    let catalog = test_config().catalog;
    assert_eq!(classify(LOGIN_URL, &catalog), NavigationState::LoginRequired);
}

#[test]
fn blank_and_empty_urls_require_login() {
    let catalog = test_config().catalog;
    assert_eq!(classify("", &catalog), NavigationState::LoginRequired);
    assert_eq!(classify("   ", &catalog), NavigationState::LoginRequired);
    assert_eq!(
        classify("about:blank", &catalog),
        NavigationState::LoginRequired
    );
}

#[test]
fn portal_main_page_is_portal_home() {
    let catalog = test_config().catalog;
    assert_eq!(
        classify(PORTAL_HOME_URL, &catalog),
        NavigationState::PortalHome
    );
}

#[test]
fn service_hosts_map_to_their_service() {
    let catalog = test_config().catalog;
    assert_eq!(
        classify(RECORDS_URL, &catalog),
        NavigationState::OnService(ServiceId::Records)
    );
    assert_eq!(
        classify(FINANCE_URL, &catalog),
        NavigationState::OnService(ServiceId::Finance)
    );
}

#[test]
fn login_fragment_wins_over_service_host() {
    // A login-path fragment inside a service URL means the session bounced
    // back to authentication, not that the service is reachable.
    let catalog = test_config().catalog;
    assert_eq!(
        classify("https://jbe.neis.go.kr/bpm_lgn_lg00_001.do", &catalog),
        NavigationState::LoginRequired
    );
}

#[test]
fn service_own_login_variant_is_still_on_its_host() {
    // Classification is host-based; whether a login-redirect page is a
    // usable landing is the navigator's call, not the classifier's.
    let catalog = test_config().catalog;
    assert_eq!(
        classify("https://jbe.neis.go.kr/cmc_fcm_lg01_000.do", &catalog),
        NavigationState::OnService(ServiceId::Records)
    );
}

#[test]
fn unrelated_pages_are_unknown() {
    let catalog = test_config().catalog;
    assert_eq!(
        classify("https://intranet.example/home", &catalog),
        NavigationState::Unknown
    );
    assert_eq!(
        classify("definitely not a url", &catalog),
        NavigationState::Unknown
    );
}

#[test]
fn classification_is_stable_over_repeated_calls() {
    let catalog = test_config().catalog;
    for url in [LOGIN_URL, PORTAL_HOME_URL, RECORDS_URL, FINANCE_URL, "x://?"] {
        let first = classify(url, &catalog);
        for _ in 0..5 {
            assert_eq!(classify(url, &catalog), first, "unstable for {url}");
        }
    }
}
