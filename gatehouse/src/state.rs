//! Pure URL-to-state classification.
//!
//! Classification is a total function of the URL and the static catalog: no
//! DOM probes, no network, no hidden state. The rest of the machine relies on
//! repeated calls over an unchanged URL agreeing with each other.

use url::Url;

use crate::config::{ServiceCatalog, ServiceId};

/// Where the browser currently is, as far as navigation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    /// On the portal login page (or a blank tab that must go there).
    LoginRequired,
    /// On the authenticated portal main page.
    PortalHome,
    /// On one of the downstream services.
    OnService(ServiceId),
    /// Anything else.
    Unknown,
}

impl NavigationState {
    pub fn is_on(&self, service: ServiceId) -> bool {
        matches!(self, NavigationState::OnService(s) if *s == service)
    }
}

/// Classify a URL against the catalog.
///
/// Matching order matters: URL fragments can co-occur (a login-path fragment
/// inside a service URL must not turn into a service state), so the login
/// pattern is checked first, then each service's host, then the portal.
pub fn classify(url: &str, catalog: &ServiceCatalog) -> NavigationState {
    let url = url.trim();
    if url.is_empty() || url == "about:blank" {
        return NavigationState::LoginRequired;
    }

    let (host, path) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or_default().to_string(),
            parsed.path().to_string(),
        ),
        // Not a parseable URL; fall back to raw substring checks so the
        // function stays total.
        Err(_) => (String::new(), url.to_string()),
    };
    let haystack = if host.is_empty() {
        path.clone()
    } else {
        format!("{host}{path}")
    };

    if path.contains(&catalog.login_fragment) || haystack.contains(&catalog.login_fragment) {
        return NavigationState::LoginRequired;
    }

    for id in ServiceId::ALL {
        let profile = catalog.service(id);
        if !profile.host_fragment.is_empty() && haystack.contains(&profile.host_fragment) {
            return NavigationState::OnService(id);
        }
    }

    if haystack.contains(&catalog.portal_home_fragment)
        || (!catalog.portal_host_fragment.is_empty()
            && haystack.contains(&catalog.portal_host_fragment))
    {
        return NavigationState::PortalHome;
    }

    NavigationState::Unknown
}
