//! Static configuration: service identities, URL patterns, selectors, timeouts.
//!
//! Everything here is immutable for the process lifetime. Defaults carry the
//! constants of the portal this crate was built against; deployments override
//! them from a YAML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::NavigationError;
use crate::selector::Selector;

/// The downstream services reachable through the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceId {
    /// Student-records service ("Service A").
    Records,
    /// School-finance service ("Service B").
    Finance,
}

impl ServiceId {
    pub const ALL: [ServiceId; 2] = [ServiceId::Records, ServiceId::Finance];

    pub fn other(self) -> ServiceId {
        match self {
            ServiceId::Records => ServiceId::Finance,
            ServiceId::Finance => ServiceId::Records,
        }
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceId::Records => write!(f, "records"),
            ServiceId::Finance => write!(f, "finance"),
        }
    }
}

/// Whether portal-issued sessions are assumed to carry across services.
///
/// The upstream identity provider is ambiguous about this; it is policy, not
/// a fact the code can hard-code. `Isolated` makes cross-service switches go
/// through a full session reset immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    #[default]
    Shared,
    Isolated,
}

/// Static identity of one downstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProfile {
    pub display_name: String,
    /// Direct entry URL, used from the `Unknown` branch.
    pub home_url: String,
    /// Host substring that identifies a page as belonging to this service.
    pub host_fragment: String,
    /// URL fragment of this service's own login/SSO variant. Landing here
    /// from the portal means the shared session did not carry over.
    pub login_redirect_fragment: String,
    /// Accessible name of this service's navigation link on the portal home.
    pub link_name: String,
}

impl ServiceProfile {
    /// True when `url` is this service's own login/SSO variant rather than a
    /// usable service page.
    pub fn is_login_redirect(&self, url: &str) -> bool {
        !self.login_redirect_fragment.is_empty() && url.contains(&self.login_redirect_fragment)
    }
}

/// URL patterns for the portal and its services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub portal_home_url: String,
    pub portal_login_url: String,
    /// URL fragment present only on the portal login page.
    pub login_fragment: String,
    /// URL fragment of the authenticated portal main page.
    pub portal_home_fragment: String,
    /// Host substring identifying any portal page.
    pub portal_host_fragment: String,
    pub records: ServiceProfile,
    pub finance: ServiceProfile,
}

impl ServiceCatalog {
    pub fn service(&self, id: ServiceId) -> &ServiceProfile {
        match id {
            ServiceId::Records => &self.records,
            ServiceId::Finance => &self.finance,
        }
    }
}

/// Selectors driven during login and post-login cleanup.
///
/// Stored as strings in the `Selector` syntax (`role|name`, `css:`, `label:`,
/// `>>` chains) so deployments can adjust them without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUi {
    /// Certificate-login control on the portal login page.
    pub certificate_button: String,
    /// Password field of the secondary certificate prompt.
    pub password_field: String,
    /// Final confirmation control. The login widget renders several visually
    /// similar buttons; the trailing `nth:-1` picks the last occurrence.
    /// Known-fragile: revisit if the portal login widget changes.
    pub confirm_button: String,
    /// Element that exists only on the authenticated landing page.
    pub landing_probe: String,
    /// "Don't show today" checkbox of the optional post-login notice.
    pub notice_checkbox: String,
    /// Close button of the optional post-login notice.
    pub notice_close_button: String,
}

impl LoginUi {
    pub fn certificate_button(&self) -> Selector {
        Selector::from(self.certificate_button.as_str())
    }

    pub fn password_field(&self) -> Selector {
        Selector::from(self.password_field.as_str())
    }

    pub fn confirm_button(&self) -> Selector {
        Selector::from(self.confirm_button.as_str())
    }

    pub fn landing_probe(&self) -> Selector {
        Selector::from(self.landing_probe.as_str())
    }

    pub fn notice_checkbox(&self) -> Selector {
        Selector::from(self.notice_checkbox.as_str())
    }

    pub fn notice_close_button(&self) -> Selector {
        Selector::from(self.notice_close_button.as_str())
    }
}

/// Timeout table, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    pub network_idle_ms: u64,
    /// How long to wait for a selector (service links, login controls).
    pub selector_wait_ms: u64,
    /// Ceiling for the whole login wait, automated or manual.
    pub login_ceiling_ms: u64,
    pub poll_interval_ms: u64,
    /// Single DOM-probe wait during login confirmation.
    pub probe_wait_ms: u64,
    /// Bounded re-checks of the landing probe before falling back to the
    /// open-ended poll.
    pub probe_rechecks: u32,
    /// Wait for the secondary certificate prompt after the first click.
    pub prompt_wait_ms: u64,
    /// Settle delay after a portal-session refresh.
    pub settle_ms: u64,
    pub popup_wait_ms: u64,
    /// Bounded wait for the optional post-login notice.
    pub notice_wait_ms: u64,
    /// Emit a login progress notification roughly this often.
    pub progress_every_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            network_idle_ms: 30_000,
            selector_wait_ms: 15_000,
            login_ceiling_ms: 300_000,
            poll_interval_ms: 1_000,
            probe_wait_ms: 2_000,
            probe_rechecks: 3,
            prompt_wait_ms: 2_000,
            settle_ms: 3_000,
            popup_wait_ms: 10_000,
            notice_wait_ms: 5_000,
            progress_every_ms: 30_000,
        }
    }
}

impl Timeouts {
    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }
    pub fn selector_wait(&self) -> Duration {
        Duration::from_millis(self.selector_wait_ms)
    }
    pub fn login_ceiling(&self) -> Duration {
        Duration::from_millis(self.login_ceiling_ms)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn probe_wait(&self) -> Duration {
        Duration::from_millis(self.probe_wait_ms)
    }
    pub fn prompt_wait(&self) -> Duration {
        Duration::from_millis(self.prompt_wait_ms)
    }
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    pub fn popup_wait(&self) -> Duration {
        Duration::from_millis(self.popup_wait_ms)
    }
    pub fn notice_wait(&self) -> Duration {
        Duration::from_millis(self.notice_wait_ms)
    }
    pub fn progress_every(&self) -> Duration {
        Duration::from_millis(self.progress_every_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_catalog")]
    pub catalog: ServiceCatalog,
    #[serde(default = "default_login_ui")]
    pub login: LoginUi,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub session_scope: SessionScope,
    /// Path of the credential file; `None` means the platform default.
    #[serde(default)]
    pub credential_file: Option<PathBuf>,
}

fn default_catalog() -> ServiceCatalog {
    ServiceCatalog {
        portal_home_url: "https://jbe.eduptl.kr/bpm_man_mn00_001.do".to_string(),
        portal_login_url: "https://jbe.eduptl.kr/bpm_lgn_lg00_001.do".to_string(),
        login_fragment: "lg00_001.do".to_string(),
        portal_home_fragment: "mn00_001.do".to_string(),
        portal_host_fragment: "eduptl.kr".to_string(),
        records: ServiceProfile {
            display_name: "NEIS".to_string(),
            home_url: "https://jbe.neis.go.kr/".to_string(),
            host_fragment: "neis.go.kr".to_string(),
            login_redirect_fragment: "cmc_fcm_lg01".to_string(),
            link_name: "나이스".to_string(),
        },
        finance: ServiceProfile {
            display_name: "K-EduFine".to_string(),
            home_url: "http://klef.jbe.go.kr/".to_string(),
            host_fragment: "klef".to_string(),
            login_redirect_fragment: "lgn_lg".to_string(),
            link_name: "K-에듀파인".to_string(),
        },
    }
}

fn default_login_ui() -> LoginUi {
    LoginUi {
        certificate_button: "css:button.elec-log-btn".to_string(),
        password_field: "css:input[name=certPassword]".to_string(),
        confirm_button: "button|확인 >> nth:-1".to_string(),
        landing_probe: "css:button.btn-logout".to_string(),
        notice_checkbox: "label:오늘하루 이창 열지 않기".to_string(),
        notice_close_button: "button|닫기".to_string(),
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            login: default_login_ui(),
            timeouts: Timeouts::default(),
            session_scope: SessionScope::default(),
            credential_file: None,
        }
    }
}

impl PortalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavigationError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            NavigationError::InvalidConfig(format!(
                "cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let config: PortalConfig = serde_yaml::from_str(&raw)
            .map_err(|e| NavigationError::InvalidConfig(format!("cannot parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, NavigationError> {
        serde_yaml::to_string(self)
            .map_err(|e| NavigationError::InvalidConfig(format!("cannot serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<(), NavigationError> {
        for (label, raw) in [
            ("portal_home_url", &self.catalog.portal_home_url),
            ("portal_login_url", &self.catalog.portal_login_url),
            ("records.home_url", &self.catalog.records.home_url),
            ("finance.home_url", &self.catalog.finance.home_url),
        ] {
            url::Url::parse(raw).map_err(|e| {
                NavigationError::InvalidConfig(format!("{label} is not a valid URL: {e}"))
            })?;
        }
        for (label, raw) in [
            ("certificate_button", &self.login.certificate_button),
            ("password_field", &self.login.password_field),
            ("confirm_button", &self.login.confirm_button),
            ("landing_probe", &self.login.landing_probe),
            ("notice_checkbox", &self.login.notice_checkbox),
            ("notice_close_button", &self.login.notice_close_button),
        ] {
            if matches!(Selector::from(raw.as_str()), Selector::Invalid(_)) {
                return Err(NavigationError::InvalidConfig(format!(
                    "login.{label} is not a valid selector: {raw}"
                )));
            }
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(NavigationError::InvalidConfig(
                "timeouts.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
