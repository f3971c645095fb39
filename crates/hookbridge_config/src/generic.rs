use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the generic inbound-webhooks surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericWebhooksConfig {
    /// Whether generic webhooks are served at all.
    #[serde(default)]
    pub enabled: bool,

    /// Public URL prefix inbound hook URLs are constructed under.
    pub url_prefix: Url,

    /// Localpart prefix for the ghost users that post webhook messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id_prefix: Option<String>,

    /// Deployment-level gate for operator-authored transformation
    /// scripts. The script engine does not check this itself; callers
    /// must refuse to construct a transformer when it is false.
    #[serde(default)]
    pub allow_js_transformation_functions: bool,

    /// Whether the HTTP response waits for the delivery to be fully
    /// processed instead of replying as soon as it is accepted.
    #[serde(default)]
    pub wait_for_complete: bool,

    /// Whether GET requests are accepted as deliveries.
    #[serde(default)]
    pub enable_http_get: bool,

    /// Maximum hook lifetime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_expiry_time_ms: Option<u64>,
}

impl GenericWebhooksConfig {
    /// The configured prefix with a trailing slash guaranteed, so hook ids
    /// can be joined onto it directly.
    pub fn prefixed_url(&self) -> Url {
        let mut url = self.url_prefix.clone();
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }
}
