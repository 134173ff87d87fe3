//! User-Agent string for ecoDMS API traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/ecodms-export";

/// Default User-Agent for API requests (identifies the tool and its version).
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ecodms-export/{version} (+{PROJECT_UA_URL})")
}
