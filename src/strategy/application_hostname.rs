use crate::{models::Parameters, Context};

use super::{list, Strategy};

/// Active on the hosts listed in the comma-separated `hostNames` parameter. Comparison is
/// case-insensitive.
pub struct ApplicationHostnameStrategy {
    hostname: String,
}

impl ApplicationHostnameStrategy {
    /// Resolve the hostname from the `HOSTNAME` environment variable or the operating system.
    pub fn new() -> Self {
        let hostname = std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                hostname::get()
                    .ok()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "undefined".to_owned());
        Self::with_hostname(hostname)
    }

    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        ApplicationHostnameStrategy {
            hostname: hostname.into().to_lowercase(),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

impl Default for ApplicationHostnameStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for ApplicationHostnameStrategy {
    fn name(&self) -> &str {
        "applicationHostname"
    }

    fn is_enabled(&self, parameters: &Parameters, _context: &Context) -> bool {
        list(parameters, "hostNames").any(|name| name.to_lowercase() == self.hostname)
    }
}
