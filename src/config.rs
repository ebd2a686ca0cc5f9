use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use clap::Args;
use reqwest::Url;

/// Connection settings for the remote scheduler. Values come from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ProviderOpts {
    /// Chronos base URL
    #[clap(long, env = "CHRONOS_URL")]
    pub url: SchedulerUrl,

    /// HTTP basic auth user
    #[clap(long, env = "CHRONOS_BASIC_AUTH_USER", default_value = "")]
    pub basic_auth_user: String,

    /// HTTP basic auth password
    #[clap(
        long,
        env = "CHRONOS_BASIC_AUTH_PASSWORD",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub basic_auth_password: String,
}

impl ProviderOpts {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            url: self.url.clone(),
            credentials: Credentials::new(&self.basic_auth_user, &self.basic_auth_password),
        }
    }
}

/// Immutable for the lifetime of a provider session.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub url: SchedulerUrl,
    pub credentials: Credentials,
}

impl ProviderConfig {
    /// Build a config from raw provider values, as a host hands them over.
    pub fn new(url: &str, basic_auth_user: &str, basic_auth_password: &str) -> anyhow::Result<Self> {
        Ok(Self {
            url: url.parse()?,
            credentials: Credentials::new(basic_auth_user, basic_auth_password),
        })
    }
}

/// Valid scheduler urls:
///   must parse as an absolute url
///   use the http or https scheme
///   be usable as a base for the scheduler endpoints
#[derive(Clone, PartialEq, Eq)]
pub struct SchedulerUrl(Url);

impl SchedulerUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for SchedulerUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(!s.trim().is_empty(), "scheduler url cannot be an empty string");
        let url = Url::parse(s.trim())?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "scheduler url must use http or https, got '{}'",
            url.scheme()
        );
        anyhow::ensure!(
            !url.cannot_be_a_base(),
            "scheduler url cannot be used as a base url"
        );
        anyhow::ensure!(
            url.username().is_empty() && url.password().is_none(),
            "scheduler url must not embed credentials, use basic_auth_user and basic_auth_password"
        );
        Ok(Self(url))
    }
}

impl Debug for SchedulerUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for SchedulerUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Basic auth credentials sent with every request.
#[derive(Clone, Default)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
