//! Target configuration consumed from the process environment

use std::time::Duration;

use url::Url;

use crate::error::{HarnessError, Result};

/// Environment variable naming the base URL of the target application.
pub const ENV_TARGET_URL: &str = "TARGET_URL";
/// Environment variable naming the administrator login.
pub const ENV_ADMIN_USER: &str = "ADMIN_USER";
/// Environment variable naming the administrator password.
pub const ENV_ADMIN_PASS: &str = "ADMIN_PASS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Role implied by an account on the target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Publisher,
}

/// A login/password pair together with the role the account is expected to
/// hold. The target does not announce roles, so the caller records the
/// expectation here and authorization scenarios verify it observably.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
    pub role: Role,
}

impl Credentials {
    pub fn administrator(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            role: Role::Administrator,
        }
    }

    pub fn publisher(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            role: Role::Publisher,
        }
    }
}

/// Configuration for one harness run: where the target lives, how to
/// authenticate as an administrator, and the per-request timeout.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub admin: Credentials,
    pub timeout: Duration,
}

impl Config {
    /// Build a configuration from an explicit base URL and admin account.
    /// A URL without a scheme is treated as plain HTTP.
    pub fn new(base_url: &str, admin: Credentials) -> Result<Self> {
        let normalized = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };
        let base_url = Url::parse(&normalized)?;
        if base_url.cannot_be_a_base() {
            return Err(HarnessError::Config(format!(
                "base URL is not an HTTP origin: {normalized}"
            )));
        }
        Ok(Self {
            base_url,
            admin,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `TARGET_URL`, `ADMIN_USER` and `ADMIN_PASS` from the process
    /// environment. Missing variables are a configuration error.
    pub fn from_env() -> Result<Self> {
        let target = require_env(ENV_TARGET_URL)?;
        let user = require_env(ENV_ADMIN_USER)?;
        let pass = require_env(ENV_ADMIN_PASS)?;
        Self::new(&target, Credentials::administrator(user, pass))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| HarnessError::Config(format!("environment variable {name} is not set")))
}
