//! Cookie-bearing HTTP sessions
//!
//! A [`Session`] owns one cookie jar bound to one base URL and tracks the
//! identity it has authenticated as. Sessions are owned by exactly one
//! scenario execution and never shared; all returned [`Page`]s are
//! independent snapshots.

use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::config::{Config, Credentials, Role};
use crate::error::{HarnessError, Result};
use crate::form::{Form, FormMethod, FormPredicate};
use crate::page::Page;

/// Path of the login form on the target application.
pub const LOGIN_PATH: &str = "accounts/login";
const LOGIN_ACTION: &str = "/accounts/login";
const LOGIN_OK_MARKER: &str = "Login successful";
const LOGIN_FAIL_MARKER: &str = "Login unsuccessful";

/// Who this session is authenticated as. Once established, the identity
/// only changes through another explicit [`Session::authenticate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { login: String, role: Role },
}

impl Identity {
    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { role, .. } => Some(*role),
        }
    }
}

/// One HTTP interaction context: cookie jar, base URL, identity.
pub struct Session {
    client: reqwest::Client,
    base_url: Url,
    identity: Identity,
}

impl Session {
    /// Open a fresh, unauthenticated session against the configured target.
    pub fn open(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .redirect(Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            identity: Identity::Anonymous,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The identity this session has established, as an inspectable value.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// GET a path relative to the base URL, following redirects, and
    /// snapshot the response. Non-success status is an error: every fetch
    /// in this harness contractually expects a renderable page.
    pub async fn fetch(&self, path: &str) -> Result<Page> {
        let url = self.base_url.join(path)?;
        debug!(%url, "fetch");
        let response = self.client.get(url).send().await?;
        Self::snapshot(response).await
    }

    /// Submit a form through this session, yielding the resulting page.
    /// The form's fields are sent urlencoded with the method the markup
    /// declared; the prior page is not touched.
    pub async fn submit(&self, form: &Form) -> Result<Page> {
        let url = match form.method() {
            FormMethod::Get => get_submission_url(form)?,
            FormMethod::Post => form.resolve_action()?,
        };
        debug!(%url, method = ?form.method(), "submit");
        let request = match form.method() {
            FormMethod::Get => self.client.get(url),
            FormMethod::Post => self.client.post(url).form(form.pairs()),
        };
        let response = request.send().await?;
        Self::snapshot(response).await
    }

    /// Drive the login form. On success the identity transitions to the
    /// role the credentials claim; on rejection it stays `Anonymous` and
    /// the call fails with `Authentication`.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let page = self.fetch(LOGIN_PATH).await?;
        let predicate = FormPredicate::new().action_equals(LOGIN_ACTION);
        let mut form = page
            .form_matching(&predicate)
            .ok_or_else(|| HarnessError::FormNotFound {
                operation: "authenticate".to_string(),
                detail: predicate.describe(),
            })?;
        form.set("user[login]", &credentials.login)?;
        form.set("user[password]", &credentials.password)?;
        let landing = self.submit(&form).await?;

        if landing.contains(LOGIN_FAIL_MARKER) || !landing.contains(LOGIN_OK_MARKER) {
            return Err(HarnessError::Authentication(format!(
                "login rejected for {:?}",
                credentials.login
            )));
        }

        debug!(login = %credentials.login, role = ?credentials.role, "authenticated");
        self.identity = Identity::Authenticated {
            login: credentials.login.clone(),
            role: credentials.role,
        };
        Ok(())
    }

    async fn snapshot(response: reqwest::Response) -> Result<Page> {
        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() {
            return Err(HarnessError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(Page::from_html(url, status.as_u16(), body))
    }
}

/// URL for a GET submission. The form submission algorithm discards any
/// query string the action carries and replaces it with the field pairs.
fn get_submission_url(form: &Form) -> Result<Url> {
    let mut url = form.resolve_action()?;
    url.set_query(None);
    if !form.pairs().is_empty() {
        url.query_pairs_mut().extend_pairs(form.pairs());
    }
    Ok(url)
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("identity", &self.identity)
            .finish()
    }
}
