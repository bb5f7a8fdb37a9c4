//! Scenario library: reusable operations against the target application
//!
//! Every operation is a composed sequence of Session / form / resolver
//! calls with an explicit contract. Errors propagate to the orchestrator
//! uncaught; only the sweep operations tolerate entities that have already
//! disappeared, since cleanup racing another run is not a failure.
//!
//! Entities created here carry [`TITLE_MARKER`] in their title (or the
//! fixed [`PUBLISHER_LOGIN`]) so the sweeps can find and remove exactly
//! this harness's own residue without disturbing unrelated data.

use regex::Regex;
use tracing::{debug, warn};

use mergegrade_harness::{
    resolve_id, Credentials, EntityId, FormPredicate, HarnessError, LinkPredicate, Page, Result,
    Session,
};

/// Title prefix identifying every article this harness creates.
pub const TITLE_MARKER: &str = "[e2e-harness]";
/// Fixed login for the publisher-role account the harness creates.
pub const PUBLISHER_LOGIN: &str = "e2e_harness_publisher";

const COMMENT_AUTHOR: &str = "Joe Snow";
const COMMENT_EMAIL: &str = "joe@snow.com";
const PUBLISHER_EMAIL: &str = "joe2@snow2.com";
/// `user[profile_id]` value for the publisher (non-administrator) role.
const PUBLISHER_PROFILE_ID: &str = "2";

const CONTENT_LIST_PATH: &str = "admin/content";
const CONTENT_NEW_PATH: &str = "admin/content/new";
const USERS_LIST_PATH: &str = "admin/users";
const USERS_NEW_PATH: &str = "admin/users/new";

/// Predicate matching listing links for harness-created articles.
pub fn marker_links() -> LinkPredicate {
    LinkPredicate::new().text_contains(TITLE_MARKER)
}

/// Apply the harness marker to an article title.
pub fn marked_title(title: &str) -> String {
    format!("{TITLE_MARKER} {title}")
}

/// Authenticate a session. Fails with `Authentication` on rejected
/// credentials, leaving the session anonymous.
pub async fn login(session: &mut Session, credentials: &Credentials) -> Result<()> {
    session.authenticate(credentials).await?;
    debug!(login = %credentials.login, "logged in");
    Ok(())
}

/// Create an article with the marker-prefixed title and resolve the id the
/// server assigned to it, by locating the listing link carrying the exact
/// submitted title.
pub async fn create_article(session: &Session, title: &str, body: &str) -> Result<EntityId> {
    let title = marked_title(title);
    let page = session.fetch(CONTENT_NEW_PATH).await?;
    let predicate = FormPredicate::new().action_equals("/admin/content/new");
    let mut form = page
        .form_matching(&predicate)
        .ok_or_else(|| HarnessError::FormNotFound {
            operation: "create_article".to_string(),
            detail: predicate.describe(),
        })?;
    form.set("article[title]", &title)?;
    form.set("article[body_and_extended]", body)?;
    let listing = session.submit(&form).await?;

    let link = listing
        .link_with_text(&title)
        .ok_or_else(|| HarnessError::Resolution {
            operation: "create_article".to_string(),
            detail: format!("no listing link with title {title:?} after submission"),
        })?;
    let id = resolve_id(link)?;
    debug!(%id, %title, "created article");
    Ok(id)
}

/// Submit the destroy confirmation form for an article. A missing
/// confirmation form is a failure here; cleanup paths that tolerate
/// already-absent entities go through [`sweep_clean_articles`].
pub async fn destroy_article(session: &Session, id: &str) -> Result<Page> {
    submit_destroy_form(session, &format!("admin/content/destroy/{id}"), "destroy_article").await
}

/// Post a comment under the fixed harness author identity. Placement is
/// not verified here; callers fetch the comment view themselves.
pub async fn post_comment(session: &Session, article_id: &str, body: &str) -> Result<()> {
    let path = format!("comments?article_id={article_id}");
    let page = session.fetch(&path).await?;
    let action =
        Regex::new(&format!(r"/comments\?article_id={article_id}$")).expect("static pattern");
    let predicate = FormPredicate::new().action_matches(action);
    let mut form = page
        .form_matching(&predicate)
        .ok_or_else(|| HarnessError::FormNotFound {
            operation: "post_comment".to_string(),
            detail: predicate.describe(),
        })?;
    form.set("comment[author]", COMMENT_AUTHOR)?;
    form.set("comment[email]", COMMENT_EMAIL)?;
    form.set("comment[body]", body)?;
    session.submit(&form).await?;
    debug!(%article_id, "posted comment");
    Ok(())
}

/// Merge `source` into `target` through the edit page's merge control,
/// then re-resolve the surviving article from the content listing.
///
/// The server performs the content/comment union; which id survives is its
/// business. The harness only requires that exactly one marker-tagged
/// article remains afterwards, and returns that one's id.
pub async fn merge_articles(session: &Session, target: &str, source: &str) -> Result<EntityId> {
    let edit = session.fetch(&format!("admin/content/edit/{target}")).await?;
    // The edit page carries several forms; the merge control is the one
    // declaring exactly one `merge_with` field.
    let mut form = edit
        .forms()
        .iter()
        .find(|f| f.field_count("merge_with") == 1)
        .cloned()
        .ok_or_else(|| HarnessError::FormNotFound {
            operation: "merge_articles".to_string(),
            detail: "form with exactly one merge_with field".to_string(),
        })?;
    form.set("merge_with", source)?;
    session.submit(&form).await?;

    let listing = session.fetch(CONTENT_LIST_PATH).await?;
    let marker = marker_links();
    let tagged: Vec<_> = listing.links_matching(&marker).collect();
    match tagged.as_slice() {
        [survivor] => {
            let id = resolve_id(survivor)?;
            debug!(%target, %source, survivor = %id, "merged articles");
            Ok(id)
        }
        [] => Err(HarnessError::Resolution {
            operation: "merge_articles".to_string(),
            detail: "no marker-tagged article remains after merge".to_string(),
        }),
        many => Err(HarnessError::Resolution {
            operation: "merge_articles".to_string(),
            detail: format!(
                "expected a single surviving article, found {}",
                many.len()
            ),
        }),
    }
}

/// Create a user with publisher (non-administrator) permissions.
pub async fn create_publisher(session: &Session, login: &str, password: &str) -> Result<Page> {
    let page = session.fetch(USERS_NEW_PATH).await?;
    let action = Regex::new(r"/admin/users/new$").expect("static pattern");
    let predicate = FormPredicate::new().action_matches(action);
    let mut form = page
        .form_matching(&predicate)
        .ok_or_else(|| HarnessError::FormNotFound {
            operation: "create_publisher".to_string(),
            detail: predicate.describe(),
        })?;
    form.set("user[login]", login)?;
    form.set("user[password]", password)?;
    form.set("user[password_confirmation]", password)?;
    form.set("user[email]", PUBLISHER_EMAIL)?;
    form.set("user[profile_id]", PUBLISHER_PROFILE_ID)?;
    let landing = session.submit(&form).await?;
    debug!(%login, "created publisher user");
    Ok(landing)
}

/// Submit the destroy confirmation form for a user.
pub async fn destroy_user(session: &Session, id: &str) -> Result<Page> {
    submit_destroy_form(session, &format!("admin/users/destroy/{id}"), "destroy_user").await
}

/// Destroy every article whose listing link carries the harness marker.
/// Idempotent: an empty enumeration is a no-op, and an article that
/// vanished between enumeration and destruction is skipped with a warning.
/// Returns the number of articles destroyed.
pub async fn sweep_clean_articles(session: &Session) -> Result<usize> {
    let listing = session.fetch(CONTENT_LIST_PATH).await?;
    let mut swept = 0;
    for link in listing.links_matching(&marker_links()) {
        let id = resolve_id(link)?;
        match destroy_article(session, &id).await {
            Ok(_) => swept += 1,
            Err(e) if vanished_during_cleanup(&e) => {
                warn!(%id, error = %e, "article already gone during sweep");
            }
            Err(e) => return Err(e),
        }
    }
    debug!(swept, "swept harness articles");
    Ok(swept)
}

/// Destroy every user whose listing link text contains `login`. Same
/// idempotency contract as [`sweep_clean_articles`].
pub async fn sweep_clean_users(session: &Session, login: &str) -> Result<usize> {
    let listing = session.fetch(USERS_LIST_PATH).await?;
    let predicate = LinkPredicate::new().text_contains(login);
    let mut swept = 0;
    for link in listing.links_matching(&predicate) {
        let id = resolve_id(link)?;
        match destroy_user(session, &id).await {
            Ok(_) => swept += 1,
            Err(e) if vanished_during_cleanup(&e) => {
                warn!(%id, error = %e, "user already gone during sweep");
            }
            Err(e) => return Err(e),
        }
    }
    debug!(swept, %login, "swept harness users");
    Ok(swept)
}

async fn submit_destroy_form(session: &Session, path: &str, operation: &str) -> Result<Page> {
    let page = session.fetch(path).await?;
    let predicate = FormPredicate::new().action_equals(&format!("/{path}"));
    let form = page
        .form_matching(&predicate)
        .ok_or_else(|| HarnessError::FormNotFound {
            operation: operation.to_string(),
            detail: predicate.describe(),
        })?;
    session.submit(&form).await
}

/// Failure modes that mean the entity was already removed, acceptable only
/// while sweeping.
fn vanished_during_cleanup(err: &HarnessError) -> bool {
    matches!(
        err,
        HarnessError::FormNotFound { .. } | HarnessError::UnexpectedStatus { status: 404, .. }
    )
}
