//! The built-in scenario set
//!
//! A sanity block (zero points) proving the target is up and behaves as a
//! stock install, then the merge block carrying the point weights. Every
//! body opens its own sessions from the config it is handed; nothing is
//! shared across scenarios.

use regex::Regex;

use mergegrade_harness::verify::{
    self, check, check_eq, field_count, form_field_present, link_count_matching, page_contains,
    page_lacks,
};
use mergegrade_harness::{Config, Credentials, Identity, Result, Role, Session};

use crate::ops;
use crate::orchestrator::Scenario;

const PUBLISHER_PASSWORD: &str = "aaaaaaaa";

/// All scenarios in run order.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("target-responds", 0, target_responds),
        Scenario::new("admin-authenticates", 0, admin_authenticates),
        Scenario::new("article-create-destroy", 0, article_create_destroy),
        Scenario::new("comment-round-trip", 0, comment_round_trip),
        Scenario::new("publisher-user-creation", 0, publisher_user_creation),
        Scenario::new("merge-control-on-edit-page", 15, merge_control_on_edit_page),
        Scenario::new(
            "merge-produces-single-article",
            15,
            merge_produces_single_article,
        ),
        Scenario::new(
            "merged-article-keeps-both-bodies",
            20,
            merged_article_keeps_both_bodies,
        ),
        Scenario::new(
            "merged-article-carries-comments",
            20,
            merged_article_carries_comments,
        ),
        Scenario::new("merge-control-admin-only", 15, merge_control_admin_only),
        Scenario::new(
            "merge-requires-administrator",
            15,
            merge_requires_administrator,
        ),
    ]
}

async fn admin_session(config: &Config) -> Result<Session> {
    let mut session = Session::open(config)?;
    ops::login(&mut session, &config.admin).await?;
    Ok(session)
}

async fn publisher_session(config: &Config) -> Result<Session> {
    let mut session = Session::open(config)?;
    let credentials = Credentials::publisher(ops::PUBLISHER_LOGIN, PUBLISHER_PASSWORD);
    ops::login(&mut session, &credentials).await?;
    Ok(session)
}

/// The target answers a plain request at its root.
async fn target_responds(config: Config) -> Result<()> {
    let session = Session::open(&config)?;
    session.fetch("").await?;
    Ok(())
}

/// Bad credentials are rejected and leave the session anonymous; the
/// supplied admin account then authenticates as an administrator.
async fn admin_authenticates(config: Config) -> Result<()> {
    let mut session = Session::open(&config)?;

    let login_page = session.fetch("accounts/login").await?;
    check_eq(
        login_page.query_count(r#"form[action="/accounts/login"]"#)?,
        1,
        "login form count",
    )?;

    let bad = Credentials::administrator(config.admin.login.clone(), "definitely-wrong");
    check(
        session.authenticate(&bad).await.is_err(),
        "invalid password must be rejected",
    )?;
    check_eq(
        session.identity().clone(),
        Identity::Anonymous,
        "identity after rejected login",
    )?;

    session.authenticate(&config.admin).await?;
    check(
        verify::identity_is(&session, Role::Administrator),
        "identity after admin login",
    )?;
    Ok(())
}

/// Creating and immediately destroying an article leaves the marker-tagged
/// listing unchanged.
async fn article_create_destroy(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;

    let before = session.fetch("admin/content").await?;
    let count_before = link_count_matching(&before, &ops::marker_links());

    let id = ops::create_article(&session, "Blag Post 1234", "Lorem ipsum dolor sit amet 4444").await?;
    let landing = ops::destroy_article(&session, &id).await?;
    check(
        page_contains(&landing, "was deleted successfully"),
        "destroy confirmation message",
    )?;

    let after = session.fetch("admin/content").await?;
    check_eq(
        link_count_matching(&after, &ops::marker_links()),
        count_before,
        "tagged listing count after create+destroy",
    )?;
    Ok(())
}

/// A posted comment is visible on a subsequent fetch of the comment view.
async fn comment_round_trip(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;
    let id = ops::create_article(&session, "Blag Post 1234", "Rawr").await?;

    let view = session.fetch(&format!("comments?article_id={id}")).await?;
    check(page_contains(&view, "Rawr"), "comment view shows article body")?;
    let action = Regex::new(&format!(r"/comments\?article_id={id}$")).expect("static pattern");
    let comment_forms = view
        .forms_matching(&mergegrade_harness::FormPredicate::new().action_matches(action))
        .count();
    check_eq(comment_forms, 1, "comment form count")?;

    ops::post_comment(&session, &id, "Lorem ipsum dolor sit amet").await?;
    let view = session.fetch(&format!("comments?article_id={id}")).await?;
    check(
        page_contains(&view, "Lorem ipsum dolor sit amet"),
        "posted comment is visible",
    )?;

    ops::destroy_article(&session, &id).await?;
    Ok(())
}

/// The user-creation form accepts a publisher-role account.
async fn publisher_user_creation(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;

    let page = session.fetch("admin/users/new").await?;
    let action = Regex::new(r"/admin/users/new$").expect("static pattern");
    let forms = page
        .forms_matching(&mergegrade_harness::FormPredicate::new().action_matches(action))
        .count();
    check_eq(forms, 1, "user creation form count")?;

    let landing = ops::create_publisher(&session, ops::PUBLISHER_LOGIN, PUBLISHER_PASSWORD).await?;
    check(
        page_contains(&landing, "was successfully created"),
        "user creation confirmation message",
    )?;
    check(
        page_contains(&landing, ops::PUBLISHER_LOGIN),
        "new login appears on landing page",
    )?;
    Ok(())
}

/// The merge control is present on an article's edit page.
async fn merge_control_on_edit_page(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;
    let id = ops::create_article(&session, "Blag Post 1234", "Lorem ipsum").await?;

    let edit = session.fetch(&format!("admin/content/edit/{id}")).await?;
    check(page_contains(&edit, "Merge Articles"), "merge section heading")?;
    check_eq(field_count(&edit, "merge_with")?, 1, "merge_with control count")?;
    Ok(())
}

/// Merging two articles leaves exactly one marker-tagged listing entry.
async fn merge_produces_single_article(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;
    let a = ops::create_article(&session, "Blag Post A", "Derp derp derp derp 12344321").await?;
    let b = ops::create_article(&session, "Blag Post B", "Lorem ipsum dolor sit amet").await?;

    // merge_articles itself fails unless exactly one tagged article
    // survives; the explicit recount keeps the check visible here.
    ops::merge_articles(&session, &a, &b).await?;
    let listing = session.fetch("admin/content").await?;
    check_eq(
        link_count_matching(&listing, &ops::marker_links()),
        1,
        "tagged listing count after merge",
    )?;
    Ok(())
}

/// The surviving article's edit view carries the text of both originals.
async fn merged_article_keeps_both_bodies(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;
    let a = ops::create_article(&session, "Blag Post A", "Derp derp derp derp 12344321").await?;
    let b = ops::create_article(&session, "Blag Post B", "Lorem ipsum dolor sit amet").await?;

    let merged = ops::merge_articles(&session, &a, &b).await?;
    let edit = session.fetch(&format!("admin/content/edit/{merged}")).await?;
    check(
        page_contains(&edit, "Derp derp derp derp 12344321"),
        "merged body carries target text",
    )?;
    check(
        page_contains(&edit, "Lorem ipsum dolor sit amet"),
        "merged body carries source text",
    )?;
    Ok(())
}

/// Comments from both originals survive on the merged article.
async fn merged_article_carries_comments(config: Config) -> Result<()> {
    let session = admin_session(&config).await?;
    let a = ops::create_article(&session, "Blag Post A", "Derp derp derp derp 12344321").await?;
    let b = ops::create_article(&session, "Blag Post B", "Lorem ipsum dolor sit amet").await?;

    ops::post_comment(&session, &a, "A long time ago in a galaxy far, far away..").await?;
    ops::post_comment(&session, &a, "imma dinosaur  -Barack Obama").await?;
    ops::post_comment(&session, &b, "And one more thing..").await?;

    let merged = ops::merge_articles(&session, &a, &b).await?;
    let view = session.fetch(&format!("comments?article_id={merged}")).await?;
    for comment in [
        "A long time ago in a galaxy far, far away..",
        "imma dinosaur  -Barack Obama",
        "And one more thing..",
    ] {
        check(
            page_contains(&view, comment),
            format!("merged comment view carries {comment:?}"),
        )?;
    }
    Ok(())
}

/// The merge control is hidden from a publisher but shown to an
/// administrator viewing the same article.
async fn merge_control_admin_only(config: Config) -> Result<()> {
    let admin = admin_session(&config).await?;
    ops::create_publisher(&admin, ops::PUBLISHER_LOGIN, PUBLISHER_PASSWORD).await?;
    let publisher = publisher_session(&config).await?;

    let id = ops::create_article(&publisher, "Pub Blag", "derp derp derp").await?;

    let edit = publisher.fetch(&format!("admin/content/edit/{id}")).await?;
    check(
        page_lacks(&edit, "Merge Articles"),
        "publisher edit page hides merge heading",
    )?;
    check(
        !form_field_present(&edit, "merge_with"),
        "publisher edit page declares no merge field",
    )?;
    check_eq(
        field_count(&edit, "merge_with")?,
        0,
        "publisher merge_with control count",
    )?;

    let edit = admin.fetch(&format!("admin/content/edit/{id}")).await?;
    check(
        page_contains(&edit, "Merge Articles"),
        "admin edit page shows merge heading",
    )?;
    check_eq(
        field_count(&edit, "merge_with")?,
        1,
        "admin merge_with control count",
    )?;
    Ok(())
}

/// A publisher forging the merge field leaves both articles in place.
async fn merge_requires_administrator(config: Config) -> Result<()> {
    let admin = admin_session(&config).await?;
    ops::create_publisher(&admin, ops::PUBLISHER_LOGIN, PUBLISHER_PASSWORD).await?;
    let publisher = publisher_session(&config).await?;

    let a = ops::create_article(&publisher, "Blag Post A", "Derp derp derp derp 12344321").await?;
    let b = ops::create_article(&publisher, "Blag Post B", "Lorem ipsum dolor sit amet").await?;

    // The edit page offers no merge control to a publisher, so forge the
    // field onto every form it does offer and submit them all.
    let edit = publisher.fetch(&format!("admin/content/edit/{a}")).await?;
    for form in edit.forms() {
        let mut forged = form.clone();
        forged.force_set("merge_with", b.clone());
        publisher.submit(&forged).await?;
    }

    let listing = admin.fetch("admin/content").await?;
    check_eq(
        link_count_matching(&listing, &ops::marker_links()),
        2,
        "tagged listing count after forged merge",
    )?;
    Ok(())
}
