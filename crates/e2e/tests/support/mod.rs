//! In-process stand-in for the target blog application
//!
//! A deliberately small axum app with the HTML surface the harness drives:
//! cookie login, article CRUD, comments, user administration, and a
//! role-gated merge control. State lives in one mutex; handlers never hold
//! it across an await. Tests bind it to port 0 and hand the address to the
//! harness config.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

type Pairs = Vec<(String, String)>;

#[derive(Debug)]
struct Article {
    title: String,
    body: String,
}

#[derive(Debug)]
struct Comment {
    article_id: u64,
    body: String,
}

#[derive(Debug)]
struct User {
    login: String,
    password: String,
    admin: bool,
}

#[derive(Debug, Default)]
struct Blog {
    next_id: u64,
    articles: BTreeMap<u64, Article>,
    comments: Vec<Comment>,
    users: BTreeMap<u64, User>,
    /// sid cookie value -> user id
    sessions: BTreeMap<u64, u64>,
    next_sid: u64,
}

impl Blog {
    fn seeded() -> Self {
        let mut blog = Blog::default();
        blog.next_id = 1;
        blog.next_sid = 1;
        let admin_id = blog.allocate_id();
        blog.users.insert(
            admin_id,
            User {
                login: "admin".to_string(),
                password: "aaaaaaaa".to_string(),
                admin: true,
            },
        );
        let welcome = blog.allocate_id();
        blog.articles.insert(
            welcome,
            Article {
                title: "Hello world".to_string(),
                body: "The first post on this blog.".to_string(),
            },
        );
        blog
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current_user(&self, headers: &HeaderMap) -> Option<&User> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let sid = cookies.split(';').find_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            (name == "sid").then(|| value.parse::<u64>().ok())?
        })?;
        let user_id = self.sessions.get(&sid)?;
        self.users.get(user_id)
    }

    fn article_links(&self) -> String {
        self.articles
            .iter()
            .map(|(id, a)| format!(r#"<li><a href="/admin/content/edit/{id}">{}</a></li>"#, a.title))
            .collect()
    }

    fn listing_html(&self) -> Html<String> {
        Html(format!(
            "<html><body><h1>Articles</h1><ul>{}</ul></body></html>",
            self.article_links()
        ))
    }

    fn user_links(&self) -> String {
        self.users
            .iter()
            .map(|(id, u)| format!(r#"<li><a href="/admin/users/edit/{id}">{}</a></li>"#, u.login))
            .collect()
    }

    fn comments_html(&self, article_id: u64) -> Option<Html<String>> {
        let article = self.articles.get(&article_id)?;
        let comments: String = self
            .comments
            .iter()
            .filter(|c| c.article_id == article_id)
            .map(|c| format!(r#"<div class="comment">{}</div>"#, c.body))
            .collect();
        Some(Html(format!(
            concat!(
                "<html><body><h1>{title}</h1><div>{body}</div>{comments}",
                r#"<form action="/comments?article_id={id}" method="post">"#,
                r#"<input type="text" name="comment[author]" value="" />"#,
                r#"<input type="text" name="comment[email]" value="" />"#,
                r#"<textarea name="comment[body]"></textarea>"#,
                r#"<input type="submit" value="Post" />"#,
                "</form></body></html>",
            ),
            title = article.title,
            body = article.body,
            comments = comments,
            id = article_id,
        )))
    }
}

#[derive(Clone)]
struct AppState(Arc<Mutex<Blog>>);

fn field(pairs: &Pairs, name: &str) -> String {
    pairs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Html("<html><body>Forbidden</body></html>".to_string()))
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("<html><body>Not found</body></html>".to_string()))
        .into_response()
}

/// Bind the stub to an ephemeral port and serve it in the background.
pub async fn spawn() -> SocketAddr {
    let state = AppState(Arc::new(Mutex::new(Blog::seeded())));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    addr
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/accounts/login", get(login_form).post(login_submit))
        .route("/admin/content", get(content_list))
        .route("/admin/content/new", get(article_form).post(article_create))
        .route(
            "/admin/content/edit/:id",
            get(article_edit).post(article_update),
        )
        .route("/admin/content/merge/:id", axum::routing::post(article_merge))
        .route(
            "/admin/content/destroy/:id",
            get(article_destroy_form).post(article_destroy),
        )
        .route("/comments", get(comments_view).post(comment_create))
        .route("/admin/users", get(users_list))
        .route("/admin/users/new", get(user_form).post(user_create))
        .route(
            "/admin/users/destroy/:id",
            get(user_destroy_form).post(user_destroy),
        )
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html("<html><body><h1>A blog</h1><a href=\"/accounts/login\">Login</a></body></html>")
}

async fn login_form() -> Html<&'static str> {
    Html(concat!(
        "<html><body>",
        r#"<form action="/accounts/login" method="post">"#,
        r#"<input type="text" name="user[login]" value="" />"#,
        r#"<input type="password" name="user[password]" value="" />"#,
        r#"<input type="submit" value="Login" />"#,
        "</form></body></html>",
    ))
}

async fn login_submit(State(state): State<AppState>, Form(pairs): Form<Pairs>) -> Response {
    let login = field(&pairs, "user[login]");
    let password = field(&pairs, "user[password]");
    let mut blog = state.0.lock().unwrap();

    let user_id = blog
        .users
        .iter()
        .find(|(_, u)| u.login == login && u.password == password)
        .map(|(id, _)| *id);
    match user_id {
        Some(user_id) => {
            let sid = blog.next_sid;
            blog.next_sid += 1;
            blog.sessions.insert(sid, user_id);
            (
                [(header::SET_COOKIE, format!("sid={sid}; Path=/"))],
                Html("<html><body><p>Login successful</p></body></html>".to_string()),
            )
                .into_response()
        }
        None => Html("<html><body><p>Login unsuccessful</p></body></html>".to_string())
            .into_response(),
    }
}

async fn content_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    blog.listing_html().into_response()
}

async fn article_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    Html(concat!(
        "<html><body>",
        r#"<form action="/admin/content/new" method="post">"#,
        r#"<input type="text" name="article[title]" value="" />"#,
        r#"<textarea name="article[body_and_extended]"></textarea>"#,
        r#"<input type="submit" value="Publish" />"#,
        "</form></body></html>",
    ))
    .into_response()
}

async fn article_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(pairs): Form<Pairs>,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    let id = blog.allocate_id();
    blog.articles.insert(
        id,
        Article {
            title: field(&pairs, "article[title]"),
            body: field(&pairs, "article[body_and_extended]"),
        },
    );
    blog.listing_html().into_response()
}

async fn article_edit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let blog = state.0.lock().unwrap();
    let Some(user) = blog.current_user(&headers) else {
        return forbidden();
    };
    let Some(article) = blog.articles.get(&id) else {
        return not_found();
    };

    let merge_section = if user.admin {
        format!(
            concat!(
                "<h3>Merge Articles</h3>",
                r#"<form action="/admin/content/merge/{id}" method="post">"#,
                r#"<input type="text" name="merge_with" value="" />"#,
                r#"<input type="submit" value="Merge" />"#,
                "</form>",
            ),
            id = id
        )
    } else {
        String::new()
    };

    Html(format!(
        concat!(
            "<html><body><h1>Edit article</h1>",
            r#"<form action="/admin/content/edit/{id}" method="post">"#,
            r#"<input type="text" name="article[title]" value="{title}" />"#,
            r#"<textarea name="article[body_and_extended]">{body}</textarea>"#,
            r#"<input type="submit" value="Save" />"#,
            "</form>{merge}</body></html>",
        ),
        id = id,
        title = article.title,
        body = article.body,
        merge = merge_section,
    ))
    .into_response()
}

async fn article_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Form(pairs): Form<Pairs>,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    let Some(article) = blog.articles.get_mut(&id) else {
        return not_found();
    };
    // A forged merge_with pair lands here and is ignored: only the declared
    // edit fields are applied.
    article.title = field(&pairs, "article[title]");
    article.body = field(&pairs, "article[body_and_extended]");
    blog.listing_html().into_response()
}

async fn article_merge(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Form(pairs): Form<Pairs>,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    let Some(user) = blog.current_user(&headers) else {
        return forbidden();
    };
    if !user.admin {
        // Non-administrators cannot merge; the submission has no effect.
        return blog.listing_html().into_response();
    }
    let source_id: Option<u64> = field(&pairs, "merge_with").parse().ok();
    if let Some(source_id) = source_id {
        if source_id != id && blog.articles.contains_key(&id) {
            if let Some(source) = blog.articles.remove(&source_id) {
                for comment in blog.comments.iter_mut() {
                    if comment.article_id == source_id {
                        comment.article_id = id;
                    }
                }
                let target = blog.articles.get_mut(&id).unwrap();
                target.body = format!("{}\n\n{}", target.body, source.body);
            }
        }
    }
    blog.listing_html().into_response()
}

async fn article_destroy_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    if !blog.articles.contains_key(&id) {
        return not_found();
    }
    Html(format!(
        concat!(
            "<html><body><p>Are you sure?</p>",
            r#"<form action="/admin/content/destroy/{id}" method="post">"#,
            r#"<input type="hidden" name="confirm" value="yes" />"#,
            r#"<input type="submit" value="Delete" />"#,
            "</form></body></html>",
        ),
        id = id
    ))
    .into_response()
}

async fn article_destroy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    if blog.current_user(&headers).is_none() {
        return forbidden();
    }
    if blog.articles.remove(&id).is_none() {
        return not_found();
    }
    blog.comments.retain(|c| c.article_id != id);
    Html(format!(
        "<html><body><p>The article was deleted successfully</p><ul>{}</ul></body></html>",
        blog.article_links()
    ))
    .into_response()
}

#[derive(serde::Deserialize)]
pub struct CommentQuery {
    article_id: u64,
}

async fn comments_view(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> Response {
    let blog = state.0.lock().unwrap();
    match blog.comments_html(query.article_id) {
        Some(html) => html.into_response(),
        None => not_found(),
    }
}

async fn comment_create(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
    Form(pairs): Form<Pairs>,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    if !blog.articles.contains_key(&query.article_id) {
        return not_found();
    }
    blog.comments.push(Comment {
        article_id: query.article_id,
        body: field(&pairs, "comment[body]"),
    });
    match blog.comments_html(query.article_id) {
        Some(html) => html.into_response(),
        None => not_found(),
    }
}

async fn users_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let blog = state.0.lock().unwrap();
    match blog.current_user(&headers) {
        Some(user) if user.admin => {}
        _ => return forbidden(),
    }
    Html(format!(
        "<html><body><h1>Users</h1><ul>{}</ul></body></html>",
        blog.user_links()
    ))
    .into_response()
}

async fn user_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let blog = state.0.lock().unwrap();
    match blog.current_user(&headers) {
        Some(user) if user.admin => {}
        _ => return forbidden(),
    }
    Html(concat!(
        "<html><body>",
        r#"<form action="/admin/users/new" method="post">"#,
        r#"<input type="text" name="user[login]" value="" />"#,
        r#"<input type="password" name="user[password]" value="" />"#,
        r#"<input type="password" name="user[password_confirmation]" value="" />"#,
        r#"<input type="text" name="user[email]" value="" />"#,
        r#"<select name="user[profile_id]">"#,
        r#"<option value="1">Administrator</option>"#,
        r#"<option value="2" selected>Publisher</option>"#,
        "</select>",
        r#"<input type="submit" value="Create" />"#,
        "</form></body></html>",
    ))
    .into_response()
}

async fn user_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(pairs): Form<Pairs>,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    match blog.current_user(&headers) {
        Some(user) if user.admin => {}
        _ => return forbidden(),
    }
    let login = field(&pairs, "user[login]");
    let id = blog.allocate_id();
    blog.users.insert(
        id,
        User {
            login: login.clone(),
            password: field(&pairs, "user[password]"),
            admin: field(&pairs, "user[profile_id]") == "1",
        },
    );
    Html(format!(
        "<html><body><p>User {login} was successfully created</p><ul>{}</ul></body></html>",
        blog.user_links()
    ))
    .into_response()
}

async fn user_destroy_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let blog = state.0.lock().unwrap();
    match blog.current_user(&headers) {
        Some(user) if user.admin => {}
        _ => return forbidden(),
    }
    if !blog.users.contains_key(&id) {
        return not_found();
    }
    Html(format!(
        concat!(
            "<html><body><p>Are you sure?</p>",
            r#"<form action="/admin/users/destroy/{id}" method="post">"#,
            r#"<input type="hidden" name="confirm" value="yes" />"#,
            r#"<input type="submit" value="Delete" />"#,
            "</form></body></html>",
        ),
        id = id
    ))
    .into_response()
}

async fn user_destroy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut blog = state.0.lock().unwrap();
    match blog.current_user(&headers) {
        Some(user) if user.admin => {}
        _ => return forbidden(),
    }
    if blog.users.remove(&id).is_none() {
        return not_found();
    }
    blog.sessions.retain(|_, user_id| *user_id != id);
    Html(format!(
        "<html><body><p>The user was deleted successfully</p><ul>{}</ul></body></html>",
        blog.user_links()
    ))
    .into_response()
}
