#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, Response, StatusCode,
        header::{ACCEPT, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use tower::ServiceExt;

use postdesk::application::admin::posts::AdminPostService;
use postdesk::application::feed::FeedService;
use postdesk::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use postdesk::application::sessions::AdminSessionService;
use postdesk::domain::entities::{PostListing, PostRecord};
use postdesk::infra::http::{AdminState, HttpState, RouterState, build_router};
use postdesk::infra::memory::InMemoryRepositories;

pub const PASSWORD: &str = "correct horse";

/// In-memory posts that count every read and write reaching the repository.
/// Reads or writes can be switched to fail with a persistence error.
#[derive(Default)]
pub struct CountingPosts {
    pub inner: InMemoryRepositories,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
}

impl CountingPosts {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, message: &str) {
        *self.read_failure.lock().expect("failure lock") = Some(message.to_string());
    }

    pub fn fail_writes(&self, message: &str) {
        *self.write_failure.lock().expect("failure lock") = Some(message.to_string());
    }

    fn check(slot: &Mutex<Option<String>>) -> Result<(), RepoError> {
        match slot.lock().expect("failure lock").clone() {
            Some(message) => Err(RepoError::Persistence(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostsRepo for CountingPosts {
    async fn list_listings(&self) -> Result<Vec<PostListing>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.read_failure)?;
        self.inner.list_listings().await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.read_failure)?;
        self.inner.find_by_slug(slug).await
    }
}

#[async_trait]
impl PostsWriteRepo for CountingPosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.write_failure)?;
        self.inner.create_post(params).await
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.write_failure)?;
        self.inner.update_post(params).await
    }
}

pub struct TestApp {
    pub posts: Arc<CountingPosts>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_password(Some(PASSWORD))
    }

    pub fn with_password(password: Option<&str>) -> Self {
        let posts = Arc::new(CountingPosts::default());
        let sessions = Arc::new(InMemoryRepositories::new());

        let state = RouterState {
            http: HttpState {
                feed: Arc::new(FeedService::new(posts.clone())),
            },
            admin: AdminState {
                posts: Arc::new(AdminPostService::new(posts.clone(), posts.clone())),
                sessions: Arc::new(AdminSessionService::new(
                    sessions,
                    password,
                    Duration::from_secs(600),
                )),
                cookie_secure: false,
            },
        };

        Self {
            posts,
            router: build_router(state),
        }
    }

    pub async fn seed(&self, slug: &str, title: &str, markdown: &str) -> PostRecord {
        self.posts
            .inner
            .create_post(CreatePostParams {
                slug: slug.to_string(),
                title: title.to_string(),
                markdown: markdown.to_string(),
            })
            .await
            .expect("seed post")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Logs in and returns the `Cookie` header value for later requests.
    pub async fn login(&self) -> String {
        let body = format!("password={}", PASSWORD.replace(' ', "+"));
        let response = self.send(form_post("/login", None, &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login sets the session cookie")
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn form_post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn json_form_post(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .header(COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `name=value` of the admin session cookie, when the response sets a non-empty one.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.starts_with("postdesk_admin="))
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.len() > "postdesk_admin=".len())
        .map(str::to_string)
}

pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
