use crate::application::error::{ErrorReport, HttpError};
use crate::domain::entities::{PostListing, PostRecord};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Uh oh... this post does not exist.";

/// Percent-encodes a slug for use as a single path segment.
pub fn encode_path_segment(segment: &str) -> String {
    // `byte_serialize` writes spaces as `+`, which a path does not decode back.
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn post_href(slug: &str) -> String {
    format!("/posts/{}", encode_path_segment(slug))
}

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(source: &'static str, detail: impl Into<String>) -> Response {
    let view = ErrorPageView::not_found();
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, detail).attach(&mut response);
    response
}

#[derive(Clone)]
pub struct PostLinkView {
    pub title: String,
    pub href: String,
}

impl PostLinkView {
    pub fn public(listing: PostListing) -> Self {
        Self {
            href: post_href(&listing.slug),
            title: listing.title,
        }
    }
}

#[derive(Clone)]
pub struct PostsIndexView {
    pub posts: Vec<PostLinkView>,
    pub admin_href: &'static str,
}

impl PostsIndexView {
    pub fn new(listings: Vec<PostListing>) -> Self {
        Self {
            posts: listings.into_iter().map(PostLinkView::public).collect(),
            admin_href: "/posts/admin",
        }
    }
}

#[derive(Template)]
#[template(path = "posts.html")]
pub struct PostsTemplate {
    pub view: PostsIndexView,
}

/// Detail page; the body is shown as raw markdown.
#[derive(Clone)]
pub struct PostDetailView {
    pub title: String,
    pub markdown: String,
    pub index_href: &'static str,
}

impl From<PostRecord> for PostDetailView {
    fn from(post: PostRecord) -> Self {
        Self {
            title: post.title,
            markdown: post.markdown,
            index_href: "/posts",
        }
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: PostDetailView,
}

#[derive(Clone)]
pub struct ErrorPageView {
    pub heading: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            heading: "Not found".to_string(),
            message: NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            heading: "Uh oh! Something went wrong.".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: ErrorPageView,
}

#[derive(Clone)]
pub struct LoginView {
    pub action: &'static str,
    pub redirect_to: String,
    pub error: Option<String>,
    pub enabled: bool,
}

impl LoginView {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LoginView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_index_links_each_listing() {
        let view = PostsIndexView::new(vec![
            PostListing {
                slug: "hello".into(),
                title: "Hello".into(),
            },
            PostListing {
                slug: "second".into(),
                title: "Second <post>".into(),
            },
        ]);

        let html = PostsTemplate { view }.render().expect("renders");
        assert!(html.contains(r#"href="/posts/hello""#));
        assert!(html.contains("Second &#60;post&#62;") || html.contains("Second &lt;post&gt;"));
        assert!(html.contains(r#"href="/posts/admin""#));
    }

    #[test]
    fn slugs_are_encoded_as_one_path_segment() {
        assert_eq!(post_href("hello"), "/posts/hello");
        assert_eq!(post_href("what?"), "/posts/what%3F");
        assert_eq!(post_href("a/b#c"), "/posts/a%2Fb%23c");
        assert_eq!(post_href("100% done"), "/posts/100%25%20done");
        assert_eq!(post_href("c++"), "/posts/c%2B%2B");
    }

    #[test]
    fn not_found_page_uses_the_missing_post_message() {
        let response = render_not_found_response("test", "post `x` missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
