use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Redirect, Response},
    routing::get,
};

use crate::{
    application::{
        error::ErrorReport,
        feed::{FeedError, FeedService},
        repos::RepoError,
    },
    presentation::views::{
        ErrorPageView, ErrorTemplate, PostDetailView, PostTemplate, PostsIndexView,
        PostsTemplate, render_not_found_response, render_template_response,
    },
};

use super::RouterState;

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
}

pub fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/posts", get(posts_index))
        .route("/posts/{slug}", get(post_detail))
}

async fn index() -> Redirect {
    Redirect::to("/posts")
}

async fn posts_index(State(state): State<HttpState>) -> Response {
    match state.feed.listings().await {
        Ok(listings) => {
            let view = PostsIndexView::new(listings);
            render_template_response(PostsTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response("infra::http::posts_index", err),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match state.feed.post(&slug).await {
        Ok(Some(post)) => {
            let view = PostDetailView::from(post);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(
            "infra::http::post_detail",
            format!("post `{slug}` not found"),
        ),
        Err(err) => feed_error_to_response("infra::http::post_detail", err),
    }
}

pub(super) async fn fallback(request: Request<Body>) -> Response {
    render_not_found_response(
        "infra::http::fallback",
        format!("no route for `{}`", request.uri().path()),
    )
}

fn feed_error_to_response(source: &'static str, err: FeedError) -> Response {
    let FeedError::Repo(repo) = err;
    let status = match repo {
        RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let view = ErrorPageView::unexpected(repo.to_string());
    let mut response = render_template_response(ErrorTemplate { view }, status);
    ErrorReport::from_error(source, status, &repo).attach(&mut response);
    response
}
