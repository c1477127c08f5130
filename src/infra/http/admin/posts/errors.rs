use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    application::{admin::posts::AdminPostError, error::ErrorReport, repos::RepoError},
    domain::{entities::PostListing, posts::PostFieldErrors},
    presentation::{
        admin::views::{AdminLayout, AdminMessageTemplate, AdminMessageView},
        views::{NOT_FOUND_MESSAGE, render_template_response},
    },
};

/// Renders a failed load or save inside the admin shell.
pub(super) fn admin_post_error(
    source: &'static str,
    err: AdminPostError,
    listings: Vec<PostListing>,
    active: Option<&str>,
) -> Response {
    let (status, content) = match &err {
        AdminPostError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            AdminMessageView::not_found(NOT_FOUND_MESSAGE),
        ),
        AdminPostError::Rejected(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            AdminMessageView::error(err.to_string()),
        ),
        AdminPostError::Repo(RepoError::Timeout) => (
            StatusCode::SERVICE_UNAVAILABLE,
            AdminMessageView::error(err.to_string()),
        ),
        AdminPostError::Repo(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            AdminMessageView::error(err.to_string()),
        ),
    };

    let view = AdminLayout::new(listings, active, content);
    let mut response = render_template_response(AdminMessageTemplate { view }, status);
    ErrorReport::from_error(source, status, &err).attach(&mut response);
    response
}

pub(super) fn rejected_json(source: &'static str, errors: &PostFieldErrors) -> Response {
    let mut response = (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response();
    ErrorReport::from_message(source, StatusCode::UNPROCESSABLE_ENTITY, "post fields rejected")
        .attach(&mut response);
    response
}
