use axum::{
    Extension,
    extract::{Form, Path, State},
    http::{HeaderMap, StatusCode, header::ACCEPT},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, info};

use crate::{
    application::{
        admin::posts::AdminPostError, error::ErrorReport, sessions::AdminPrincipal,
    },
    domain::{
        entities::PostListing,
        posts::{EditorTarget, PostFieldErrors},
    },
    infra::http::admin::AdminState,
    presentation::{
        admin::views::{
            ADMIN_INDEX_PATH, AdminIndexTemplate, AdminIndexView, AdminLayout,
            AdminPostEditTemplate, AdminPostEditorView,
        },
        views::render_template_response,
    },
};

use super::errors::{admin_post_error, rejected_json};
use super::forms::{PostEditorForm, SubmittedValues};

pub(crate) async fn admin_index(State(state): State<AdminState>) -> Response {
    let listings = match state.posts.listings().await {
        Ok(listings) => listings,
        Err(err) => {
            return admin_post_error("infra::http::admin_index", err, Vec::new(), None);
        }
    };

    let view = AdminLayout::new(listings, None, AdminIndexView::default());
    render_template_response(AdminIndexTemplate { view }, StatusCode::OK)
}

pub(crate) async fn admin_post_editor(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Response {
    let target = EditorTarget::from_route(&slug);
    let listings = match state.posts.listings().await {
        Ok(listings) => listings,
        Err(err) => {
            return admin_post_error("infra::http::admin_post_editor", err, Vec::new(), None);
        }
    };

    match state.posts.load_editor(&target).await {
        Ok(post) => {
            let content = AdminPostEditorView::for_target(&target, post.as_ref());
            let view = AdminLayout::new(listings, Some(target.route_segment()), content);
            render_template_response(AdminPostEditTemplate { view }, StatusCode::OK)
        }
        Err(err) => admin_post_error(
            "infra::http::admin_post_editor",
            err,
            listings,
            Some(target.route_segment()),
        ),
    }
}

pub(crate) async fn admin_post_save(
    State(state): State<AdminState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Form(form): Form<PostEditorForm>,
) -> Response {
    let target = EditorTarget::from_route(&slug);
    let wants_json = accepts_json(&headers);
    form.check_intent(&target);

    let submitted = form.submitted_values();
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            info!(
                target = "postdesk::http::admin::posts",
                route_slug = target.route_segment(),
                "post fields rejected"
            );
            return respond_rejected(&state, &target, submitted, errors, wants_json).await;
        }
    };

    match state.posts.save(&principal.actor(), &target, input).await {
        Ok(_) => Redirect::to(ADMIN_INDEX_PATH).into_response(),
        Err(AdminPostError::Rejected(errors)) => {
            respond_rejected(&state, &target, submitted, errors, wants_json).await
        }
        Err(err) => {
            if let AdminPostError::Repo(repo) = &err {
                error!(
                    target = "postdesk::http::admin::posts",
                    route_slug = target.route_segment(),
                    error = %repo,
                    "failed to save post"
                );
            }
            let listings = load_listings_or_empty(&state).await;
            admin_post_error(
                "infra::http::admin_post_save",
                err,
                listings,
                Some(target.route_segment()),
            )
        }
    }
}

/// Re-renders the editor with the submitted values and inline errors, or sends the
/// bare error map to JSON clients.
async fn respond_rejected(
    state: &AdminState,
    target: &EditorTarget,
    submitted: SubmittedValues,
    errors: PostFieldErrors,
    wants_json: bool,
) -> Response {
    const SOURCE: &str = "infra::http::admin_post_save";

    if wants_json {
        return rejected_json(SOURCE, &errors);
    }

    let listings = load_listings_or_empty(state).await;
    let content = AdminPostEditorView::with_values(
        target,
        submitted.title,
        submitted.slug,
        submitted.markdown,
        errors,
    );
    let view = AdminLayout::new(listings, Some(target.route_segment()), content);
    let mut response =
        render_template_response(AdminPostEditTemplate { view }, StatusCode::UNPROCESSABLE_ENTITY);
    ErrorReport::from_message(SOURCE, StatusCode::UNPROCESSABLE_ENTITY, "post fields rejected")
        .attach(&mut response);
    response
}

/// The navigation is secondary on an error page; a failed listing just leaves it empty.
async fn load_listings_or_empty(state: &AdminState) -> Vec<PostListing> {
    state.posts.listings().await.unwrap_or_default()
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("application/json"))
}
