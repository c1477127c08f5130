//! Admin login/logout routes and the `require_admin` gate.

use axum::{
    Router,
    body::Body,
    extract::{Form, Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;
use url::form_urlencoded;

use crate::{
    application::{
        error::HttpError,
        sessions::{AdminAuthError, IssuedSession, SessionError},
    },
    presentation::{
        admin::views::ADMIN_INDEX_PATH,
        views::{LoginTemplate, LoginView, render_template_response},
    },
};

use super::{AdminState, RouterState, repo_error_to_http};

pub const ADMIN_COOKIE_NAME: &str = "postdesk_admin";
const LOGIN_PATH: &str = "/login";
const LOGOUT_REDIRECT: &str = "/posts";

pub fn build_auth_router() -> Router<RouterState> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login_submit))
        .route("/logout", post(logout))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginQuery {
    redirect_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginForm {
    password: String,
    redirect_to: Option<String>,
}

async fn login_form(State(state): State<AdminState>, Query(query): Query<LoginQuery>) -> Response {
    let view = LoginView {
        action: LOGIN_PATH,
        redirect_to: safe_redirect_target(query.redirect_to.as_deref()),
        error: None,
        enabled: state.sessions.login_enabled(),
    };
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}

async fn login_submit(
    State(state): State<AdminState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let target = safe_redirect_target(form.redirect_to.as_deref());

    match state.sessions.login(&form.password).await {
        Ok(issued) => {
            let cookie = session_cookie(&issued, state.cookie_secure);
            (jar.add(cookie), Redirect::to(&target)).into_response()
        }
        Err(SessionError::InvalidCredentials) => {
            let view = LoginView {
                action: LOGIN_PATH,
                redirect_to: target,
                error: Some("Invalid password".to_string()),
                enabled: true,
            };
            render_template_response(LoginTemplate { view }, StatusCode::UNAUTHORIZED)
        }
        Err(SessionError::LoginDisabled) => {
            let view = LoginView {
                action: LOGIN_PATH,
                redirect_to: target,
                error: None,
                enabled: false,
            };
            render_template_response(LoginTemplate { view }, StatusCode::FORBIDDEN)
        }
        Err(SessionError::Repo(err)) => {
            repo_error_to_http("infra::http::login_submit", err).into_response()
        }
        Err(err @ SessionError::TtlOutOfRange(_)) => HttpError::from_error(
            "infra::http::login_submit",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session could not be issued",
            &err,
        )
        .into_response(),
    }
}

async fn logout(State(state): State<AdminState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(ADMIN_COOKIE_NAME) {
        if let Err(err) = state.sessions.logout(cookie.value()).await {
            warn!(
                target = "postdesk::http::auth",
                error = %err,
                "failed to revoke admin session"
            );
        }
    }

    (jar.remove(removal_cookie()), Redirect::to(LOGOUT_REDIRECT)).into_response()
}

/// Gate for every admin route. Handlers behind it only run with a valid session.
pub(super) async fn require_admin(
    State(state): State<AdminState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let original = request
        .uri()
        .path_and_query()
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let Some(token) = jar.get(ADMIN_COOKIE_NAME).map(|cookie| cookie.value().to_string()) else {
        return login_redirect(&original).into_response();
    };

    let principal = match state.sessions.authenticate(&token).await {
        Ok(principal) => principal,
        Err(err) => {
            match &err {
                AdminAuthError::Lookup(repo) => warn!(
                    target = "postdesk::http::auth",
                    error = %repo,
                    path = %original,
                    "admin session lookup failed"
                ),
                other => warn!(
                    target = "postdesk::http::auth",
                    reason = %other,
                    path = %original,
                    "admin session rejected"
                ),
            }
            return (jar.remove(removal_cookie()), login_redirect(&original)).into_response();
        }
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn login_redirect(original: &str) -> Redirect {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_to", original)
        .finish();
    Redirect::to(&format!("{LOGIN_PATH}?{query}"))
}

fn session_cookie(issued: &IssuedSession, secure: bool) -> Cookie<'static> {
    let max_age = issued.expires_at - OffsetDateTime::now_utc();
    Cookie::build((ADMIN_COOKIE_NAME, issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build(ADMIN_COOKIE_NAME).path("/").build()
}

/// Only local absolute paths are followed after login.
pub(super) fn safe_redirect_target(candidate: Option<&str>) -> String {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => ADMIN_INDEX_PATH.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_targets_stay_on_this_site() {
        assert_eq!(safe_redirect_target(Some("/posts/admin/a")), "/posts/admin/a");
        assert_eq!(safe_redirect_target(Some("/posts?x=1")), "/posts?x=1");
        for hostile in [
            "https://evil.example",
            "//evil.example",
            "/\\evil.example",
            "posts",
            "",
        ] {
            assert_eq!(safe_redirect_target(Some(hostile)), ADMIN_INDEX_PATH);
        }
        assert_eq!(safe_redirect_target(None), ADMIN_INDEX_PATH);
    }

    #[test]
    fn login_redirect_encodes_the_original_path() {
        let response = login_redirect("/posts/admin/a b?x=1").into_response();
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert_eq!(location, "/login?redirect_to=%2Fposts%2Fadmin%2Fa+b%3Fx%3D1");
    }
}
