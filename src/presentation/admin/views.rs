use askama::Template;

use crate::domain::entities::{PostListing, PostRecord};
use crate::domain::posts::{EditorTarget, NEW_POST_SEGMENT, PostFieldErrors, SubmitIntent};
use crate::presentation::views::encode_path_segment;

pub const ADMIN_INDEX_PATH: &str = "/posts/admin";

pub fn admin_post_href(segment: &str) -> String {
    format!("{ADMIN_INDEX_PATH}/{}", encode_path_segment(segment))
}

#[derive(Clone)]
pub struct AdminNavigationItemView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub navigation: Vec<AdminNavigationItemView>,
    pub new_post_href: String,
    pub logout_action: &'static str,
    pub content: T,
}

impl<T> AdminLayout<T> {
    /// `active` is the route segment currently open in the editor, if any.
    pub fn new(listings: Vec<PostListing>, active: Option<&str>, content: T) -> Self {
        let navigation = listings
            .into_iter()
            .map(|listing| AdminNavigationItemView {
                is_active: active == Some(listing.slug.as_str()),
                href: admin_post_href(&listing.slug),
                label: listing.title,
            })
            .collect();

        Self {
            navigation,
            new_post_href: admin_post_href(NEW_POST_SEGMENT),
            logout_action: "/logout",
            content,
        }
    }

    pub fn has_posts(&self) -> bool {
        !self.navigation.is_empty()
    }
}

#[derive(Clone)]
pub struct AdminIndexView {
    pub new_post_href: String,
}

impl Default for AdminIndexView {
    fn default() -> Self {
        Self {
            new_post_href: admin_post_href(NEW_POST_SEGMENT),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub view: AdminLayout<AdminIndexView>,
}

#[derive(Clone)]
pub struct AdminSubmitButtonView {
    pub intent: &'static str,
    pub label: &'static str,
    pub pending_label: &'static str,
}

impl AdminSubmitButtonView {
    pub fn for_target(target: &EditorTarget) -> Self {
        let intent = target.expected_intent();
        let (label, pending_label) = match intent {
            SubmitIntent::Create => ("Create Post", "Creating..."),
            SubmitIntent::Update => ("Update Post", "Updating..."),
        };
        Self {
            intent: intent.as_str(),
            label,
            pending_label,
        }
    }
}

#[derive(Clone)]
pub struct AdminPostEditorView {
    pub heading: String,
    pub form_action: String,
    pub title: String,
    pub slug: String,
    pub markdown: String,
    pub errors: PostFieldErrors,
    pub submit: AdminSubmitButtonView,
}

impl AdminPostEditorView {
    /// Editor prefilled from the stored post, or empty for the draft.
    pub fn for_target(target: &EditorTarget, post: Option<&PostRecord>) -> Self {
        let (title, slug, markdown) = post
            .map(|post| {
                (
                    post.title.clone(),
                    post.slug.clone(),
                    post.markdown.clone(),
                )
            })
            .unwrap_or_default();

        Self::with_values(target, title, slug, markdown, PostFieldErrors::default())
    }

    /// Editor echoing the submitted values next to their field errors.
    pub fn with_values(
        target: &EditorTarget,
        title: String,
        slug: String,
        markdown: String,
        errors: PostFieldErrors,
    ) -> Self {
        let heading = match target {
            EditorTarget::New => "New post".to_string(),
            EditorTarget::Existing(slug) => format!("Editing {slug}"),
        };

        Self {
            heading,
            form_action: admin_post_href(target.route_segment()),
            title,
            slug,
            markdown,
            errors,
            submit: AdminSubmitButtonView::for_target(target),
        }
    }

    pub fn title_error(&self) -> Option<&str> {
        self.errors.title.as_deref()
    }

    pub fn slug_error(&self) -> Option<&str> {
        self.errors.slug.as_deref()
    }

    pub fn markdown_error(&self) -> Option<&str> {
        self.errors.markdown.as_deref()
    }
}

#[derive(Template)]
#[template(path = "admin/post_edit.html")]
pub struct AdminPostEditTemplate {
    pub view: AdminLayout<AdminPostEditorView>,
}

/// Message shown in place of the editor: a missing post or a failed save.
#[derive(Clone)]
pub struct AdminMessageView {
    pub heading: String,
    pub message: String,
    pub is_error: bool,
}

impl AdminMessageView {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            heading: "Not found".to_string(),
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            heading: "Uh oh! Something went wrong.".to_string(),
            message: message.into(),
            is_error: true,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/message.html")]
pub struct AdminMessageTemplate {
    pub view: AdminLayout<AdminMessageView>,
}
