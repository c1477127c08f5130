//! Post editor rules: required-field validation, editor addressing and submit intent.

use serde::Serialize;

/// Route segment that addresses the empty draft instead of a stored post.
pub const NEW_POST_SEGMENT: &str = "new";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Slug,
    Markdown,
}

impl PostField {
    pub fn required_message(self) -> &'static str {
        match self {
            PostField::Title => "Title is required",
            PostField::Slug => "Slug is required",
            PostField::Markdown => "Markdown is required",
        }
    }
}

pub const SLUG_TAKEN_MESSAGE: &str = "Slug is already in use";

/// Per-field validation outcome; `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFieldErrors {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub markdown: Option<String>,
}

impl PostFieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.slug.is_none() && self.markdown.is_none()
    }

    pub fn get(&self, field: PostField) -> Option<&str> {
        match field {
            PostField::Title => self.title.as_deref(),
            PostField::Slug => self.slug.as_deref(),
            PostField::Markdown => self.markdown.as_deref(),
        }
    }

    pub fn set(&mut self, field: PostField, message: impl Into<String>) {
        let slot = match field {
            PostField::Title => &mut self.title,
            PostField::Slug => &mut self.slug,
            PostField::Markdown => &mut self.markdown,
        };
        *slot = Some(message.into());
    }

    pub fn slug_taken() -> Self {
        let mut errors = Self::default();
        errors.set(PostField::Slug, SLUG_TAKEN_MESSAGE);
        errors
    }
}

/// A validated `{title, slug, markdown}` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    title: String,
    slug: String,
    markdown: String,
}

impl PostInput {
    /// Checks every field before reporting, so the error map always covers all three.
    pub fn validate(
        title: Option<String>,
        slug: Option<String>,
        markdown: Option<String>,
    ) -> Result<Self, PostFieldErrors> {
        let mut errors = PostFieldErrors::default();
        let title = require(title, PostField::Title, &mut errors);
        let slug = require(slug, PostField::Slug, &mut errors);
        let markdown = require(markdown, PostField::Markdown, &mut errors);

        match (title, slug, markdown) {
            (Some(title), Some(slug), Some(markdown)) if errors.is_empty() => Ok(Self {
                title,
                slug,
                markdown,
            }),
            _ => Err(errors),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn into_parts(self) -> (String, String, String) {
        (self.title, self.slug, self.markdown)
    }
}

fn require(
    value: Option<String>,
    field: PostField,
    errors: &mut PostFieldErrors,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            errors.set(field, field.required_message());
            None
        }
    }
}

/// What an editor route addresses: the empty draft, or a stored post by its current slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorTarget {
    New,
    Existing(String),
}

impl EditorTarget {
    pub fn from_route(segment: &str) -> Self {
        if segment == NEW_POST_SEGMENT {
            Self::New
        } else {
            Self::Existing(segment.to_string())
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    pub fn route_segment(&self) -> &str {
        match self {
            Self::New => NEW_POST_SEGMENT,
            Self::Existing(slug) => slug.as_str(),
        }
    }

    pub fn expected_intent(&self) -> SubmitIntent {
        match self {
            Self::New => SubmitIntent::Create,
            Self::Existing(_) => SubmitIntent::Update,
        }
    }
}

/// Intent carried by the editor form. Advisory only: dispatch follows the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitIntent {
    Create,
    Update,
}

impl SubmitIntent {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}
