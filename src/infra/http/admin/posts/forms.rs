use serde::Deserialize;
use tracing::warn;

use crate::domain::posts::{EditorTarget, PostFieldErrors, PostInput, SubmitIntent};

/// Raw editor submission. Absent fields decode to `None` and are reported by `validate`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostEditorForm {
    pub(crate) title: Option<String>,
    pub(crate) slug: Option<String>,
    pub(crate) markdown: Option<String>,
    pub(crate) intent: Option<String>,
}

/// Submitted values echoed back into a rejected form.
pub(crate) struct SubmittedValues {
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) markdown: String,
}

impl PostEditorForm {
    pub(crate) fn submitted_values(&self) -> SubmittedValues {
        SubmittedValues {
            title: self.title.clone().unwrap_or_default(),
            slug: self.slug.clone().unwrap_or_default(),
            markdown: self.markdown.clone().unwrap_or_default(),
        }
    }

    /// The route decides create vs update; a disagreeing intent is only logged.
    pub(crate) fn check_intent(&self, target: &EditorTarget) {
        let expected = target.expected_intent();
        match self.intent.as_deref().map(SubmitIntent::parse) {
            Some(Some(intent)) if intent == expected => {}
            Some(Some(intent)) => warn!(
                target = "postdesk::http::admin::posts",
                route_slug = target.route_segment(),
                intent = intent.as_str(),
                expected = expected.as_str(),
                "submit intent disagrees with route"
            ),
            Some(None) => warn!(
                target = "postdesk::http::admin::posts",
                route_slug = target.route_segment(),
                intent = self.intent.as_deref().unwrap_or_default(),
                "unrecognised submit intent"
            ),
            None => {}
        }
    }

    pub(crate) fn validate(self) -> Result<PostInput, PostFieldErrors> {
        PostInput::validate(self.title, self.slug, self.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_decode_as_errors() {
        let form: PostEditorForm = serde_json::from_str(r#"{"slug":"x"}"#).unwrap();
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.title.as_deref(), Some("Title is required"));
        assert!(errors.slug.is_none());
        assert_eq!(errors.markdown.as_deref(), Some("Markdown is required"));
    }

    #[test]
    fn submitted_values_default_to_empty() {
        let form = PostEditorForm {
            slug: Some("x".into()),
            ..Default::default()
        };
        let values = form.submitted_values();
        assert_eq!(values.title, "");
        assert_eq!(values.slug, "x");
    }
}
