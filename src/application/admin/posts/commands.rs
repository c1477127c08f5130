use metrics::counter;
use tracing::info;

use crate::application::repos::{CreatePostParams, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::domain::posts::{EditorTarget, PostFieldErrors, PostInput};

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// Creates when the route addresses the draft, otherwise overwrites the post
    /// stored under the route's slug. Exactly one repository mutation is issued.
    pub async fn save(
        &self,
        actor: &str,
        target: &EditorTarget,
        input: PostInput,
    ) -> Result<PostRecord, AdminPostError> {
        let (title, slug, markdown) = input.into_parts();

        let result = match target {
            EditorTarget::New => {
                self.writer
                    .create_post(CreatePostParams {
                        slug,
                        title,
                        markdown,
                    })
                    .await
            }
            EditorTarget::Existing(original_slug) => {
                self.writer
                    .update_post(UpdatePostParams {
                        original_slug: original_slug.clone(),
                        slug,
                        title,
                        markdown,
                    })
                    .await
            }
        };

        let post = match result {
            Ok(post) => post,
            Err(RepoError::Duplicate { .. }) => {
                return Err(AdminPostError::Rejected(PostFieldErrors::slug_taken()));
            }
            Err(RepoError::NotFound) => {
                return Err(AdminPostError::not_found(target.route_segment()));
            }
            Err(err) => return Err(AdminPostError::Repo(err)),
        };

        let action = if target.is_new() {
            "post.create"
        } else {
            "post.update"
        };
        counter!("postdesk_post_mutations_total", "action" => action).increment(1);
        info!(
            target = "postdesk::admin::posts",
            actor = actor,
            action = action,
            post_id = %post.id,
            slug = %post.slug,
            route_slug = target.route_segment(),
            "post saved"
        );

        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::application::repos::{PostsRepo, PostsWriteRepo};
    use crate::domain::entities::PostListing;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(String),
        Update { original: String, slug: String },
    }

    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<Call>>,
        fail_with_duplicate: bool,
        missing: bool,
    }

    impl RecordingRepo {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(slug: &str, title: &str, markdown: &str) -> PostRecord {
            let now = OffsetDateTime::now_utc();
            PostRecord {
                id: Uuid::new_v4(),
                slug: slug.to_string(),
                title: title.to_string(),
                markdown: markdown.to_string(),
                created_at: now,
                updated_at: now,
            }
        }
    }

    #[async_trait]
    impl PostsRepo for RecordingRepo {
        async fn list_listings(&self) -> Result<Vec<PostListing>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_slug(&self, _slug: &str) -> Result<Option<PostRecord>, RepoError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl PostsWriteRepo for RecordingRepo {
        async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(params.slug.clone()));
            if self.fail_with_duplicate {
                return Err(RepoError::Duplicate {
                    constraint: "posts_slug_key".into(),
                });
            }
            Ok(Self::record(&params.slug, &params.title, &params.markdown))
        }

        async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
            self.calls.lock().unwrap().push(Call::Update {
                original: params.original_slug.clone(),
                slug: params.slug.clone(),
            });
            if self.missing {
                return Err(RepoError::NotFound);
            }
            Ok(Self::record(&params.slug, &params.title, &params.markdown))
        }
    }

    fn service(repo: Arc<RecordingRepo>) -> AdminPostService {
        AdminPostService::new(repo.clone(), repo)
    }

    fn input(title: &str, slug: &str, markdown: &str) -> PostInput {
        PostInput::validate(
            Some(title.into()),
            Some(slug.into()),
            Some(markdown.into()),
        )
        .expect("valid input")
    }

    #[tokio::test]
    async fn draft_target_creates() {
        let repo = Arc::new(RecordingRepo::default());
        let post = service(repo.clone())
            .save("admin", &EditorTarget::New, input("A", "a", "b"))
            .await
            .expect("create succeeds");

        assert_eq!(post.slug, "a");
        assert_eq!(repo.calls(), vec![Call::Create("a".into())]);
    }

    #[tokio::test]
    async fn existing_target_updates_by_route_slug() {
        let repo = Arc::new(RecordingRepo::default());
        service(repo.clone())
            .save(
                "admin",
                &EditorTarget::Existing("old".into()),
                input("A", "renamed", "b"),
            )
            .await
            .expect("update succeeds");

        assert_eq!(
            repo.calls(),
            vec![Call::Update {
                original: "old".into(),
                slug: "renamed".into(),
            }]
        );
    }

    #[tokio::test]
    async fn duplicate_slug_becomes_field_error() {
        let repo = Arc::new(RecordingRepo {
            fail_with_duplicate: true,
            ..Default::default()
        });
        let err = service(repo)
            .save("admin", &EditorTarget::New, input("A", "a", "b"))
            .await
            .unwrap_err();

        match err {
            AdminPostError::Rejected(errors) => {
                assert_eq!(errors.slug.as_deref(), Some("Slug is already in use"));
                assert!(errors.title.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_update_target_is_not_found() {
        let repo = Arc::new(RecordingRepo {
            missing: true,
            ..Default::default()
        });
        let err = service(repo)
            .save(
                "admin",
                &EditorTarget::Existing("gone".into()),
                input("A", "a", "b"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdminPostError::NotFound { slug } if slug == "gone"));
    }
}
