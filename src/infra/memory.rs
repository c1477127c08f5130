//! Process-local repositories used when no database is configured, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, CreateSessionParams, PostsRepo, PostsWriteRepo, RepoError, SessionsRepo,
    UpdatePostParams,
};
use crate::domain::entities::{PostListing, PostRecord, SessionRecord};

const POSTS_SLUG_CONSTRAINT: &str = "posts_slug_key";

#[derive(Default)]
pub struct InMemoryRepositories {
    posts: RwLock<Vec<PostRecord>>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn list_listings(&self) -> Result<Vec<PostListing>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().map(PostRecord::listing).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|post| post.slug == slug).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: POSTS_SLUG_CONSTRAINT.to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            markdown: params.markdown,
            created_at: now,
            updated_at: now,
        };
        posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.write().await;
        let index = posts
            .iter()
            .position(|post| post.slug == params.original_slug)
            .ok_or(RepoError::NotFound)?;

        let collides = posts
            .iter()
            .enumerate()
            .any(|(other, post)| other != index && post.slug == params.slug);
        if collides {
            return Err(RepoError::Duplicate {
                constraint: POSTS_SLUG_CONSTRAINT.to_string(),
            });
        }

        let post = &mut posts[index];
        post.slug = params.slug;
        post.title = params.title;
        post.markdown = params.markdown;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }
}

#[async_trait]
impl SessionsRepo for InMemoryRepositories {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&params.prefix) {
            return Err(RepoError::Duplicate {
                constraint: "admin_sessions_prefix_key".to_string(),
            });
        }

        let record = SessionRecord {
            id: Uuid::new_v4(),
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            created_at: OffsetDateTime::now_utc(),
            expires_at: params.expires_at,
        };
        sessions.insert(record.prefix.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self.sessions.read().await.get(prefix).cloned())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), RepoError> {
        self.sessions.write().await.remove(prefix);
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(slug: &str) -> CreatePostParams {
        CreatePostParams {
            slug: slug.to_string(),
            title: format!("Title {slug}"),
            markdown: format!("# {slug}"),
        }
    }

    #[tokio::test]
    async fn listings_follow_insertion_order() {
        let repo = InMemoryRepositories::new();
        repo.create_post(create("b")).await.unwrap();
        repo.create_post(create("a")).await.unwrap();

        let slugs: Vec<_> = repo
            .list_listings()
            .await
            .unwrap()
            .into_iter()
            .map(|listing| listing.slug)
            .collect();
        assert_eq!(slugs, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected_on_create() {
        let repo = InMemoryRepositories::new();
        repo.create_post(create("a")).await.unwrap();
        let err = repo.create_post(create("a")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { .. }));
        assert_eq!(repo.post_count().await, 1);
    }

    #[tokio::test]
    async fn rename_keeps_identity_and_frees_old_slug() {
        let repo = InMemoryRepositories::new();
        let created = repo.create_post(create("old")).await.unwrap();

        let updated = repo
            .update_post(UpdatePostParams {
                original_slug: "old".into(),
                slug: "new-slug".into(),
                title: "Renamed".into(),
                markdown: "body".into(),
            })
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert!(repo.find_by_slug("old").await.unwrap().is_none());
        assert_eq!(
            repo.find_by_slug("new-slug").await.unwrap().map(|p| p.title),
            Some("Renamed".to_string())
        );
    }

    #[tokio::test]
    async fn rename_onto_another_post_collides() {
        let repo = InMemoryRepositories::new();
        repo.create_post(create("a")).await.unwrap();
        repo.create_post(create("b")).await.unwrap();

        let err = repo
            .update_post(UpdatePostParams {
                original_slug: "a".into(),
                slug: "b".into(),
                title: "t".into(),
                markdown: "m".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn update_of_missing_post_is_not_found() {
        let repo = InMemoryRepositories::new();
        let err = repo
            .update_post(UpdatePostParams {
                original_slug: "nope".into(),
                slug: "nope".into(),
                title: "t".into(),
                markdown: "m".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions() {
        let repo = InMemoryRepositories::new();
        let now = OffsetDateTime::now_utc();
        for (prefix, offset) in [("old", -60i64), ("fresh", 60)] {
            repo.create_session(CreateSessionParams {
                prefix: prefix.into(),
                hashed_secret: vec![0; 32],
                expires_at: now + time::Duration::seconds(offset),
            })
            .await
            .unwrap();
        }

        assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
        assert!(repo.find_by_prefix("fresh").await.unwrap().is_some());
        assert!(repo.find_by_prefix("old").await.unwrap().is_none());
    }
}
