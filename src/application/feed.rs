//! Public read side: post listings and single-post lookup.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostListing, PostRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    pub async fn listings(&self) -> Result<Vec<PostListing>, FeedError> {
        Ok(self.posts.list_listings().await?)
    }

    pub async fn post(&self, slug: &str) -> Result<Option<PostRecord>, FeedError> {
        Ok(self.posts.find_by_slug(slug).await?)
    }
}
