use thiserror::Error;

use crate::{application::repos::RepoError, domain::posts::PostFieldErrors};

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("post `{slug}` does not exist")]
    NotFound { slug: String },
    #[error("post fields were rejected")]
    Rejected(PostFieldErrors),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminPostError {
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::NotFound { slug: slug.into() }
    }
}
