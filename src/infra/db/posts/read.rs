use async_trait::async_trait;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostListing, PostRecord};
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::types::{POST_COLUMNS, PostListingRow, PostRow};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_listings(&self) -> Result<Vec<PostListing>, RepoError> {
        let rows = sqlx::query_as::<_, PostListingRow>(
            "SELECT slug, title FROM posts ORDER BY created_at, slug",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostListing::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}
