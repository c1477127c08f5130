use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{PostListing, PostRecord};

pub(super) const POST_COLUMNS: &str = "id, slug, title, markdown, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) markdown: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            markdown: row.markdown,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostListingRow {
    pub(crate) slug: String,
    pub(crate) title: String,
}

impl From<PostListingRow> for PostListing {
    fn from(row: PostListingRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
        }
    }
}
