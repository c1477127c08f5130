use crate::domain::entities::{PostListing, PostRecord};
use crate::domain::posts::EditorTarget;

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    pub async fn listings(&self) -> Result<Vec<PostListing>, AdminPostError> {
        self.reader
            .list_listings()
            .await
            .map_err(AdminPostError::from)
    }

    /// Loads the post an editor route addresses; the draft target has nothing to load.
    pub async fn load_editor(
        &self,
        target: &EditorTarget,
    ) -> Result<Option<PostRecord>, AdminPostError> {
        match target {
            EditorTarget::New => Ok(None),
            EditorTarget::Existing(slug) => match self.reader.find_by_slug(slug).await? {
                Some(post) => Ok(Some(post)),
                None => Err(AdminPostError::not_found(slug.as_str())),
            },
        }
    }
}
