mod errors;
mod forms;
mod handlers;

pub(super) use handlers::{admin_index, admin_post_editor, admin_post_save};
