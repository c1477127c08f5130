use std::sync::Arc;

use crate::application::{admin::posts::AdminPostService, sessions::AdminSessionService};

#[derive(Clone)]
pub struct AdminState {
    pub posts: Arc<AdminPostService>,
    pub sessions: Arc<AdminSessionService>,
    /// Adds `Secure` to the session cookie; enable behind TLS.
    pub cookie_secure: bool,
}
