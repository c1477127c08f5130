//! postdesk: public post pages and a session-gated admin editor.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
