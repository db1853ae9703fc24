//! projectmatch - Student/mentor project matching
//!
//! Authentication backend: registration restricted to the institutional
//! email domain, cookie-held JWT sessions and a guard for page routes.

pub mod app;
pub mod core;
