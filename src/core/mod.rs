//! Core domain logic: authentication, persistence, configuration and input validation

pub mod auth;
pub mod config;
pub mod db;
pub mod validation;
