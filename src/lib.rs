//! Kaj Lagbe: worker directory and session core.

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod requests;
pub mod session;
pub mod store;
