// Library exports for Lovewall
// This allows integration tests and external code to use Lovewall modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod routes;
pub mod slug;
pub mod state;
pub mod timefmt;
