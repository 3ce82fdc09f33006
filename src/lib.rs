pub mod artifacts;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod env;
pub mod fetch;
pub mod observability;
