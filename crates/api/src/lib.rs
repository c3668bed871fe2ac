//! Prompter API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! stores) so integration tests and the binary entrypoint can both access
//! them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod images;
pub mod logbuf;
pub mod router;
pub mod routes;
pub mod state;
pub mod upload;
