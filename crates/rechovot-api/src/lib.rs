//! # rechovot-api
//!
//! HTTP API for street search.
//!
//! Exposes free/any/phrase search and soft delete over one street index,
//! plus a health endpoint. Handlers are thin: [`StreetService`] owns the
//! behaviour and maps backend hits to the client shape.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod service;

pub use config::Settings;
pub use error::ApiError;
pub use server::{app, serve};
pub use service::{StreetHit, StreetService};
