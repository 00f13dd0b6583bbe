//! Link shortener service implementation.
//!
//! This crate provides [`LinkService`], which turns originals into
//! dictionary-encoded aliases and back, the [`Shortener`] trait it
//! implements, and the gRPC adapter serving it. Core types are re-exported
//! from `shortlink_core`.

pub mod error;
pub mod grpc;
pub mod service;
pub mod shortener;

pub use error::{Result, ShortenerError};
pub use grpc::LinkShortenerGrpcServer;
pub use service::LinkService;
pub use shortener::Shortener;
pub use shortlink_core::LinkSettings;
