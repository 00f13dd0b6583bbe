//! Core types and traits for the shortlink service.
//!
//! This crate holds the alias numeral system (dictionary, codec and
//! validator), the service settings and the storage contract shared by the
//! shortener service and the storage backends.

pub mod codec;
pub mod dictionary;
pub mod error;
pub mod settings;
pub mod storage;
pub mod validate;

pub use dictionary::Dictionary;
pub use error::{CoreError, StorageError};
pub use settings::LinkSettings;
pub use storage::{LinkId, LinkStorage};
pub use validate::{is_request_uri, is_valid_alias};
