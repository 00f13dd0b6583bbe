use crate::error::{Result, ShortenerError};
use crate::shortener::Shortener;
use async_trait::async_trait;
use shortlink_core::codec;
use shortlink_core::{
    is_request_uri, is_valid_alias, CoreError, Dictionary, LinkId, LinkSettings, LinkStorage,
    StorageError,
};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// The link shortening service.
///
/// Turns originals into aliases and back on top of a [`LinkStorage`]:
/// - deduplicates originals through an existence lookup
/// - optionally rejects originals that are not request URIs
/// - assigns ids through the storage's atomic append
/// - validates aliases before touching storage on resolve
///
/// The service holds no per-request state and takes no locks itself.
#[derive(Debug)]
pub struct LinkService<S> {
    storage: Arc<S>,
    settings: Arc<LinkSettings>,
    dictionary: Arc<Dictionary>,
    capacity: u64,
}

impl<S> Clone for LinkService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            settings: Arc::clone(&self.settings),
            dictionary: Arc::clone(&self.dictionary),
            capacity: self.capacity,
        }
    }
}

impl<S: LinkStorage> LinkService<S> {
    /// Creates a new service after validating `settings`.
    pub fn new(storage: S, settings: LinkSettings) -> Result<Self> {
        settings.validate()?;

        let dictionary = Dictionary::from_settings(&settings);
        let capacity = dictionary.capacity(settings.short_len).ok_or_else(|| {
            CoreError::InvalidSettings(format!(
                "short_len {} overflows the id space",
                settings.short_len
            ))
        })?;

        Ok(Self {
            storage: Arc::new(storage),
            settings: Arc::new(settings),
            dictionary: Arc::new(dictionary),
            capacity,
        })
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of ids that fit in the configured alias width.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn encode(&self, id: LinkId) -> String {
        codec::encode(
            id,
            self.settings.filler,
            self.settings.short_len,
            &self.settings.domain,
            self.dictionary.digits(),
        )
    }

    pub fn decode(&self, alias: &str) -> Option<LinkId> {
        codec::decode(
            alias,
            self.settings.filler,
            &self.settings.domain,
            self.dictionary.digits(),
        )
    }

    pub fn is_valid_alias(&self, alias: &str) -> bool {
        is_valid_alias(alias, &self.settings, &self.dictionary)
    }

    /// Returns the alias of `original`, storing it under the next id if it
    /// is not stored yet.
    ///
    /// # Errors
    ///
    /// * [`ShortenerError::InvalidUrl`] - URL checking is on and `original`
    ///   is not a request URI
    /// * [`ShortenerError::CapacityExhausted`] - every alias of the configured
    ///   width is taken
    /// * [`ShortenerError::Storage`] - the storage failed; nothing is returned
    pub async fn create_short_link(&self, original: &str) -> Result<String> {
        if let Some(id) = self.storage.exists(original).await? {
            // Stored under a wider configuration; its alias would not parse.
            if id >= self.capacity {
                return Err(ShortenerError::CapacityExhausted(id));
            }
            debug!(id, "original already shortened");
            return Ok(self.encode(id));
        }

        if self.settings.check_urls && !is_request_uri(original) {
            return Err(ShortenerError::InvalidUrl(original.to_string()));
        }

        let stored = self.storage.count().await?;
        if stored >= self.capacity {
            return Err(ShortenerError::CapacityExhausted(stored));
        }

        let id = match self.storage.append(original, self.capacity).await {
            Ok(id) if id < self.capacity => id,
            Ok(id) => return Err(ShortenerError::CapacityExhausted(id)),
            Err(StorageError::Exhausted(stored)) => {
                return Err(ShortenerError::CapacityExhausted(stored));
            }
            Err(err) => return Err(err.into()),
        };

        let alias = self.encode(id);
        info!(id, alias = %alias, "created short link");
        Ok(alias)
    }

    /// Returns the original URL behind `alias`.
    ///
    /// # Errors
    ///
    /// * [`ShortenerError::InvalidAlias`] - `alias` is malformed
    /// * [`ShortenerError::NotFound`] - nothing (or an empty original) is
    ///   stored under the decoded id
    /// * [`ShortenerError::Storage`] - the storage failed
    pub async fn get_original_link(&self, alias: &str) -> Result<String> {
        if !self.is_valid_alias(alias) {
            return Err(ShortenerError::InvalidAlias(alias.to_string()));
        }

        let id = self
            .decode(alias)
            .ok_or_else(|| ShortenerError::InvalidAlias(alias.to_string()))?;
        trace!(id, alias = %alias, "resolving alias");

        match self.storage.load(id).await? {
            Some(original) if !original.is_empty() => Ok(original),
            _ => {
                debug!(id, alias = %alias, "alias not found");
                Err(ShortenerError::NotFound(alias.to_string()))
            }
        }
    }

    /// Releases the storage.
    pub async fn shutdown(&self) -> Result<()> {
        self.storage.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl<S: LinkStorage> Shortener for LinkService<S> {
    async fn shorten(&self, original: &str) -> Result<String> {
        self.create_short_link(original).await
    }

    async fn resolve(&self, alias: &str) -> Result<String> {
        self.get_original_link(alias).await
    }
}
