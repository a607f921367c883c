//! Loader configuration

use crate::provider::DEFAULT_COLLECTION;
use crate::settings::{SettingsError, DEFAULT_BATCH_SIZE};

/// Configuration for one load
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Collection to read enabled/priority state from
    pub collection_id: String,

    /// Packages per batch; cancellation is checked between batches
    pub batch_size: usize,

    /// Extra body-framework name tokens for the classifier and detector
    pub body_tokens: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            collection_id: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            body_tokens: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.collection_id.trim().is_empty() {
            return Err(SettingsError::EmptyCollection);
        }

        if self.batch_size == 0 {
            return Err(SettingsError::InvalidBatchSize);
        }

        Ok(())
    }
}
