//! Grid filesystem configuration.

use crate::error::{GridError, GridResult};

/// Chunk size used when a file is created without an explicit one.
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// Configuration for a [`crate::GridFilesystem`].
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Chunk size for files created without an explicit chunk size.
    pub default_chunk_size: usize,

    /// Whether an explicit `flush` on a write stream also publishes the
    /// new file length. Closing a write stream always publishes it.
    pub publish_length_on_flush: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            publish_length_on_flush: true,
        }
    }
}

impl GridConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default chunk size.
    #[must_use]
    pub const fn default_chunk_size(mut self, size: usize) -> Self {
        self.default_chunk_size = size;
        self
    }

    /// Sets whether `flush` publishes the file length.
    #[must_use]
    pub const fn publish_length_on_flush(mut self, value: bool) -> Self {
        self.publish_length_on_flush = value;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the default chunk size is zero or does not fit
    /// the metadata record.
    pub fn validate(&self) -> GridResult<()> {
        validate_chunk_size(self.default_chunk_size)
    }
}

/// Checks that `size` is a usable chunk size.
pub(crate) fn validate_chunk_size(size: usize) -> GridResult<()> {
    if size == 0 {
        return Err(GridError::invalid_argument("chunk size must be positive"));
    }
    if u32::try_from(size).is_err() {
        return Err(GridError::invalid_argument(format!(
            "chunk size {size} exceeds {}",
            u32::MAX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GridConfig::default();
        assert_eq!(config.default_chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.publish_length_on_flush);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = GridConfig::new()
            .default_chunk_size(4)
            .publish_length_on_flush(false);

        assert_eq!(config.default_chunk_size, 4);
        assert!(!config.publish_length_on_flush);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = GridConfig::new().default_chunk_size(0);
        assert!(matches!(
            config.validate(),
            Err(GridError::InvalidArgument { .. })
        ));
    }
}
