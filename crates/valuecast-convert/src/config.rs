//! Conversion engine configuration.

/// What to do when a slice target receives a value that is not a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SliceMismatch {
    /// Return the source value unchanged, still typed as its original type.
    #[default]
    PassThrough,
    /// Fail with an unsupported-conversion error.
    Reject,
}

/// Tunables for a [`Converter`](crate::Converter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub slice_mismatch: SliceMismatch,
    /// Maximum nesting depth of composite conversions before giving up.
    pub max_depth: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            slice_mismatch: SliceMismatch::PassThrough,
            max_depth: 128,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slice_mismatch(mut self, policy: SliceMismatch) -> Self {
        self.slice_mismatch = policy;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.slice_mismatch, SliceMismatch::PassThrough);
        assert_eq!(config.max_depth, 128);
    }

    #[test]
    fn builders() {
        let config = ConvertConfig::new()
            .with_slice_mismatch(SliceMismatch::Reject)
            .with_max_depth(8);
        assert_eq!(config.slice_mismatch, SliceMismatch::Reject);
        assert_eq!(config.max_depth, 8);
    }
}
