//! Texture sizing configuration.

use serde::{Deserialize, Serialize};

/// Largest texture side most WebGL-class devices guarantee.
pub const DEFAULT_MAX_TEXTURE_SIZE: usize = 4096;

/// Limits applied when computing physical texture dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexelConfig {
    /// Maximum width and height of a single texture, in texels.
    pub max_texture_size: usize,
}

impl TexelConfig {
    pub fn new(max_texture_size: usize) -> Self {
        assert!(max_texture_size > 0, "max_texture_size must be positive");
        Self { max_texture_size }
    }

    /// Defaults overridden by `TEXEL_RS_MAX_TEXTURE_SIZE` when it is set.
    pub fn from_env() -> Self {
        crate::env::max_texture_size_override()
            .map(Self::new)
            .unwrap_or_default()
    }
}

impl Default for TexelConfig {
    fn default() -> Self {
        Self {
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
        }
    }
}
