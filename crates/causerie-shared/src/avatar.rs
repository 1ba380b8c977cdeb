//! Placeholder avatar assignment.
//!
//! Each participant gets one of a fixed set of placeholder images, picked
//! uniformly at random the first time the participant is seen.  Choosing is
//! kept separate from rendering: the UI only asks which asset to show once
//! the remote avatar failed to load.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_AVATARS;
use crate::error::CauserieError;

/// Index into [`FALLBACK_AVATARS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackImage(u8);

impl FallbackImage {
    pub fn new(index: usize) -> Result<Self, CauserieError> {
        if index >= FALLBACK_AVATARS.len() {
            return Err(CauserieError::InvalidFallback(index));
        }
        Ok(Self(index as u8))
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// File name of the bundled placeholder asset.
    pub fn asset_name(&self) -> &'static str {
        FALLBACK_AVATARS[self.index()]
    }
}

/// Picks placeholder avatars.  Seedable so tests get a deterministic
/// sequence.
#[derive(Debug, Clone)]
pub struct FallbackAssigner {
    rng: StdRng,
}

impl FallbackAssigner {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn assign(&mut self) -> FallbackImage {
        FallbackImage(self.rng.gen_range(0..FALLBACK_AVATARS.len()) as u8)
    }
}

impl Default for FallbackAssigner {
    fn default() -> Self {
        Self::from_entropy()
    }
}
