//! Encoding parameters.
//!
//! [`Quality`] is the only knob the transcoder exposes. It is fixed per run
//! (from configuration), never negotiated per image.

/// Quality setting for lossy WebP encoding (1-100).
///
/// Only [`Quality::new`] and [`Default`] construct one, so the value is
/// always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// libwebp takes quality as a float in `0.0..=100.0`.
    pub fn as_webp(self) -> f32 {
        self.0 as f32
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}
