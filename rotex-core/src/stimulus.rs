use std::fmt;

use serde::{Deserialize, Serialize};
use tiny_skia::Transform;

/// Handedness of the presented character.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    Normal,
    Mirror,
}

impl Version {
    pub const BOTH: [Version; 2] = [Version::Normal, Version::Mirror];

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Normal => "normal",
            Version::Mirror => "mirror",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a character is drawn: which glyph, how far it is rotated and
/// whether it is mirrored.
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct StimulusPose {
    pub character: char,
    pub angle: u16,
    pub mirrored: bool,
}

impl StimulusPose {
    pub fn upright(character: char) -> Self {
        Self {
            character,
            angle: 0,
            mirrored: false,
        }
    }

    pub fn rotated(character: char, angle: u16, version: Version) -> Self {
        Self {
            character,
            angle,
            mirrored: version == Version::Mirror,
        }
    }

    /// Glyph-space to canvas transform centred on `(cx, cy)`.
    ///
    /// The horizontal flip is applied before the rotation, so a mirrored
    /// character is rotated the same way as its normal counterpart.
    pub fn transform(&self, cx: f32, cy: f32) -> Transform {
        let flip = if self.mirrored { -1.0 } else { 1.0 };
        Transform::from_scale(flip, 1.0)
            .post_rotate(f32::from(self.angle))
            .post_translate(cx, cy)
    }
}
