use std::{fmt, str::FromStr};

use super::grade::{contrast, saturation, vignette, warmth};
use crate::{error::FilterError, frame::Frame};

/// Fixed kernel chains that are not part of the tunable catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Polaroid,
}

impl Preset {
    pub const ALL: [Preset; 1] = [Preset::Polaroid];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Polaroid => "polaroid",
        }
    }

    pub fn apply(self, frame: &Frame) -> Frame {
        match self {
            Preset::Polaroid => polaroid(frame),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}

/// Slightly punchier, warmer colors with a soft dark vignette.
pub fn polaroid(frame: &Frame) -> Frame {
    const SATURATION: i32 = 18;
    const WARMTH: i32 = 12;
    const CONTRAST: i32 = 10;
    const VIGNETTE: i32 = 25;

    let frame = saturation(frame, SATURATION);
    let frame = warmth(&frame, WARMTH);
    let frame = contrast(&frame, CONTRAST);
    vignette(&frame, VIGNETTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polaroid_matches_the_manual_chain() {
        let frame = Frame::filled(5, 4, [30, 120, 210]).unwrap();
        let manual = vignette(
            &contrast(&warmth(&saturation(&frame, 18), 12), 10),
            25,
        );
        assert_eq!(Preset::Polaroid.apply(&frame), manual);
    }

    #[test]
    fn chain_order_matters() {
        let frame = Frame::filled(5, 4, [30, 120, 210]).unwrap();
        let reordered = saturation(&warmth(&vignette(&contrast(&frame, 10), 25), 12), 18);
        assert_ne!(polaroid(&frame), reordered);
    }

    #[test]
    fn presets_parse_by_name() {
        assert_eq!("polaroid".parse::<Preset>().unwrap(), Preset::Polaroid);
        assert!("sepia".parse::<Preset>().is_err());
    }
}
