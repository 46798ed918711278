//! Built-in display profiles.

use crate::{IccError, IccResult, Profile};
use lcms2::{CIExyY, CIExyYTRIPLE, Profile as LcmsProfile, ToneCurve};

/// Matrix/shaper profiles built from primaries, white point and gamma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardProfile {
    /// IEC 61966-2-1 sRGB.
    Srgb,
    /// sRGB primaries, linear transfer.
    LinearSrgb,
    /// Adobe RGB (1998).
    AdobeRgb,
    /// Display P3.
    DisplayP3,
    /// ITU-R BT.709.
    Rec709,
    /// ITU-R BT.2020.
    Rec2020,
}

/// `(x, y)` chromaticities of red, green, blue.
type Primaries = [(f64, f64); 3];

const D65: (f64, f64) = (0.3127, 0.3290);
const SRGB: Primaries = [(0.640, 0.330), (0.300, 0.600), (0.150, 0.060)];
const ADOBE: Primaries = [(0.640, 0.330), (0.210, 0.710), (0.150, 0.060)];
const P3: Primaries = [(0.680, 0.320), (0.265, 0.690), (0.150, 0.060)];
const BT2020: Primaries = [(0.708, 0.292), (0.170, 0.797), (0.131, 0.046)];

impl StandardProfile {
    /// All standard profiles.
    pub const ALL: [StandardProfile; 6] = [
        StandardProfile::Srgb,
        StandardProfile::LinearSrgb,
        StandardProfile::AdobeRgb,
        StandardProfile::DisplayP3,
        StandardProfile::Rec709,
        StandardProfile::Rec2020,
    ];

    /// Lookup name.
    pub fn name(self) -> &'static str {
        match self {
            StandardProfile::Srgb => "srgb",
            StandardProfile::LinearSrgb => "linear-srgb",
            StandardProfile::AdobeRgb => "adobe-rgb",
            StandardProfile::DisplayP3 => "display-p3",
            StandardProfile::Rec709 => "rec709",
            StandardProfile::Rec2020 => "rec2020",
        }
    }

    /// Case-insensitive lookup; `_` and `-` are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|s| s.name() == key)
    }

    fn params(self) -> (Primaries, f64) {
        match self {
            StandardProfile::Srgb => (SRGB, 2.2),
            StandardProfile::LinearSrgb => (SRGB, 1.0),
            StandardProfile::AdobeRgb => (ADOBE, 2.2),
            StandardProfile::DisplayP3 => (P3, 2.2),
            StandardProfile::Rec709 => (SRGB, 2.4),
            StandardProfile::Rec2020 => (BT2020, 2.4),
        }
    }

    /// Builds the profile.
    pub fn to_profile(self) -> IccResult<Profile> {
        if self == StandardProfile::Srgb {
            return Ok(Profile::srgb());
        }
        let (p, gamma) = self.params();
        let xyy = |(x, y): (f64, f64)| CIExyY { x, y, Y: 1.0 };
        let primaries = CIExyYTRIPLE { Red: xyy(p[0]), Green: xyy(p[1]), Blue: xyy(p[2]) };
        let curve = ToneCurve::new(gamma);
        let inner = LcmsProfile::new_rgb(&xyy(D65), &primaries, &[&curve, &curve, &curve])
            .map_err(|e| IccError::CreateFailed(format!("{}: {}", self.name(), e)))?;
        Ok(Profile { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_standards() {
        for std in StandardProfile::ALL {
            let profile = std.to_profile().unwrap();
            assert!(profile.is_rgb(), "{std:?} should be RGB");
            assert_eq!(StandardProfile::from_name(std.name()), Some(std));
        }
    }

    #[test]
    fn test_name_aliases() {
        assert_eq!(StandardProfile::from_name("Display_P3"), Some(StandardProfile::DisplayP3));
        assert_eq!(StandardProfile::from_name("cmyk"), None);
    }
}
