//! ICC profile wrapper.

use crate::{IccError, IccResult, StandardProfile};
use lcms2::{ColorSpaceSignature, Profile as LcmsProfile};
use std::path::Path;

/// An ICC color profile.
///
/// # Example
///
/// ```rust
/// use sky_icc::Profile;
///
/// let srgb = Profile::srgb();
/// assert!(srgb.is_rgb());
/// let bytes = srgb.to_icc().unwrap();
/// assert!(Profile::from_icc(&bytes).unwrap().is_rgb());
/// ```
pub struct Profile {
    pub(crate) inner: LcmsProfile,
}

impl Profile {
    /// Loads a profile from an `.icc` / `.icm` file.
    pub fn from_file(path: &Path) -> IccResult<Self> {
        let inner = LcmsProfile::new_file(path)
            .map_err(|e| IccError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        Ok(Self { inner })
    }

    /// Parses raw ICC bytes.
    pub fn from_icc(data: &[u8]) -> IccResult<Self> {
        let inner =
            LcmsProfile::new_icc(data).map_err(|e| IccError::InvalidProfile(e.to_string()))?;
        Ok(Self { inner })
    }

    /// IEC 61966-2-1 sRGB.
    pub fn srgb() -> Self {
        Self { inner: LcmsProfile::new_srgb() }
    }

    /// Builds a standard profile.
    pub fn from_standard(standard: StandardProfile) -> IccResult<Self> {
        standard.to_profile()
    }

    /// Description tag, empty if missing.
    pub fn description(&self) -> String {
        self.inner
            .info(lcms2::InfoType::Description, lcms2::Locale::none())
            .unwrap_or_default()
    }

    /// Color space signature.
    pub fn color_space(&self) -> String {
        format!("{:?}", self.inner.color_space())
    }

    /// Returns true for RGB profiles.
    pub fn is_rgb(&self) -> bool {
        matches!(self.inner.color_space(), ColorSpaceSignature::RgbData)
    }

    /// Serializes to ICC bytes.
    pub fn to_icc(&self) -> IccResult<Vec<u8>> {
        self.inner.icc().map_err(|e| IccError::CreateFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("description", &self.description())
            .field("color_space", &self.color_space())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb() {
        let profile = Profile::srgb();
        assert!(profile.is_rgb());
        assert!(!profile.description().is_empty());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srgb.icc");
        std::fs::write(&path, Profile::srgb().to_icc().unwrap()).unwrap();
        assert!(Profile::from_file(&path).unwrap().is_rgb());
    }

    #[test]
    fn test_bad_data() {
        assert!(matches!(Profile::from_icc(b"not a profile"), Err(IccError::InvalidProfile(_))));
        assert!(matches!(
            Profile::from_file(Path::new("/nonexistent/x.icc")),
            Err(IccError::LoadFailed(_))
        ));
    }
}
