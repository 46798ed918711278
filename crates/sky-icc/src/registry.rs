//! Profiles by name.
//!
//! Pipelines refer to profiles by name. A [`ProfileRegistry`] resolves a
//! name to either a registered ICC blob or one of the
//! [`StandardProfile`]s.

use crate::{IccError, IccResult, Profile, StandardProfile};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Name to profile lookup.
///
/// ```rust
/// use sky_icc::ProfileRegistry;
///
/// let mut reg = ProfileRegistry::new();
/// reg.register_icc("monitor", sky_icc::Profile::srgb().to_icc().unwrap()).unwrap();
/// assert!(reg.contains("monitor"));
/// assert!(reg.contains("display-p3"));
/// assert!(reg.get("nope").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    user: BTreeMap<String, Vec<u8>>,
}

impl ProfileRegistry {
    /// Registry with only the standard profiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers raw ICC bytes under `name`, replacing any previous entry.
    pub fn register_icc(&mut self, name: &str, data: Vec<u8>) -> IccResult<()> {
        Profile::from_icc(&data)?;
        debug!(name, bytes = data.len(), "registered ICC profile");
        self.user.insert(name.to_string(), data);
        Ok(())
    }

    /// Reads and registers an ICC file under `name`.
    pub fn register_file(&mut self, name: &str, path: &Path) -> IccResult<()> {
        let data = std::fs::read(path)?;
        self.register_icc(name, data)
    }

    /// Returns true if `name` resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.user.contains_key(name) || StandardProfile::from_name(name).is_some()
    }

    /// Registered and standard names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.user.keys().cloned().collect();
        names.extend(StandardProfile::ALL.iter().map(|s| s.name().to_string()));
        names
    }

    /// Builds the profile for `name`. Registered names shadow standard ones.
    pub fn get(&self, name: &str) -> IccResult<Profile> {
        if let Some(data) = self.user.get(name) {
            return Profile::from_icc(data);
        }
        StandardProfile::from_name(name)
            .ok_or_else(|| IccError::UnknownProfile(name.to_string()))?
            .to_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.icc");
        std::fs::write(&path, Profile::srgb().to_icc().unwrap()).unwrap();
        let mut reg = ProfileRegistry::new();
        reg.register_file("working", &path).unwrap();
        assert!(reg.get("working").unwrap().is_rgb());
        assert!(reg.names().iter().any(|n| n == "working"));
    }

    #[test]
    fn test_rejects_garbage() {
        let mut reg = ProfileRegistry::new();
        assert!(reg.register_icc("bad", vec![0; 16]).is_err());
        assert!(!reg.contains("bad"));
    }

    #[test]
    fn test_missing_file() {
        let mut reg = ProfileRegistry::new();
        assert!(matches!(
            reg.register_file("x", Path::new("/nonexistent/p.icc")),
            Err(IccError::Io(_))
        ));
    }
}
