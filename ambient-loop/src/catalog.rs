//! Sound catalog: static mapping from sound name to asset reference

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Opaque reference to a loadable audio asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named sound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundDefinition {
    pub name: String,
    pub asset: AssetRef,
}

/// Read-only set of sound definitions, in definition order
///
/// Lookups are exact, case-sensitive name matches.
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    sounds: Vec<SoundDefinition>,
}

const REFERENCE_SOUNDS: [(&str, &str); 8] = [
    ("Ocean Waves", "sounds/ocean_waves.mp3"),
    ("Rain", "sounds/rain.mp3"),
    ("Forest", "sounds/forest.mp3"),
    ("Thunderstorm", "sounds/thunderstorm.mp3"),
    ("White Noise", "sounds/white_noise.mp3"),
    ("Fireplace", "sounds/fireplace.mp3"),
    ("Stream", "sounds/stream.mp3"),
    ("Night Crickets", "sounds/night_crickets.mp3"),
];

impl SoundCatalog {
    /// Build a catalog from explicit definitions
    ///
    /// A later definition with a duplicate name is ignored.
    pub fn new(definitions: impl IntoIterator<Item = SoundDefinition>) -> Self {
        let mut sounds: Vec<SoundDefinition> = Vec::new();
        for definition in definitions {
            if sounds.iter().any(|s| s.name == definition.name) {
                continue;
            }
            sounds.push(definition);
        }
        Self { sounds }
    }

    /// The built-in eight-sound catalog
    pub fn reference() -> Self {
        Self::new(REFERENCE_SOUNDS.iter().map(|(name, asset)| SoundDefinition {
            name: (*name).to_string(),
            asset: AssetRef::new(*asset),
        }))
    }

    pub fn get(&self, name: &str) -> Option<&SoundDefinition> {
        self.sounds.iter().find(|s| s.name == name)
    }

    /// Look up a sound, failing with `UnknownSound`
    pub fn resolve(&self, name: &str) -> Result<&SoundDefinition> {
        self.get(name)
            .ok_or_else(|| Error::UnknownSound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.sounds.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::reference()
    }
}
