/// Output assets handed back to the host
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiled template bytecode written under the configured output name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeAsset {
    /// Raw bytecode
    pub bytes: Vec<u8>,
    /// Asset metadata
    pub metadata: AssetMetadata,
}

impl BytecodeAsset {
    /// Wrap bytecode produced by the given session
    pub fn new(bytes: Vec<u8>, session: u64) -> Self {
        let metadata = AssetMetadata::for_bytes(&bytes, session);
        Self { bytes, metadata }
    }

    /// Get the asset size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Metadata about an emitted asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Size in bytes
    pub size: usize,
    /// SHA-256 of the bytes, lowercase hex
    pub checksum: String,
    /// Build session that produced the asset
    pub session: u64,
    /// bytebundle version
    pub generator_version: String,
}

impl AssetMetadata {
    fn for_bytes(bytes: &[u8], session: u64) -> Self {
        Self {
            size: bytes.len(),
            checksum: sha256_hex(bytes),
            session,
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// SHA-256 of a byte slice as lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// The host's output asset map
#[derive(Debug, Default, Clone)]
pub struct AssetMap {
    assets: BTreeMap<String, BytecodeAsset>,
}

impl AssetMap {
    /// Create an empty asset map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, name: impl Into<String>, asset: BytecodeAsset) -> Option<BytecodeAsset> {
        self.assets.insert(name.into(), asset)
    }

    /// Look up an asset by name
    pub fn get(&self, name: &str) -> Option<&BytecodeAsset> {
        self.assets.get(name)
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether no asset has been written
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate assets in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BytecodeAsset)> {
        self.assets.iter().map(|(name, asset)| (name.as_str(), asset))
    }

    /// Write every asset below `output_dir`, creating directories as needed
    pub fn write_all(&self, output_dir: &Path) -> BuildResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.assets.len());

        for (name, asset) in &self.assets {
            let output_path = output_dir.join(name);
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::write(&output_path, &asset.bytes).map_err(|e| BuildError::io(&output_path, e))?;
            written.push(output_path);
        }

        Ok(written)
    }
}
