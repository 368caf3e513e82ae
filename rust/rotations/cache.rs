use bincode::config::legacy;
use bincode::serde::{decode_from_slice, encode_to_vec};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::json::JSON;
use crate::rotations::generator::{RotationConfig, RotationGenerator, RotationSet};

/// Version of the on-disk layout. Artifacts with another version are regenerated.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Why a cached rotation set cannot be reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Staleness {
    Missing,
    FormatVersion(u32),
    ConfigChanged,
    SourceNewer,
    /// The artifact could not be decoded, e.g. a truncated write.
    Unreadable,
}

/// A generated [`RotationSet`] persisted with the configuration that produced it.
///
/// The artifact is the format version followed by the rotation configuration, as JSON, and the
/// rotation set, encoded with `bincode`.
#[derive(Clone, Debug)]
pub struct RotationCache {
    path: PathBuf,
}

impl RotationCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        RotationCache {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(path: &Path) -> Result<SystemTime> {
        Ok(fs::metadata(path)?.modified()?)
    }

    fn unreadable(&self, err: bincode::error::DecodeError) -> Staleness {
        warn!(path = %self.path.display(), %err, "rotation cache unreadable");
        Staleness::Unreadable
    }

    /// The cached rotation set, or the reason it is stale.
    ///
    /// `source` is the configuration file the rotation config was read from; the cache is stale
    /// when that file was modified after the artifact was written.
    pub fn check(
        &self,
        config: &RotationConfig,
        source: Option<&Path>,
    ) -> Result<std::result::Result<RotationSet, Staleness>> {
        if !self.path.exists() {
            return Ok(Err(Staleness::Missing));
        }
        if let Some(source) = source {
            if Self::modified(source)? > Self::modified(&self.path)? {
                return Ok(Err(Staleness::SourceNewer));
            }
        }
        let bytes = fs::read(&self.path)?;
        let (version, read): (u32, usize) = match decode_from_slice(&bytes, legacy()) {
            Ok(header) => header,
            Err(err) => return Ok(Err(self.unreadable(err))),
        };
        if version != CACHE_FORMAT_VERSION {
            return Ok(Err(Staleness::FormatVersion(version)));
        }
        let (config_json, rotations): (String, RotationSet) =
            match decode_from_slice(&bytes[read..], legacy()) {
                Ok((body, _)) => body,
                Err(err) => return Ok(Err(self.unreadable(err))),
            };
        if config_json != config.to_json()? {
            return Ok(Err(Staleness::ConfigChanged));
        }
        Ok(Ok(rotations))
    }

    /// The cached rotation set if it is fresh.
    pub fn load(&self, config: &RotationConfig, source: Option<&Path>) -> Result<Option<RotationSet>> {
        match self.check(config, source)? {
            Ok(rotations) => {
                debug!(path = %self.path.display(), "rotation cache hit");
                Ok(Some(rotations))
            }
            Err(reason) => {
                debug!(path = %self.path.display(), ?reason, "rotation cache stale");
                Ok(None)
            }
        }
    }

    pub fn store(&self, config: &RotationConfig, rotations: &RotationSet) -> Result<()> {
        let mut bytes = encode_to_vec(CACHE_FORMAT_VERSION, legacy())?;
        bytes.extend(encode_to_vec((config.to_json()?, rotations), legacy())?);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, bytes)?;
        info!(
            path = %self.path.display(),
            phases = rotations.phases.len(),
            "rotation cache written"
        );
        Ok(())
    }

    /// Reuse the cached rotation set when fresh, otherwise generate and store it. `force` always
    /// regenerates.
    pub fn load_or_generate(
        &self,
        config: &RotationConfig,
        source: Option<&Path>,
        force: bool,
    ) -> Result<RotationSet> {
        if !force {
            if let Some(rotations) = self.load(config, source)? {
                return Ok(rotations);
            }
        }
        let rotations = RotationGenerator::try_new(config)?.generate()?;
        self.store(config, &rotations)?;
        Ok(rotations)
    }
}
