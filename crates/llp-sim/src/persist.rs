//! Persistence of lab-frame LLP ensembles.
//!
//! Production and aggregation are decoupled through a store keyed by
//! `(model, energy, channel label, mass)`: the dispatcher writes one
//! ensemble per channel, the aggregator reads back whichever ensembles
//! exist. A missing artifact is a normal outcome (`Ok(None)`), never an
//! error, so best-effort aggregation over previously simulated channels
//! works without special-casing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use llp_core::errors::ErrorInfo;
use llp_core::{SimError, WeightedSample};
use serde::{Deserialize, Serialize};

/// Identifies one persisted channel ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Model name.
    pub model: String,
    /// Collider energy identifier (TeV label).
    pub energy: String,
    /// Production-channel label.
    pub channel: String,
    /// LLP mass the ensemble was generated at.
    pub mass: f64,
}

impl ArtifactKey {
    /// Creates a key.
    pub fn new(
        model: impl Into<String>,
        energy: impl Into<String>,
        channel: impl Into<String>,
        mass: f64,
    ) -> Self {
        Self {
            model: model.into(),
            energy: energy.into(),
            channel: channel.into(),
            mass,
        }
    }

    fn file_name(&self) -> String {
        format!("{}TeV_{}_m_{}.bin", self.energy, self.channel, self.mass)
    }

    fn flat(&self) -> String {
        format!("{}/{}", self.model, self.file_name())
    }
}

/// Storage collaborator for lab-frame ensembles.
pub trait SpectrumStore: Send + Sync {
    /// Loads an ensemble, or `None` if it was never stored.
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<WeightedSample>>, SimError>;

    /// Stores an ensemble, replacing any previous one under the same key.
    fn store(&self, key: &ArtifactKey, samples: &[WeightedSample]) -> Result<(), SimError>;
}

/// Directory-backed store writing one `bincode` file per key.
///
/// The binary dump round-trips `f64` values losslessly, which the
/// probability computations downstream rely on.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Creates a store rooted at `root`; directories are created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(&key.model).join(key.file_name())
    }
}

impl SpectrumStore for DirStore {
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<WeightedSample>>, SimError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|err| persist_error("ensemble-read", err, &path))?;
        let samples = bincode::deserialize(&bytes)
            .map_err(|err| persist_error("ensemble-decode", err, &path))?;
        Ok(Some(samples))
    }

    fn store(&self, key: &ArtifactKey, samples: &[WeightedSample]) -> Result<(), SimError> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| persist_error("ensemble-mkdir", err, parent))?;
        }
        let bytes = bincode::serialize(samples)
            .map_err(|err| persist_error("ensemble-encode", err, &path))?;
        fs::write(&path, bytes).map_err(|err| persist_error("ensemble-write", err, &path))
    }
}

fn persist_error(code: &str, err: impl ToString, path: &Path) -> SimError {
    SimError::Persist(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// In-memory store used by tests and short-lived scans.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<String, Vec<WeightedSample>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectrumStore for MemoryStore {
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<WeightedSample>>, SimError> {
        let guard = self.inner.lock().map_err(|_| poisoned())?;
        Ok(guard.get(&key.flat()).cloned())
    }

    fn store(&self, key: &ArtifactKey, samples: &[WeightedSample]) -> Result<(), SimError> {
        let mut guard = self.inner.lock().map_err(|_| poisoned())?;
        guard.insert(key.flat(), samples.to_vec());
        Ok(())
    }
}

fn poisoned() -> SimError {
    SimError::Persist(ErrorInfo::new("store-poisoned", "in-memory store mutex poisoned"))
}
