//! Face verification for employee authentication.
//!
//! The heavy classifier lives in an external worker process; this module
//! treats it as a fallible remote call with a bounded timeout. When the
//! worker times
//! out, crashes, or returns garbage, a lightweight local pixel comparator
//! takes over, and only when both strategies come up empty does the caller
//! see "face not recognized." A worker failure on its own never surfaces
//! as an error.
//!
//! Uploaded probe images are written under a temp directory and removed on
//! every exit path via an RAII guard.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::Employee;

/// Errors surfaced by face verification.
#[derive(Debug, thiserror::Error)]
pub enum FaceVerifyError {
    /// No probe image in the request.
    #[error("No image provided")]
    NoImage,

    /// The reference-set directory does not exist or is empty.
    #[error("No registered faces found in database")]
    NoReferenceSet,

    /// Every strategy ran and none produced a usable match.
    #[error("Face not recognized")]
    NotRecognized,

    /// Persistence layer error while resolving the matched identity.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Probe could not be written to the temp directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Internal failure of a single classifier strategy. Absorbed by the
/// fallback chain; never returned to callers directly.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierFailure {
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to launch classifier: {0}")]
    Spawn(String),
    #[error("classifier exited with failure: {0}")]
    Failed(String),
    #[error("classifier returned malformed output: {0}")]
    Malformed(String),
}

/// A successful classifier match.
#[derive(Debug, Clone)]
pub struct ClassifierMatch {
    /// Path of the matched reference image, as reported by the strategy.
    pub identity: String,
}

/// A face classification strategy.
///
/// `Ok(None)` is a definite "no match" verdict; `Err` means the strategy
/// itself failed and the next one in the chain should be consulted.
#[async_trait]
pub trait FaceClassifier: Send + Sync {
    async fn classify(
        &self,
        probe: &Path,
        reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure>;
}

/// Face verification configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct FaceConfig {
    /// Worker command line, whitespace-split (`FACE_WORKER_CMD`).
    pub worker_cmd: Vec<String>,
    /// Directory of enrollment images (`FACE_DB_DIR`).
    pub faces_dir: PathBuf,
    /// Directory for uploaded probes (`FACE_TEMP_DIR`).
    pub temp_dir: PathBuf,
    /// Worker timeout (`FACE_TIMEOUT_SECS`, default 20).
    pub timeout: Duration,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            worker_cmd: vec!["python3".into(), "face_worker.py".into()],
            faces_dir: PathBuf::from("media/employee_faces"),
            temp_dir: std::env::temp_dir().join("parkd_probes"),
            timeout: Duration::from_secs(20),
        }
    }
}

impl FaceConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(cmd) = std::env::var("FACE_WORKER_CMD") {
            let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                config.worker_cmd = parts;
            }
        }
        if let Ok(dir) = std::env::var("FACE_DB_DIR") {
            config.faces_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FACE_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("FACE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        config
    }
}

/// Reply printed by the worker process as a single JSON line.
#[derive(Debug, Deserialize)]
struct WorkerReply {
    success: bool,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Primary strategy: external worker subprocess with a bounded timeout.
pub struct SubprocessClassifier {
    cmd: Vec<String>,
    timeout: Duration,
}

impl SubprocessClassifier {
    pub fn new(cmd: Vec<String>, timeout: Duration) -> Self {
        Self { cmd, timeout }
    }
}

#[async_trait]
impl FaceClassifier for SubprocessClassifier {
    async fn classify(
        &self,
        probe: &Path,
        reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure> {
        let (program, args) = self
            .cmd
            .split_first()
            .ok_or_else(|| ClassifierFailure::Spawn("empty worker command".to_string()))?;

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(program)
                .args(args)
                .arg(probe)
                .arg(reference_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ClassifierFailure::Timeout(self.timeout))?
        .map_err(|e| ClassifierFailure::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClassifierFailure::Failed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| ClassifierFailure::Malformed("empty output".to_string()))?;

        let reply: WorkerReply = serde_json::from_str(line)
            .map_err(|e| ClassifierFailure::Malformed(e.to_string()))?;

        if !reply.success {
            debug!(error = ?reply.error, "worker reported no match");
            return Ok(None);
        }

        match reply.identity {
            Some(identity) => Ok(Some(ClassifierMatch { identity })),
            None => Err(ClassifierFailure::Malformed(
                "success reply without identity".to_string(),
            )),
        }
    }
}

const HISTOGRAM_BINS: usize = 256;
/// Maximum per-bin difference (on normalized histograms) for a bin to count
/// as matching.
const BIN_MATCH_TOLERANCE: f32 = 0.004;
/// Minimum number of matching bins for a reference image to be accepted.
const MIN_MATCHING_BINS: usize = 230;

/// Fallback strategy: grayscale histogram comparison against every
/// enrollment image, with a fixed match-count threshold.
///
/// Far weaker than the real classifier; it exists so a worker outage
/// degrades to a crude local check instead of a hard failure.
pub struct PixelComparator {
    min_matching_bins: usize,
}

impl PixelComparator {
    pub fn new() -> Self {
        Self {
            min_matching_bins: MIN_MATCHING_BINS,
        }
    }

    fn histogram(path: &Path) -> Result<[f32; HISTOGRAM_BINS], ClassifierFailure> {
        let img = image::open(path)
            .map_err(|e| ClassifierFailure::Failed(format!("{}: {}", path.display(), e)))?
            .to_luma8();

        let mut counts = [0u32; HISTOGRAM_BINS];
        for pixel in img.pixels() {
            counts[pixel.0[0] as usize] += 1;
        }

        let total = img.pixels().len().max(1) as f32;
        let mut hist = [0f32; HISTOGRAM_BINS];
        for (bin, count) in hist.iter_mut().zip(counts) {
            *bin = count as f32 / total;
        }
        Ok(hist)
    }

    fn matching_bins(a: &[f32; HISTOGRAM_BINS], b: &[f32; HISTOGRAM_BINS]) -> usize {
        a.iter()
            .zip(b.iter())
            .filter(|(x, y)| (*x - *y).abs() <= BIN_MATCH_TOLERANCE)
            .count()
    }
}

impl Default for PixelComparator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceClassifier for PixelComparator {
    async fn classify(
        &self,
        probe: &Path,
        reference_dir: &Path,
    ) -> Result<Option<ClassifierMatch>, ClassifierFailure> {
        let probe = probe.to_path_buf();
        let reference_dir = reference_dir.to_path_buf();
        let min_matching_bins = self.min_matching_bins;

        tokio::task::spawn_blocking(move || {
            let probe_hist = Self::histogram(&probe)?;

            let entries = std::fs::read_dir(&reference_dir)
                .map_err(|e| ClassifierFailure::Failed(e.to_string()))?;

            let mut best: Option<(usize, PathBuf)> = None;
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let reference_hist = match Self::histogram(&path) {
                    Ok(h) => h,
                    // Skip unreadable or non-image files in the reference set
                    Err(_) => continue,
                };
                let score = Self::matching_bins(&probe_hist, &reference_hist);
                if score >= min_matching_bins && best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, path));
                }
            }

            Ok(best.map(|(_, path)| ClassifierMatch {
                identity: path.to_string_lossy().into_owned(),
            }))
        })
        .await
        .map_err(|e| ClassifierFailure::Failed(format!("join error: {}", e)))?
    }
}

/// Removes the uploaded probe on drop, success or failure alike.
struct TempProbe {
    path: PathBuf,
}

impl Drop for TempProbe {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Face verification orchestrator: primary strategy, then fallback, then
/// "not recognized."
pub struct FaceVerifier {
    primary: Box<dyn FaceClassifier>,
    fallback: Box<dyn FaceClassifier>,
    config: FaceConfig,
}

impl FaceVerifier {
    /// Build the default strategy chain from configuration.
    pub fn from_config(config: FaceConfig) -> Self {
        Self {
            primary: Box::new(SubprocessClassifier::new(
                config.worker_cmd.clone(),
                config.timeout,
            )),
            fallback: Box::new(PixelComparator::new()),
            config,
        }
    }

    /// Build a verifier with explicit strategies (used by tests).
    pub fn with_strategies(
        primary: Box<dyn FaceClassifier>,
        fallback: Box<dyn FaceClassifier>,
        config: FaceConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            config,
        }
    }

    /// Verify a probe image against the enrolled reference set and resolve
    /// the matched identity to an employee record.
    pub async fn verify(
        &self,
        repo: &dyn FullRepository,
        image_bytes: &[u8],
        original_name: &str,
    ) -> Result<Employee, FaceVerifyError> {
        if image_bytes.is_empty() {
            return Err(FaceVerifyError::NoImage);
        }
        if !self.config.faces_dir.is_dir() {
            return Err(FaceVerifyError::NoReferenceSet);
        }

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let probe_path = self
            .config
            .temp_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        tokio::fs::write(&probe_path, image_bytes).await?;
        let probe = TempProbe {
            path: probe_path.clone(),
        };

        let matched = match self
            .primary
            .classify(&probe.path, &self.config.faces_dir)
            .await
        {
            Ok(matched) => matched,
            Err(failure) => {
                warn!(%failure, "primary classifier failed, trying local comparator");
                match self
                    .fallback
                    .classify(&probe.path, &self.config.faces_dir)
                    .await
                {
                    Ok(matched) => matched,
                    Err(failure) => {
                        warn!(%failure, "fallback comparator failed");
                        None
                    }
                }
            }
        };

        drop(probe);

        let matched = matched.ok_or(FaceVerifyError::NotRecognized)?;

        // The identity is a path into the reference set; the filename links
        // it back to the enrolled employee.
        let filename = Path::new(&matched.identity)
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or(FaceVerifyError::NotRecognized)?;

        repo.find_by_face_reference(filename)
            .await?
            .ok_or(FaceVerifyError::NotRecognized)
    }
}
