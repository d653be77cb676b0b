//! Vector embedding abstraction layer.
//!
//! The embedding model itself lives outside this crate; the store only needs
//! something that turns a text into a vector. Two in-process providers are
//! included: a zero-vector stub and a deterministic hash-seeded provider
//! for tests and offline runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EmbeddingConfig;
use crate::error::{RecallError, Result};
use crate::types::Embedding;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Generate vector embeddings from text.
///
/// Implementations must be `Send + Sync` for use from async contexts and
/// must return the same vector for the same text within a run.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecallError::Embedding`] if the model fails to
    /// produce an embedding. Callers treat this as fatal for the operation.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A human-readable name for the model.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Stub provider
// ---------------------------------------------------------------------------

/// A stub embedding provider that returns zero-vectors.
pub struct StubEmbeddingProvider {
    dims: usize,
}

impl StubEmbeddingProvider {
    /// Create a new stub provider with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dims: dimensions }
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for StubEmbeddingProvider {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Ok(Embedding(vec![0.0; self.dims]))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "stub-zero-vector"
    }
}

// ---------------------------------------------------------------------------
// Hash-seeded provider
// ---------------------------------------------------------------------------

/// Unit-length pseudo-random vectors seeded from the text.
///
/// Identical text always yields an identical vector (across runs too), which
/// makes it suitable for golden tests and for running without a model.
pub struct HashEmbeddingProvider {
    dims: usize,
}

impl HashEmbeddingProvider {
    /// Create a new hash-seeded provider.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dims: dimensions }
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut rng = StdRng::seed_from_u64(fnv1a(text.as_bytes()));
        let raw: Vec<f32> = (0..self.dims).map(|_| rng.gen_range(-1.0..1.0)).collect();

        // L2-normalize
        let mag: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if mag < f32::EPSILON {
            return Ok(Embedding(vec![0.0; self.dims]));
        }
        Ok(Embedding(raw.iter().map(|x| x / mag).collect()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "fnv-seeded-unit-vector"
    }
}

/// Build the provider named in the config.
///
/// # Errors
///
/// Returns [`RecallError::Config`] for an unknown provider name or a zero
/// dimension.
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    if config.dimensions == 0 {
        return Err(RecallError::Config("embedding.dimensions must be > 0".into()));
    }
    match config.provider.as_str() {
        "hash" => Ok(Box::new(HashEmbeddingProvider::new(config.dimensions))),
        "stub" => Ok(Box::new(StubEmbeddingProvider::new(config.dimensions))),
        other => Err(RecallError::Config(format!("unknown embedding provider '{other}'"))),
    }
}
