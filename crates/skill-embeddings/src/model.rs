//! Embedding model trait and vector type.

use crate::error::EmbeddingError;

/// Unit-length embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Build an embedding, scaling `values` to unit length.
    /// An all-zero vector is kept as is.
    pub fn new(values: Vec<f32>) -> Self {
        let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            Self {
                values: values.into_iter().map(|x| x / norm).collect(),
            }
        } else {
            Self { values }
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity in [-1, 1].
    ///
    /// Both sides are unit length, so this is the dot product. Vectors of
    /// different dimension score 0.0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub dimension: usize,
    /// Longest input in tokens; longer phrases are truncated
    pub max_sequence_length: usize,
}

/// A text embedding model.
///
/// Implementations must be `Send + Sync`: one instance is built at process
/// start and shared by every refresh.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed several texts in one call. Output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Embed any number of texts, `chunk_size` at a time.
    ///
    /// Fails with `CountMismatch` if a chunk yields the wrong number of vectors.
    fn embed_chunked(
        &self,
        texts: &[String],
        chunk_size: usize,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let chunk_size = chunk_size.max(1);
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(chunk_size) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let vectors = self.embed_batch(&refs)?;
            if vectors.len() != chunk.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: chunk.len(),
                    actual: vectors.len(),
                });
            }
            out.extend(vectors);
        }
        Ok(out)
    }
}
