//! # skill-embeddings
//!
//! Local dense embeddings for skill phrases using Candle.
//!
//! Turns a normalized skill phrase ("Python, Go") into a unit-length vector so
//! that wanted-skills and offered-skills can be compared by cosine similarity
//! without calling out to a hosted API.
//!
//! ## Features
//! - all-MiniLM-L6-v2 sentence-transformer (384 dimensions), CPU inference
//! - Model files fetched once from HuggingFace Hub and cached on disk
//! - Batch embedding so a whole population can be vectorized up front

pub mod cache;
pub mod candle;
pub mod error;
pub mod model;

pub use crate::candle::{CandleEmbedder, DEFAULT_BATCH_SIZE, EMBEDDING_DIM};
pub use cache::{get_or_download_model, ModelCache, ModelPaths, DEFAULT_MODEL_REPO, MODEL_FILES};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
