//! Error types for the comparison engine

use rcmp_core::IntrospectionError;
use thiserror::Error;

/// Result type for comparison operations
pub type EngineResult<T> = Result<T, CompareError>;

/// Failures that abort a comparison
///
/// Differences in the compared data are never errors; only a broken
/// introspection layer stops the traversal.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("introspection failed: {0}")]
    Introspection(#[from] IntrospectionError),
}
