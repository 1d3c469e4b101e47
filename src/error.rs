//! Error types for parscale operations.
//!
//! Malformed configuration never reaches this module: the validator coerces it.
//! What remains are execution faults, which propagate out of a benchmark run
//! as a single error and abort it without a partial report.

use thiserror::Error;

/// Errors that can occur while running a benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    /// A matrix buffer could not be allocated.
    #[error("Memory allocation failed: {message} (requested {requested_elements} f32 elements)")]
    AllocationError {
        /// Number of `f32` elements that was requested.
        requested_elements: usize,
        /// Human-readable error message.
        message: String,
    },
    /// A buffer could not be shaped into a square matrix.
    #[error("Invalid matrix shape: {message}")]
    ShapeError {
        /// Human-readable error message.
        message: String,
    },
    /// The chunk plan does not partition the rows of the output buffer.
    #[error("Invalid chunk plan for {rows} rows: {message}")]
    InvalidPlan {
        /// Number of rows in the output buffer.
        rows: usize,
        /// Human-readable error message.
        message: String,
    },
    /// The bounded worker pool could not be built.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    /// A chunk task faulted while executing.
    #[error("Task for rows [{start}, {end}) failed: {message}")]
    TaskFault {
        /// First row of the faulted chunk.
        start: usize,
        /// One past the last row of the faulted chunk.
        end: usize,
        /// Panic payload or fault description.
        message: String,
    },
}

/// Result type alias for parscale operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Creates an allocation error.
pub fn allocation_error(requested_elements: usize, message: impl Into<String>) -> BenchError {
    BenchError::AllocationError {
        requested_elements,
        message: message.into(),
    }
}

/// Creates a shape error.
pub fn shape_error(message: impl Into<String>) -> BenchError {
    BenchError::ShapeError {
        message: message.into(),
    }
}

/// Creates an invalid plan error.
pub fn invalid_plan(rows: usize, message: impl Into<String>) -> BenchError {
    BenchError::InvalidPlan {
        rows,
        message: message.into(),
    }
}

/// Creates a task fault for the chunk `[start, end)`.
pub fn task_fault(start: usize, end: usize, message: impl Into<String>) -> BenchError {
    BenchError::TaskFault {
        start,
        end,
        message: message.into(),
    }
}

impl From<rayon::ThreadPoolBuildError> for BenchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        BenchError::WorkerPool(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BenchError {
    fn from(err: ndarray::ShapeError) -> Self {
        shape_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_display() {
        let error = allocation_error(1 << 20, "capacity overflow");
        let display = format!("{}", error);
        assert!(display.contains("Memory allocation failed"));
        assert!(display.contains("1048576 f32 elements"));
        assert!(display.contains("capacity overflow"));
    }

    #[test]
    fn test_invalid_plan_display() {
        let error = invalid_plan(256, "gap after row 128");
        let display = format!("{}", error);
        assert!(display.contains("256 rows"));
        assert!(display.contains("gap after row 128"));
    }

    #[test]
    fn test_task_fault_display() {
        let error = task_fault(128, 256, "boom");
        assert_eq!(error.to_string(), "Task for rows [128, 256) failed: boom");
    }

    #[test]
    fn test_shape_error_from_ndarray() {
        let err = ndarray::Array2::<f32>::from_shape_vec((2, 2), vec![0.0; 3]).unwrap_err();
        let error: BenchError = err.into();
        assert!(matches!(error, BenchError::ShapeError { .. }));
    }

    #[test]
    fn test_error_equality() {
        let error1 = task_fault(0, 8, "test");
        let error2 = task_fault(0, 8, "test");
        let error3 = task_fault(8, 16, "test");

        assert_eq!(error1, error2);
        assert_ne!(error1, error3);
    }

    #[test]
    fn test_error_trait_implementation() {
        let error = allocation_error(1024, "test error");

        let _: &dyn std::error::Error = &error;

        assert!(std::error::Error::source(&error).is_none());
    }
}
