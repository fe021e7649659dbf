//! Kernel failure type.

use thiserror::Error;

/// Failure raised while validating, compiling, or dispatching a kernel.
/// Every variant carries enough diagnostic text to report verbatim.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("unsupported shape {dims:?}: {reason}")]
    UnsupportedShape { dims: Vec<usize>, reason: String },

    #[error("operand mismatch: {0}")]
    OperandMismatch(String),

    #[error("invalid sigma {0}: must be finite and positive")]
    InvalidSigma(f32),

    #[error("invalid work-group size {0}: {1}")]
    InvalidWorkGroup(usize, String),

    #[error("reduction over an empty input")]
    EmptyInput,

    #[error("kernel compilation failed: {0}")]
    Compile(String),

    #[error("kernel dispatch failed: {0}")]
    Dispatch(String),
}

impl KernelError {
    pub fn mismatch(message: impl Into<String>) -> Self {
        KernelError::OperandMismatch(message.into())
    }

    pub fn shape(dims: &[usize], reason: impl Into<String>) -> Self {
        KernelError::UnsupportedShape {
            dims: dims.to_vec(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_carry_their_messages() {
        let err = KernelError::Compile("bad token at line 3".into());
        assert_eq!(
            err.to_string(),
            "kernel compilation failed: bad token at line 3"
        );

        let err = KernelError::shape(&[64], "blur requires a 2D shape");
        assert!(err.to_string().contains("[64]"));
        assert!(err.to_string().contains("blur requires a 2D shape"));
    }
}
