//! Error taxonomy for operator invocations.
//!
//! Every failure is reported synchronously to the immediate caller; no operator
//! returns a partial output.

use thiserror::Error;

use crate::tensor::{DataId, Shape};

/// A shape with a zero-length axis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("shape dimensions must be positive: {dims:?}")]
pub struct ShapeError {
    pub dims: Vec<usize>,
}

/// Raised when computing a physical texture layout is impossible.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("rank {rank} is outside the supported range 1..={max}")]
    UnsupportedRank { rank: usize, max: usize },
    /// `texels` saturates at `usize::MAX` when the count itself overflows.
    #[error("shape {shape} needs {texels} texels, which exceed a {max}x{max} texture")]
    TooLarge {
        shape: Shape,
        texels: usize,
        max: usize,
    },
}

/// Raised when a typed kernel fragment is malformed.
///
/// These are caught while the kernel is being assembled, before any source
/// text reaches the execution engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KernelBuildError {
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("invalid sampler name `{0}`: expected a single ASCII uppercase letter")]
    InvalidSampler(String),
    #[error("kernels support ranks 1..=6, got {0}")]
    UnsupportedRank(usize),
    #[error("coordinate expression must not be empty")]
    EmptyCoordExpr,
    #[error("coordinate expression has {got} axes, kernel rank is {expected}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("kernel reads sampler `{0}` which is not declared")]
    UndeclaredSampler(String),
}

/// The execution environment rejected generated kernel source.
///
/// Generation is deterministic, so this is always fatal and never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("kernel `{kernel}` failed to compile: {message}")]
pub struct KernelCompileError {
    pub kernel: String,
    pub message: String,
}

impl KernelCompileError {
    pub fn new(kernel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OpError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no texture resource recorded for {data_id}: {what}")]
    ResourceMissing { data_id: DataId, what: &'static str },
    #[error(transparent)]
    KernelCompile(#[from] KernelCompileError),
    #[error(transparent)]
    KernelBuild(#[from] KernelBuildError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("no operator registered under `{0}`")]
    UnknownOperator(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl OpError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        OpError::InvalidArgument(message.into())
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        OpError::Dispatch(message.into())
    }
}

pub type OpResult<T> = Result<T, OpError>;
