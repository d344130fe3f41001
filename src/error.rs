use thiserror::Error;

/// Errors raised while assembling the reference [`crate::memory::ArrayMemoryMap`]
/// from caller-provided dumps. The PPU's own stepping is infallible, see
/// the crate-level error handling notes.
#[derive(Debug, Error)]
pub enum PpuError {
    #[error("VRAM dump has invalid size: expected {expected} bytes, got {got}")]
    InvalidVramSize { expected: usize, got: usize },

    #[error("OAM dump has invalid size: expected {expected} bytes, got {got}")]
    InvalidOamSize { expected: usize, got: usize },
}

pub type PpuResult<T> = Result<T, PpuError>;
