use ossa_anim::AnimError;
use thiserror::Error;

/// Errors raised while setting up IK chains
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IkError {
    #[error("IK chain needs at least 2 bones, got {0}")]
    ChainTooShort(usize),

    #[error("Bone {bone} is not a child of bone {expected_parent}")]
    NotAChain { bone: usize, expected_parent: usize },

    #[error("Bone index {index} out of range for {count} bones")]
    BoneOutOfRange { index: usize, count: usize },

    #[error("Chain has {expected} bones but {found} were given")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Animation error: {0}")]
    Anim(#[from] AnimError),
}

/// Result type for IK setup operations
pub type Result<T> = std::result::Result<T, IkError>;
