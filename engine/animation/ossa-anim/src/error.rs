use thiserror::Error;

/// Errors raised while loading or validating animation data
///
/// Per-frame work (sampling, blending, palette generation) never fails; these
/// errors only come out of setup-time validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimError {
    #[error("Bone {bone} has parent {parent}, which is outside a hierarchy of {count} bones")]
    ParentOutOfRange { bone: usize, parent: i32, count: usize },

    #[error("Bone {0} is its own ancestor")]
    CyclicHierarchy(usize),

    #[error("Length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Rest and bind poses disagree on the parent of bone {0}")]
    HierarchyMismatch(usize),

    #[error("Bone index {index} out of range for {count} bones")]
    BoneOutOfRange { index: usize, count: usize },

    #[error("Unknown bone: {0}")]
    UnknownBone(String),
}

/// Result type for animation setup operations
pub type Result<T> = std::result::Result<T, AnimError>;
