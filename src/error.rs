//! Error types for class reading and reference walks.

use thiserror::Error;

/// Malformed class-file bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("Invalid class magic: {0:#010x}")]
    BadMagic(u32),

    #[error("Unexpected end of class data at offset {0}")]
    UnexpectedEof(usize),

    #[error("Unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("Invalid constant pool index {0}")]
    BadConstantIndex(u16),

    #[error("Constant pool entry {index} is not a {expected}")]
    WrongConstantType { index: u16, expected: &'static str },

    #[error("Invalid bootstrap method index {0}")]
    BadBootstrapIndex(u16),

    #[error("Dynamic constant nesting exceeds {0} levels")]
    DynamicTooDeep(usize),

    #[error("Annotation nesting exceeds {0} levels")]
    AnnotationTooDeep(usize),

    #[error("Branch target out of range at bytecode offset {0}")]
    BranchOutOfRange(u32),

    #[error("Unknown opcode {opcode:#04x} at bytecode offset {offset}")]
    UnknownOpcode { opcode: u8, offset: u32 },

    #[error("Invalid annotation element tag '{0}'")]
    BadElementTag(char),

    #[error("Unknown type annotation target {0:#04x}")]
    BadTypeTarget(u8),
}

/// A location path extended from a node kind that cannot parent the new element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot place {child} under {parent} path node")]
    IllegalParent {
        parent: &'static str,
        child: &'static str,
    },
}

/// Fatal abort of a single class walk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Inconsistent location path: {0}")]
    Path(#[from] PathError),
}
