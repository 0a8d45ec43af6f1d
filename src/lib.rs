//! # class-refs
//!
//! Structural reference search over compiled Java class files.
//!
//! ## Architecture
//!
//! - **matcher**: Text match modes used by every query slot
//! - **descriptor**: Field and method descriptor grammar helpers
//! - **classfile**: Class-file reader and in-memory class model
//! - **path**: Location paths addressing where inside a class a match sits
//! - **result**: Reference results and the sinks that receive them
//! - **query**: Class and member reference queries
//! - **walk**: Visitor pipeline that walks one class and reports matches
//! - **search**: Parallel fan-out of a query over many classes
//! - **scan**: Jar and class file discovery under input paths
//! - **catalog**: Jar entry loading and class parsing
//! - **config**: Input, thread, and logging configuration
//! - **error**: Error types for class reading and walks

pub mod catalog;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod matcher;
pub mod path;
pub mod query;
pub mod result;
pub mod scan;
pub mod search;
pub mod walk;

pub use error::{ClassFileError, PathError, SearchError};
pub use matcher::TextMatchMode;
pub use path::{PathElement, PathNode};
pub use query::{ClassQuery, MemberTarget, ReferenceQuery};
pub use result::{Reference, ResultSink, SearchResult};
pub use walk::{ClassSource, ReferenceVisitor};
