//! # attackgraph-error
//!
//! Unified error handling for attackgraph - following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., BundleParseFailed, RenderFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use attackgraph_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::BundleParseFailed, "unexpected token")
//!         .with_operation("bundle::from_path")
//!         .with_context("path", "enterprise-attack.json")
//!         .with_context("offset", "1024"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, attackgraph_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using attackgraph Error
pub type Result<T> = std::result::Result<T, Error>;
