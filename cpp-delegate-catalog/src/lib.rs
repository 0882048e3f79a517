//! Type catalog, binary codec and layout planning for cpp-delegate
//!
//! This crate reads the JSON AST dump of a C++ program, selects the
//! attributes and free functions that can be reached remotely, and maps
//! their C types onto fixed-width little-endian scalars. The
//! [`layout::LayoutPlan`] it produces is the single source of opcodes and
//! record layouts for the remote dispatcher, the host bindings and the
//! runtime context.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod layout;
pub mod opcode;
pub mod parse;
pub mod search;
pub mod types;
pub mod value;

pub use catalog::*;
pub use codec::*;
pub use error::*;
pub use layout::*;
pub use opcode::*;
pub use search::*;
pub use types::*;
pub use value::*;
