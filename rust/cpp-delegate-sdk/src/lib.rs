//! # cpp-delegate-sdk
//!
//! Treat the variables and functions of a remote embedded C++ program as
//! local objects over a byte stream.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cpp_delegate_sdk::prelude::*;
//!
//! let ast = cpp_delegate_catalog::parse::parse_ast_file("firmware.json.gz")?;
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:5555").await?;
//! let mut ctx = RemoteContext::connect(StreamChannel::new(stream), &ast, ContextConfig::new()).await?;
//!
//! ctx.set("led_pin", Scalar::U8(13)).await?;
//! let samples = ctx.get("samples").await?;
//! let sum = ctx.call("add", &[Scalar::I32(2), Scalar::I32(3)]).await?;
//! ```
//!
//! ## Operations
//!
//! - **address_of** - resolve a variable name to its remote address (once, at connect)
//! - **mem_read** / **mem_write** - raw memory access at a remote address
//! - **exec** - invoke a remote function by opcode with packed arguments

pub mod bindings;
mod config;
mod context;
mod error;
pub mod prelude;
pub mod protocol;
mod transport;

pub use config::ContextConfig;
pub use context::{AddressCache, RemoteContext};
pub use error::DelegateError;
pub use protocol::WireClient;
pub use transport::{ByteChannel, Envelope, Passthrough, StreamChannel};

pub use cpp_delegate_catalog::{CallResult, Scalar, Value};
pub use tokio_util::sync::CancellationToken;
