//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use cpp_delegate_sdk::prelude::*;
//!
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:5555").await?;
//! let mut ctx = RemoteContext::connect(StreamChannel::new(stream), &ast, ContextConfig::new()).await?;
//! let uptime = ctx.call("millis", &[]).await?;
//! ```

pub use crate::{
    ByteChannel, CallResult, ContextConfig, DelegateError, Envelope, Passthrough, RemoteContext,
    Scalar, StreamChannel, Value,
};
