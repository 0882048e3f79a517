//! # cpp-delegate
//!
//! Treat the variables and functions of a remote embedded C++ program as
//! local values, over any ordered byte stream.
//!
//! ## Features
//!
//! - **`sdk`** (default) - Async [`RemoteContext`](sdk::RemoteContext) for reading, writing and calling
//! - **`codegen`** - Generators for the remote C++ headers and the host Rust bindings
//!
//! The catalog crate (AST model, codec, layout plan) is always available.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! cpp-delegate = { version = "0.1", features = ["full"] }
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cpp_delegate::prelude::*;
//!
//! let ast = parse_ast_file("build/firmware.ast.json")?;
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:5555").await?;
//! let mut ctx = RemoteContext::connect(StreamChannel::new(stream), &ast, ContextConfig::new()).await?;
//!
//! ctx.set("led_state", Scalar::Bool(true)).await?;
//! let sum = ctx.call("add", &[Scalar::I32(2), Scalar::I32(3)]).await?;
//! ```

pub use cpp_delegate_catalog as catalog;

#[cfg(feature = "sdk")]
pub use cpp_delegate_sdk as sdk;

#[cfg(feature = "codegen")]
pub use cpp_delegate_codegen as codegen;

/// Prelude module for convenient imports
pub mod prelude {
    pub use cpp_delegate_catalog::parse::{parse_ast_content, parse_ast_file};
    pub use cpp_delegate_catalog::{
        CallResult, CatalogConfig, Codec, CodecConfig, CppAst, LayoutPlan, PointerWidth, Scalar,
        ScalarType, TypeCatalog, Value,
    };

    #[cfg(feature = "sdk")]
    pub use cpp_delegate_sdk::{
        ByteChannel, CancellationToken, ContextConfig, DelegateError, RemoteContext,
        StreamChannel,
    };

    #[cfg(feature = "codegen")]
    pub use cpp_delegate_codegen::{generate_all, HostConfig, RemoteConfig};
}
