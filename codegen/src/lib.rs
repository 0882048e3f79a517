//! Code generators for both ends of a cpp-delegate link.
//!
//! [`generate_all`] builds one [`LayoutPlan`] and hands it to the remote C++
//! emitter and the host Rust emitter. Neither emitter derives opcodes or
//! record layouts on its own, so the two sides cannot drift apart.

pub mod host;
pub mod remote;

pub use host::{compile_host, write_host, HostConfig};
pub use remote::{compile_remote, write_remote, RemoteConfig, RemoteOutput};

use cpp_delegate_catalog::{CatalogError, Codec, CppAst, LayoutPlan, TypeCatalog};

#[derive(Debug, Clone)]
pub struct GeneratedSources {
    pub plan: LayoutPlan,
    pub remote: RemoteOutput,
    pub bindings_rs: String,
}

pub fn generate_all(
    ast: &CppAst,
    catalog: &TypeCatalog,
    codec: &Codec,
    remote: &RemoteConfig,
    host: &HostConfig,
) -> Result<GeneratedSources, CatalogError> {
    let plan = LayoutPlan::build(ast, catalog, codec)?;
    let remote = compile_remote(&plan, remote);
    let bindings_rs = compile_host(&plan, host);
    tracing::info!(
        namespace = %plan.namespace,
        functions = plan.functions.len(),
        "Generated remote headers and host bindings"
    );
    Ok(GeneratedSources {
        plan,
        remote,
        bindings_rs,
    })
}
