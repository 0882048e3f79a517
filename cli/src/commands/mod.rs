pub mod catalog;
pub mod generate;
pub mod remote;

use crate::config::CppDelegateConfig;
use anyhow::{Context, Result};
use cpp_delegate_catalog::parse::parse_ast_file;
use cpp_delegate_catalog::{Codec, CppAst, TypeCatalog};

/// Loaded AST plus the catalog and codec built from it.
pub struct Project {
    pub config: CppDelegateConfig,
    pub ast: CppAst,
    pub catalog: TypeCatalog,
    pub codec: Codec,
}

impl Project {
    pub fn load(config: CppDelegateConfig) -> Result<Self> {
        let path = config
            .project
            .ast
            .clone()
            .context("No AST file given. Pass --ast or set project.ast in cpp-delegate.toml")?;
        let ast = parse_ast_file(&path)
            .with_context(|| format!("Failed to load AST from {}", path.display()))?;
        let catalog = TypeCatalog::build(&ast, &config.catalog_config())?;
        let codec = Codec::new(config.codec_config());
        tracing::debug!(
            path = %path.display(),
            attributes = catalog.attributes().len(),
            functions = catalog.functions().len(),
            "Loaded project"
        );
        Ok(Self {
            config,
            ast,
            catalog,
            codec,
        })
    }
}
