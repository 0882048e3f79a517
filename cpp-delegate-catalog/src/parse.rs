//! AST loading utilities

use crate::error::CatalogError;
use crate::types::CppAst;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Load an AST dump, gunzipping it first when the file ends in `.gz`.
pub fn parse_ast_file<P: AsRef<Path>>(path: P) -> Result<CppAst, CatalogError> {
    let path = path.as_ref();
    let io_error = |source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    };

    let content = if path.extension().is_some_and(|ext| ext == "gz") {
        let file = fs::File::open(path).map_err(io_error)?;
        let mut content = String::new();
        GzDecoder::new(file)
            .read_to_string(&mut content)
            .map_err(io_error)?;
        content
    } else {
        fs::read_to_string(path).map_err(io_error)?
    };

    parse_ast_content(&content)
}

pub fn parse_ast_content(content: &str) -> Result<CppAst, CatalogError> {
    Ok(serde_json::from_str(content)?)
}
