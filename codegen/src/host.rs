//! Host-side Rust bindings: one async method per remote function.

use cpp_delegate_catalog::{FunctionPlan, LayoutPlan};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Path of the runtime crate as seen from the generated module.
    pub sdk_path: String,
    pub struct_name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sdk_path: "cpp_delegate_sdk".to_string(),
            struct_name: "RemoteFunctions".to_string(),
        }
    }
}

impl HostConfig {
    pub fn with_sdk_path(mut self, path: impl Into<String>) -> Self {
        self.sdk_path = path.into();
        self
    }

    pub fn with_struct_name(mut self, name: impl Into<String>) -> Self {
        self.struct_name = name.into();
        self
    }
}

pub fn compile_host(plan: &LayoutPlan, config: &HostConfig) -> String {
    let constants: Vec<String> = plan
        .functions
        .iter()
        .map(|f| format!("pub const {}: u32 = {};", command_const(f), f.opcode))
        .collect();
    let methods: Vec<String> = plan.functions.iter().map(generate_method).collect();
    let namespace = if plan.namespace.is_empty() {
        "top-level".to_string()
    } else {
        format!("`{}`", plan.namespace)
    };

    format!(
        r#"//! Remote functions of the {namespace} namespace.
//!
//! Generated by cppd. Do not edit.

#[allow(unused_imports)]
use {sdk}::bindings::{{put, take}};
use {sdk}::{{ByteChannel, DelegateError, RemoteContext}};

{constants}

pub struct {name}<'a, C> {{
    ctx: &'a mut RemoteContext<C>,
}}

impl<'a, C: ByteChannel> From<&'a mut RemoteContext<C>> for {name}<'a, C> {{
    fn from(ctx: &'a mut RemoteContext<C>) -> Self {{
        Self {{ ctx }}
    }}
}}

#[allow(non_snake_case)]
impl<C: ByteChannel> {name}<'_, C> {{
{methods}}}
"#,
        namespace = namespace,
        sdk = config.sdk_path,
        constants = constants.join("\n"),
        name = config.struct_name,
        methods = methods.join("\n")
    )
}

pub fn write_host(bindings: &str, path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bindings)
}

fn generate_method(function: &FunctionPlan) -> String {
    let params: String = function
        .fields
        .iter()
        .map(|f| format!(", {}: {}", rust_ident(&f.name), f.scalar.rust_name()))
        .collect();

    let pack = if function.fields.is_empty() {
        "        let packed: Vec<u8> = Vec::new();\n".to_string()
    } else {
        let puts: String = function
            .fields
            .iter()
            .map(|f| format!("        put(&mut packed, {});\n", rust_ident(&f.name)))
            .collect();
        format!(
            "        let mut packed = Vec::with_capacity({});\n{}",
            function.request_size(),
            puts
        )
    };

    let exec = format!("self.ctx.exec({}, &packed).await", command_const(function));
    let (returns, finish) = match &function.result {
        None => ("()".to_string(), format!("        {}?;\n        Ok(())\n", exec)),
        Some(result) => match result.scalar {
            Some(scalar) => (
                scalar.rust_name().to_string(),
                format!("        let response = {}?;\n        take(&response)\n", exec),
            ),
            None => ("Vec<u8>".to_string(), format!("        {}\n", exec)),
        },
    };

    let mut docs = String::new();
    if let Some(description) = &function.description {
        for line in description.lines() {
            docs.push_str(&format!("    /// {}\n", line.trim()));
        }
    }
    if let Some(location) = &function.location {
        if !docs.is_empty() {
            docs.push_str("    ///\n");
        }
        docs.push_str(&format!("    /// Declared at `{}`.\n", location));
    }

    format!(
        "{docs}    pub async fn {method}(&mut self{params}) -> Result<{returns}, DelegateError> {{\n{pack}{finish}    }}\n",
        docs = docs,
        method = rust_ident(&function.symbol),
        params = params,
        returns = returns,
        pack = pack,
        finish = finish
    )
}

fn command_const(function: &FunctionPlan) -> String {
    format!("CMD_{}", function.symbol.to_uppercase())
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "yield", "abstract", "become", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "gen",
];

/// Escape identifiers that collide with Rust keywords.
pub fn rust_ident(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" => format!("{}_", name),
        _ if RUST_KEYWORDS.contains(&name) => format!("r#{}", name),
        _ => name.to_string(),
    }
}
