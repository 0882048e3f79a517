//! Type catalog: the exposable attributes and functions of one namespace
//!
//! Function opcodes are the zero-based index into the name-sorted function
//! table. Both the generated remote dispatcher and the host bindings derive
//! their opcodes from this table, so the ordering must never depend on map
//! iteration order.

use crate::error::CatalogError;
use crate::search::suggest_similar;
use crate::types::{AstMember, CppAst, MemberKind, SourceLocation};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Hardware registers and peripherals that must never be exposed.
pub const DEFAULT_DISALLOWED: &[&str] = &[
    "SREG",
    "DDRB",
    "DDRC",
    "DDRD",
    "SPDR",
    "SPSR",
    "Serial6",
    "Serial5",
    "Serial4",
    "PORTB",
    "PORTD",
    "PORTC",
    "PINB",
    "Teensy3Clock",
    "PIND",
    "PINC",
    "SPCR",
    "EIMSK",
];

const RESERVED_PREFIX: &str = "__";

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// `""` for the top-level namespace, otherwise `foo::bar`.
    pub namespace: String,
    pub disallowed: Vec<String>,
    /// Members declared in files under these directories are dropped.
    pub exclude_dirs: Vec<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            disallowed: DEFAULT_DISALLOWED.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: Vec::new(),
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_disallowed(mut self, names: Vec<String>) -> Self {
        self.disallowed = names;
        self
    }

    pub fn with_exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }

    fn is_excluded(&self, member: &AstMember) -> bool {
        let Some(location) = &member.location else {
            return false;
        };
        let file = Path::new(&location.file);
        self.exclude_dirs.iter().any(|dir| file.starts_with(dir))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Scalar,
    FixedArray,
    DynamicArray,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub type_name: String,
    pub is_const: bool,
    pub is_volatile: bool,
    pub kind: AttributeKind,
    /// Fixed arrays: declared element type. Dynamic arrays: pointee type of
    /// the array class' `data` member, `None` when the class is not in the AST.
    pub element_type: Option<String>,
    pub array_length: Option<u32>,
    pub location: Option<SourceLocation>,
}

impl AttributeDescriptor {
    pub fn is_namespaced(&self) -> bool {
        self.type_name.contains("::")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub arguments: Vec<ArgumentDescriptor>,
    /// `None` for `void` functions.
    pub result_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<SourceLocation>,
}

/// `U?Int<width>Array` classes from `CArrayDefs.h`.
pub fn is_dynamic_array_type(type_name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^U?Int\d+Array").expect("valid regex"));
    type_name.ends_with("Array") && pattern.is_match(type_name)
}

/// Element type of a dynamic array class: the pointee of its `data` member.
pub fn dynamic_array_element(ast: &CppAst, type_name: &str) -> Option<String> {
    ast.class(type_name)?
        .members
        .get("data")?
        .pointee_type
        .clone()
}

/// Select the members that can be exposed as attributes.
pub fn get_attributes<'a, I>(members: I, disallowed: &[String]) -> IndexMap<String, AttributeDescriptor>
where
    I: IntoIterator<Item = (&'a String, &'a AstMember)>,
{
    members
        .into_iter()
        .filter(|(key, member)| {
            !member.kind.is_callable()
                && !disallowed.iter().any(|name| *name == member.name)
                && !member.underlying_type.contains("()")
                && member.kind != MemberKind::IncompleteArray
                && !key.starts_with(RESERVED_PREFIX)
        })
        .map(|(key, member)| (key.clone(), attribute_descriptor(member)))
        .collect()
}

fn attribute_descriptor(member: &AstMember) -> AttributeDescriptor {
    let (kind, element_type, array_length) = if is_dynamic_array_type(&member.type_) {
        (AttributeKind::DynamicArray, None, None)
    } else if member.kind == MemberKind::ConstantArray {
        (
            AttributeKind::FixedArray,
            member.element_type.clone(),
            member.array_size,
        )
    } else {
        (AttributeKind::Scalar, None, None)
    };

    AttributeDescriptor {
        name: member.name.clone(),
        type_name: member.type_.clone(),
        is_const: member.is_const,
        is_volatile: member.is_volatile,
        kind,
        element_type,
        array_length,
        location: member.location.clone(),
    }
}

/// Select the callable free functions, in catalog order.
pub fn get_functions<'a, I>(members: I) -> Vec<FunctionDescriptor>
where
    I: IntoIterator<Item = &'a AstMember>,
{
    members
        .into_iter()
        .filter(|member| member.kind == MemberKind::FunctionDecl)
        .filter(|member| member.result_type.as_deref().is_some_and(|r| !r.is_empty()))
        .filter(|member| !member.name.starts_with("operator "))
        .filter(|member| member.arguments.iter().all(|a| a.kind != MemberKind::Pointer))
        .filter(|member| member.arguments.iter().all(|a| !a.name.is_empty()))
        .map(|member| FunctionDescriptor {
            name: member.name.clone(),
            arguments: member
                .arguments
                .iter()
                .map(|a| ArgumentDescriptor {
                    name: a.name.clone(),
                    type_name: a.type_.clone(),
                })
                .collect(),
            result_type: member
                .result_type
                .clone()
                .filter(|r| r.trim() != "void"),
            description: member.description.clone(),
            location: member.location.clone(),
        })
        .collect()
}

/// Functions sorted by name; the position of each entry is its opcode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionTable {
    entries: Vec<FunctionDescriptor>,
}

impl FunctionTable {
    pub fn new(mut functions: Vec<FunctionDescriptor>) -> Self {
        // Overloads share a name; their argument types break the tie.
        functions.sort_by(|a, b| {
            a.name.cmp(&b.name).then_with(|| {
                let types = |f: &FunctionDescriptor| {
                    f.arguments
                        .iter()
                        .map(|arg| arg.type_name.clone())
                        .collect::<Vec<_>>()
                };
                types(a).cmp(&types(b))
            })
        });
        Self { entries: functions }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(opcode, descriptor)` pairs in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FunctionDescriptor)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, f)| (index as u32, f))
    }

    /// Look up by call symbol: the plain name, or `name_<opcode>` for an
    /// overloaded name.
    pub fn get(&self, symbol: &str) -> Option<(u32, &FunctionDescriptor)> {
        self.iter()
            .find(|(opcode, f)| self.symbol_of(*opcode, f) == symbol)
    }

    /// Call symbol of the entry at `opcode`.
    pub fn symbol(&self, opcode: u32) -> Option<String> {
        self.by_opcode(opcode).map(|f| self.symbol_of(opcode, f))
    }

    /// Symbols of every entry declared as `name`, in opcode order.
    pub fn overloads(&self, name: &str) -> Vec<String> {
        self.iter()
            .filter(|(_, f)| f.name == name)
            .map(|(opcode, f)| self.symbol_of(opcode, f))
            .collect()
    }

    fn symbol_of(&self, opcode: u32, function: &FunctionDescriptor) -> String {
        let count = self.entries.iter().filter(|f| f.name == function.name).count();
        if count > 1 {
            format!("{}_{}", function.name, opcode)
        } else {
            function.name.clone()
        }
    }

    pub fn by_opcode(&self, opcode: u32) -> Option<&FunctionDescriptor> {
        self.entries.get(opcode as usize)
    }
}

/// One entry of [`TypeCatalog::list_descriptors`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Descriptor<'a> {
    Attribute(&'a AttributeDescriptor),
    Function {
        opcode: u32,
        #[serde(flatten)]
        descriptor: &'a FunctionDescriptor,
    },
}

impl Descriptor<'_> {
    pub fn name(&self) -> &str {
        match self {
            Descriptor::Attribute(attr) => &attr.name,
            Descriptor::Function { descriptor, .. } => &descriptor.name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    namespace: String,
    attributes: IndexMap<String, AttributeDescriptor>,
    functions: FunctionTable,
}

impl TypeCatalog {
    pub fn build(ast: &CppAst, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let scope = ast
            .namespace(&config.namespace)
            .ok_or_else(|| CatalogError::NamespaceNotFound(config.namespace.clone()))?;

        let members: Vec<(&String, &AstMember)> = scope
            .members
            .iter()
            .filter(|(_, member)| !config.is_excluded(member))
            .collect();

        let mut attributes = get_attributes(members.iter().copied(), &config.disallowed);
        for attr in attributes.values_mut() {
            if attr.kind == AttributeKind::DynamicArray {
                attr.element_type = dynamic_array_element(ast, &attr.type_name);
                if attr.element_type.is_none() {
                    tracing::warn!(
                        "No array class found for '{}' (type {})",
                        attr.name,
                        attr.type_name
                    );
                }
            }
        }

        let functions = FunctionTable::new(get_functions(members.iter().map(|(_, m)| *m)));

        tracing::debug!(
            namespace = %config.namespace,
            attributes = attributes.len(),
            functions = functions.len(),
            "Built type catalog"
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            attributes,
            functions,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn attributes(&self) -> &IndexMap<String, AttributeDescriptor> {
        &self.attributes
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn attribute(&self, name: &str) -> Result<&AttributeDescriptor, CatalogError> {
        self.attributes
            .get(name)
            .ok_or_else(|| CatalogError::AttributeNotFound {
                name: name.to_string(),
                suggestions: suggest_similar(name, &self.attribute_names(), 3),
            })
    }

    /// Resolve a call symbol. A bare overloaded name is ambiguous; callers
    /// pick an overload with its `name_<opcode>` symbol.
    pub fn function(&self, name: &str) -> Result<(u32, &FunctionDescriptor), CatalogError> {
        if let Some(found) = self.functions.get(name) {
            return Ok(found);
        }
        let overloads = self.functions.overloads(name);
        if !overloads.is_empty() {
            return Err(CatalogError::AmbiguousFunction {
                name: name.to_string(),
                candidates: overloads,
            });
        }
        let candidates: Vec<String> = (0..self.functions.len() as u32)
            .filter_map(|opcode| self.functions.symbol(opcode))
            .collect();
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        Err(CatalogError::FunctionNotFound {
            name: name.to_string(),
            suggestions: suggest_similar(name, &candidates, 3),
        })
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(|k| k.as_str()).collect()
    }

    /// Attribute names in the order addresses are resolved.
    pub fn sorted_attribute_names(&self) -> Vec<&str> {
        let mut names = self.attribute_names();
        names.sort_unstable();
        names
    }

    /// Every attribute (catalog order) followed by every function (opcode order).
    pub fn list_descriptors(&self) -> Vec<Descriptor<'_>> {
        self.attributes
            .values()
            .map(Descriptor::Attribute)
            .chain(
                self.functions
                    .iter()
                    .map(|(opcode, descriptor)| Descriptor::Function { opcode, descriptor }),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_ast_content;

    const AST: &str = r#"{
        "members": {
            "millis": { "kind": "FUNCTION_DECL", "name": "millis", "result_type": "uint32_t", "arguments": [] },
            "count": { "kind": "VAR_DECL", "name": "count", "type": "int32_t", "const": true },
            "PORTB": { "kind": "VAR_DECL", "name": "PORTB", "type": "uint8_t" },
            "__vector_table": { "kind": "VAR_DECL", "name": "__vector_table", "type": "uint32_t" },
            "handler": { "kind": "VAR_DECL", "name": "handler", "type": "callback_t", "underlying_type": "void ()" },
            "pending": { "kind": "INCOMPLETEARRAY", "name": "pending", "type": "uint8_t []" },
            "levels": { "kind": "CONSTANTARRAY", "name": "levels", "type": "uint16_t [4]", "element_type": "uint16_t", "array_size": 4 },
            "buffer": { "kind": "VAR_DECL", "name": "buffer", "type": "UInt8Array" },
            "add": { "kind": "FUNCTION_DECL", "name": "add", "result_type": "int32_t",
                     "arguments": [ { "name": "a", "type": "int32_t" }, { "name": "b", "type": "int32_t" } ] },
            "operator ==": { "kind": "FUNCTION_DECL", "name": "operator ==", "result_type": "bool", "arguments": [] },
            "fill": { "kind": "FUNCTION_DECL", "name": "fill", "result_type": "void",
                      "arguments": [ { "name": "dst", "type": "uint8_t *", "kind": "POINTER" } ] },
            "blink": { "kind": "FUNCTION_DECL", "name": "blink", "result_type": "void",
                       "arguments": [ { "name": "", "type": "uint8_t" } ] },
            "reset": { "kind": "FUNCTION_DECL", "name": "reset", "result_type": "void", "arguments": [] },
            "Stream::read": { "kind": "CXX_METHOD", "name": "read", "result_type": "int", "arguments": [] },
            "declared_only": { "kind": "FUNCTION_DECL", "name": "declared_only", "arguments": [] }
        },
        "classes": {
            "UInt8Array": {
                "members": { "data": { "name": "data", "type": "uint8_t *", "pointee_type": "uint8_t" } },
                "location": { "file": "lib/CArrayDefs.h" }
            }
        }
    }"#;

    fn catalog() -> TypeCatalog {
        let ast = parse_ast_content(AST).unwrap();
        TypeCatalog::build(&ast, &CatalogConfig::default()).unwrap()
    }

    #[test]
    fn test_attribute_filters() {
        let catalog = catalog();
        assert_eq!(catalog.attribute_names(), vec!["count", "levels", "buffer"]);
    }

    #[test]
    fn test_attribute_kinds() {
        let catalog = catalog();
        let count = catalog.attribute("count").unwrap();
        assert_eq!(count.kind, AttributeKind::Scalar);
        assert!(count.is_const);

        let levels = catalog.attribute("levels").unwrap();
        assert_eq!(levels.kind, AttributeKind::FixedArray);
        assert_eq!(levels.element_type.as_deref(), Some("uint16_t"));
        assert_eq!(levels.array_length, Some(4));

        let buffer = catalog.attribute("buffer").unwrap();
        assert_eq!(buffer.kind, AttributeKind::DynamicArray);
        assert_eq!(buffer.element_type.as_deref(), Some("uint8_t"));
    }

    #[test]
    fn test_function_filters_and_opcodes() {
        let catalog = catalog();
        let names: Vec<(u32, &str)> = catalog
            .functions()
            .iter()
            .map(|(op, f)| (op, f.name.as_str()))
            .collect();
        assert_eq!(names, vec![(0, "add"), (1, "millis"), (2, "reset")]);
        assert_eq!(catalog.function("reset").unwrap().1.result_type, None);
    }

    #[test]
    fn test_overloads_resolve_by_symbol() {
        let ast = parse_ast_content(
            r#"{ "members": {
                "scale": { "kind": "FUNCTION_DECL", "name": "scale", "result_type": "float",
                           "arguments": [ { "name": "x", "type": "float" } ] },
                "scale2": { "kind": "FUNCTION_DECL", "name": "scale", "result_type": "int32_t",
                            "arguments": [ { "name": "x", "type": "int32_t" } ] },
                "tick": { "kind": "FUNCTION_DECL", "name": "tick", "result_type": "void" }
            } }"#,
        )
        .unwrap();
        let catalog = TypeCatalog::build(&ast, &CatalogConfig::default()).unwrap();

        let (opcode, scale) = catalog.function("scale_1").unwrap();
        assert_eq!(opcode, 1);
        assert_eq!(scale.arguments[0].type_name, "int32_t");
        assert_eq!(catalog.functions().symbol(0).as_deref(), Some("scale_0"));
        assert_eq!(catalog.functions().symbol(2).as_deref(), Some("tick"));

        match catalog.function("scale") {
            Err(CatalogError::AmbiguousFunction { name, candidates }) => {
                assert_eq!(name, "scale");
                assert_eq!(candidates, vec!["scale_0", "scale_1"]);
            }
            other => panic!("expected ambiguity, got {:?}", other.map(|(op, _)| op)),
        }
    }

    #[test]
    fn test_dynamic_array_detection() {
        assert!(is_dynamic_array_type("UInt8Array"));
        assert!(is_dynamic_array_type("Int32Array"));
        assert!(!is_dynamic_array_type("FloatArray"));
        assert!(!is_dynamic_array_type("UInt8ArrayView"));
    }

    #[test]
    fn test_unknown_attribute_suggests_close_name() {
        let catalog = catalog();
        match catalog.attribute("cuont") {
            Err(CatalogError::AttributeNotFound { suggestions, .. }) => {
                assert_eq!(suggestions[0].candidate, "count");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_exclude_dirs() {
        let ast = parse_ast_content(
            r#"{ "members": {
                "a": { "name": "a", "type": "int", "location": { "file": "/toolchain/include/x.h" } },
                "b": { "name": "b", "type": "int", "location": { "file": "/project/src/main.cpp" } }
            } }"#,
        )
        .unwrap();
        let config = CatalogConfig::new().with_exclude_dir("/toolchain");
        let catalog = TypeCatalog::build(&ast, &config).unwrap();
        assert_eq!(catalog.attribute_names(), vec!["b"]);
    }

    #[test]
    fn test_missing_namespace() {
        let ast = parse_ast_content(AST).unwrap();
        let config = CatalogConfig::new().with_namespace("nope");
        assert!(matches!(
            TypeCatalog::build(&ast, &config),
            Err(CatalogError::NamespaceNotFound(_))
        ));
    }
}
