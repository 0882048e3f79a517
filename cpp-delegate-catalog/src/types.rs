//! Records of the C++ abstract syntax tree produced by the external clang tooling

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cursor/type kind reported for a member.
///
/// Variables carry their *type* kind (`CONSTANTARRAY`, `INCOMPLETEARRAY`, ...),
/// functions carry their cursor kind. Anything else collapses into `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MemberKind {
    #[serde(rename = "FUNCTION_DECL")]
    FunctionDecl,
    #[serde(rename = "CXX_METHOD")]
    CxxMethod,
    #[serde(rename = "CONSTANTARRAY")]
    ConstantArray,
    #[serde(rename = "INCOMPLETEARRAY")]
    IncompleteArray,
    #[serde(rename = "POINTER")]
    Pointer,
    #[default]
    #[serde(other)]
    Other,
}

impl MemberKind {
    pub fn is_callable(self) -> bool {
        matches!(self, MemberKind::FunctionDecl | MemberKind::CxxMethod)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub start: Option<SourcePosition>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            Some(start) => write!(
                f,
                "{} (line: {}, col: {})",
                self.file, start.line, start.column
            ),
            None => write!(f, "{}", self.file),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AstArgument {
    /// Empty when the declaration leaves the argument unnamed.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub kind: MemberKind,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AstMember {
    #[serde(default)]
    pub kind: MemberKind,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub underlying_type: String,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub array_size: Option<u32>,
    #[serde(rename = "const", default)]
    pub is_const: bool,
    #[serde(rename = "volatile", default)]
    pub is_volatile: bool,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub arguments: Vec<AstArgument>,
    /// Only present on pointer fields of classes (e.g. the `data` member of `UInt8Array`).
    #[serde(default)]
    pub pointee_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AstClass {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: IndexMap<String, AstMember>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AstTypedef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

/// A namespace scope. The document root is itself a namespace.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AstNamespace {
    #[serde(default)]
    pub members: IndexMap<String, AstMember>,
    #[serde(default)]
    pub namespaces: IndexMap<String, AstNamespace>,
    #[serde(default)]
    pub classes: IndexMap<String, AstClass>,
    #[serde(default)]
    pub typedefs: IndexMap<String, AstTypedef>,
}

pub type CppAst = AstNamespace;

impl AstNamespace {
    /// Walk a `foo::bar` specifier down from this scope. `""` is this scope.
    pub fn namespace(&self, path: &str) -> Option<&AstNamespace> {
        path.split("::")
            .filter(|part| !part.is_empty())
            .try_fold(self, |scope, part| scope.namespaces.get(part))
    }

    /// Look up a class by (optionally namespaced) name.
    pub fn class(&self, qualified_name: &str) -> Option<&AstClass> {
        let (scope, name) = self.split_qualified(qualified_name)?;
        scope.classes.get(name)
    }

    pub fn typedef(&self, qualified_name: &str) -> Option<&AstTypedef> {
        let (scope, name) = self.split_qualified(qualified_name)?;
        scope.typedefs.get(name)
    }

    /// File declaring the class or typedef named `type_name`.
    pub fn definition_header(&self, type_name: &str) -> Option<&str> {
        let location = match self.class(type_name) {
            Some(class) => class.location.as_ref(),
            None => self.typedef(type_name)?.location.as_ref(),
        };
        location.map(|l| l.file.as_str())
    }

    fn split_qualified<'a>(&self, qualified_name: &'a str) -> Option<(&AstNamespace, &'a str)> {
        match qualified_name.rsplit_once("::") {
            Some((prefix, name)) => Some((self.namespace(prefix)?, name)),
            None => Some((self, qualified_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CppAst {
        serde_json::from_str(
            r#"{
                "members": {},
                "classes": {
                    "UInt8Array": {
                        "members": {
                            "length": { "kind": "FIELD_DECL", "name": "length", "type": "uint32_t" },
                            "data": { "kind": "FIELD_DECL", "name": "data", "type": "uint8_t *", "pointee_type": "uint8_t" }
                        },
                        "location": { "file": "lib/CArrayDefs.h" }
                    }
                },
                "namespaces": {
                    "board": {
                        "members": {},
                        "typedefs": {
                            "Pins": { "type": "uint8_t", "location": { "file": "lib/board/Pins.h" } }
                        },
                        "namespaces": { "leds": { "members": {} } }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_namespace_walk() {
        let ast = sample();
        assert!(ast.namespace("").is_some());
        assert!(ast.namespace("board::leds").is_some());
        assert!(ast.namespace("::board").is_some());
        assert!(ast.namespace("board::missing").is_none());
    }

    #[test]
    fn test_unknown_kind_collapses_to_other() {
        let ast = sample();
        let class = ast.class("UInt8Array").unwrap();
        assert_eq!(class.members["data"].kind, MemberKind::Other);
        assert_eq!(class.members["data"].pointee_type.as_deref(), Some("uint8_t"));
    }

    #[test]
    fn test_definition_header_for_class_and_typedef() {
        let ast = sample();
        assert_eq!(ast.definition_header("UInt8Array"), Some("lib/CArrayDefs.h"));
        assert_eq!(ast.definition_header("board::Pins"), Some("lib/board/Pins.h"));
        assert_eq!(ast.definition_header("board::Missing"), None);
    }
}
