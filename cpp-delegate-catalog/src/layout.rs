//! Canonical layout plan shared by the remote dispatcher, the host bindings
//! and the runtime context.
//!
//! A plan is computed once from a [`TypeCatalog`] and a [`Codec`]. Emitters
//! read opcodes, field order, offsets and widths from it and never derive
//! them on their own.

use crate::catalog::{AttributeDescriptor, AttributeKind, FunctionDescriptor, TypeCatalog};
use crate::codec::{BinaryLayout, Codec, PointerWidth, ScalarType};
use crate::error::{CatalogError, CodecError};
use crate::opcode::Operation;
use crate::types::{CppAst, SourceLocation};
use crate::value::{CallResult, Scalar};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPlan {
    pub name: String,
    /// Declared C type, emitted verbatim into the remote request struct.
    pub c_type: String,
    pub scalar: ScalarType,
    pub offset: usize,
}

impl FieldPlan {
    pub fn size(&self) -> usize {
        self.scalar.size()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPlan {
    pub c_type: String,
    /// `None` when the result type has no codec layout; callers get raw bytes.
    pub scalar: Option<ScalarType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionPlan {
    pub opcode: u32,
    pub name: String,
    /// Identifier for generated constants and methods. Overloads get their
    /// opcode appended so every symbol is unique.
    pub symbol: String,
    pub fields: Vec<FieldPlan>,
    pub result: Option<ResultPlan>,
    pub description: Option<String>,
    pub location: Option<SourceLocation>,
}

impl FunctionPlan {
    /// Fails with `UnsupportedType` if any argument type has no layout.
    pub fn build(
        opcode: u32,
        function: &FunctionDescriptor,
        codec: &Codec,
    ) -> Result<Self, CodecError> {
        let mut offset = 0;
        let mut fields = Vec::with_capacity(function.arguments.len());
        for arg in &function.arguments {
            let scalar = codec.resolve(&arg.type_name)?;
            fields.push(FieldPlan {
                name: arg.name.clone(),
                c_type: arg.type_name.clone(),
                scalar,
                offset,
            });
            offset += scalar.size();
        }

        let result = function.result_type.as_ref().map(|c_type| ResultPlan {
            c_type: c_type.clone(),
            scalar: codec.resolve(c_type).ok(),
        });

        Ok(Self {
            opcode,
            name: function.name.clone(),
            symbol: function.name.clone(),
            fields,
            result,
            description: function.description.clone(),
            location: function.location.clone(),
        })
    }

    /// Size of the packed (unpadded) request record.
    pub fn request_size(&self) -> usize {
        self.fields.iter().map(FieldPlan::size).sum()
    }

    /// Pack `args` positionally into the request record.
    pub fn pack(&self, args: &[Scalar]) -> Result<Vec<u8>, CodecError> {
        if args.len() != self.fields.len() {
            return Err(CodecError::ArgumentMismatch {
                function: self.name.clone(),
                expected: self.fields.len(),
                actual: args.len(),
            });
        }
        let mut packed = Vec::with_capacity(self.request_size());
        for (field, arg) in self.fields.iter().zip(args) {
            field.scalar.encode(*arg, &mut packed);
        }
        Ok(packed)
    }

    pub fn decode_result(&self, response: &[u8]) -> Result<CallResult, CodecError> {
        match self.result.as_ref().and_then(|r| r.scalar) {
            Some(scalar) => Ok(CallResult::Scalar(scalar.decode(response)?)),
            None => Ok(CallResult::Raw(response.to_vec())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributePlan {
    pub descriptor: AttributeDescriptor,
    /// `None` when the codec cannot lay the attribute out.
    pub layout: Option<BinaryLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationPlan {
    pub name: &'static str,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub namespace: String,
    pub pointer_size: usize,
    pub view_size: usize,
    pub operations: Vec<OperationPlan>,
    pub attributes: Vec<AttributePlan>,
    pub functions: Vec<FunctionPlan>,
    /// Files declaring the namespaced and dynamic-array attribute types, sorted.
    pub headers: Vec<String>,
}

impl LayoutPlan {
    pub fn build(ast: &CppAst, catalog: &TypeCatalog, codec: &Codec) -> Result<Self, CatalogError> {
        let attributes: Vec<AttributePlan> = catalog
            .attributes()
            .values()
            .map(|descriptor| AttributePlan {
                layout: codec.attribute_layout(descriptor).ok(),
                descriptor: descriptor.clone(),
            })
            .collect();

        let table = catalog.functions();
        let functions = table
            .iter()
            .map(|(opcode, function)| {
                let mut plan = FunctionPlan::build(opcode, function, codec)?;
                if let Some(symbol) = table.symbol(opcode) {
                    plan.symbol = symbol;
                }
                Ok(plan)
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        let mut headers = BTreeSet::new();
        for attr in catalog.attributes().values() {
            if attr.kind == AttributeKind::DynamicArray {
                // Same failure as a runtime read when the array class is missing.
                codec.attribute_layout(attr)?;
            }
            if attr.is_namespaced() || attr.kind == AttributeKind::DynamicArray {
                let header = ast
                    .definition_header(&attr.type_name)
                    .ok_or_else(|| CatalogError::DefinitionHeaderNotFound(attr.type_name.clone()))?;
                headers.insert(header.to_string());
            }
        }

        let pointer_width: PointerWidth = codec.config().pointer_width;
        let plan = Self {
            namespace: catalog.namespace().to_string(),
            pointer_size: pointer_width.bytes(),
            view_size: codec.view_size(),
            operations: Operation::ALL
                .iter()
                .map(|op| OperationPlan {
                    name: op.name(),
                    code: op.code(),
                })
                .collect(),
            attributes,
            functions,
            headers: headers.into_iter().collect(),
        };

        tracing::info!(
            functions = plan.functions.len(),
            attributes = plan.attributes.len(),
            headers = plan.headers.len(),
            "Planned remote layout"
        );
        Ok(plan)
    }

    /// Look up by call symbol, as [`TypeCatalog::function`] does.
    pub fn function(&self, symbol: &str) -> Option<&FunctionPlan> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }
}
