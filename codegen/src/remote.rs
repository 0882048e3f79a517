//! Remote-side C++ headers: `AddressOf.h` and `MemberHeader.h`.

use cpp_delegate_catalog::{strip_qualifiers, AttributeKind, AttributePlan, FunctionPlan, LayoutPlan};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RemoteOutput {
    pub address_of_h: String,
    pub member_header_h: String,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Extra headers included ahead of the type definition headers.
    pub includes: Vec<String>,
    /// Name of the generated dispatch routine.
    pub dispatch_name: String,
    /// Header declaring `UInt8Array`, which the dispatch routine takes and
    /// returns. Always included.
    pub buffer_header: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            includes: vec!["Arduino.h".to_string()],
            dispatch_name: "exec_function".to_string(),
            buffer_header: "CArrayDefs.h".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_dispatch_name(mut self, name: impl Into<String>) -> Self {
        self.dispatch_name = name.into();
        self
    }

    pub fn with_buffer_header(mut self, header: impl Into<String>) -> Self {
        self.buffer_header = header.into();
        self
    }
}

pub fn compile_remote(plan: &LayoutPlan, config: &RemoteConfig) -> RemoteOutput {
    let compiler = RemoteCompiler { plan, config };
    RemoteOutput {
        address_of_h: compiler.generate_address_of(),
        member_header_h: compiler.generate_member_header(),
    }
}

pub fn write_remote(output: &RemoteOutput, dir: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("AddressOf.h"), &output.address_of_h)?;
    std::fs::write(dir.join("MemberHeader.h"), &output.member_header_h)?;
    Ok(())
}

struct RemoteCompiler<'a> {
    plan: &'a LayoutPlan,
    config: &'a RemoteConfig,
}

impl RemoteCompiler<'_> {
    fn generate_address_of(&self) -> String {
        let externs: Vec<String> = self
            .plan
            .attributes
            .iter()
            .map(extern_declaration)
            .collect();

        let branches: Vec<String> = self
            .plan
            .attributes
            .iter()
            .map(|attr| {
                let name = &attr.descriptor.name;
                format!(
                    r#"if (strcmp(member_name, "{name}") == 0) {{
        return static_cast<uint32_t>(reinterpret_cast<uintptr_t>(&{qualified}));
    }}"#,
                    name = name,
                    qualified = self.qualified(name)
                )
            })
            .collect();
        let lookup = if branches.is_empty() {
            String::new()
        } else {
            format!("    {}\n", branches.join(" else "))
        };

        format!(
            r#"#ifndef ___ADDRESS_OF__H___
#define ___ADDRESS_OF__H___

#include <string.h>
#include <stdint.h>
{includes}
{externs}

inline uint32_t address_of(char const *member_name) {{
{lookup}    return 0;
}}

#endif  // #ifndef ___ADDRESS_OF__H___
"#,
            includes = self.includes(),
            externs = self.in_namespace(&externs.join("\n")),
            lookup = lookup
        )
    }

    fn generate_member_header(&self) -> String {
        let operations: Vec<String> = self
            .plan
            .operations
            .iter()
            .map(|op| format!("const uint16_t OP__{} = 0x{:04x};", op.name, op.code))
            .collect();
        let structs: Vec<String> = self.plan.functions.iter().map(struct_pair).collect();
        let commands: Vec<String> = self
            .plan
            .functions
            .iter()
            .map(|f| format!("const uint32_t CMD__{} = {};", f.symbol, f.opcode))
            .collect();
        let cases: Vec<String> = self
            .plan
            .functions
            .iter()
            .map(|f| self.dispatch_case(f))
            .collect();

        format!(
            r#"#ifndef ___MEMBER_HEADER__H___
#define ___MEMBER_HEADER__H___

#include <stdint.h>
{includes}
{operations}

{structs}
{commands}

/* `request.data` points at the packed arguments of `function_code`. The
 * response is written back over the same buffer. */
inline UInt8Array {dispatch}(uint32_t function_code, UInt8Array request) {{
    UInt8Array result = request;
    result.length = 0;
    switch (function_code) {{
{cases}        default:
            break;
    }}
    return result;
}}

#endif  // #ifndef ___MEMBER_HEADER__H___
"#,
            includes = self.includes(),
            operations = operations.join("\n"),
            structs = structs.join("\n"),
            commands = commands.join("\n"),
            dispatch = self.config.dispatch_name,
            cases = cases.concat()
        )
    }

    fn dispatch_case(&self, function: &FunctionPlan) -> String {
        let symbol = &function.symbol;
        let args: Vec<String> = function
            .fields
            .iter()
            .map(|f| format!("/* {} */ args.{}", f.c_type, f.name))
            .collect();
        let call = format!("{}({})", self.qualified(&function.name), args.join(", "));

        let mut body = String::new();
        if !function.fields.is_empty() {
            body.push_str(&format!(
                "                {symbol}__Request &args = *(reinterpret_cast<{symbol}__Request *>(&request.data[0]));\n",
                symbol = symbol
            ));
        }
        if function.result.is_some() {
            body.push_str(&format!(
                r#"                {symbol}__Response response;
                response.result = {call};
                {symbol}__Response &output = *(reinterpret_cast<{symbol}__Response *>(&request.data[0]));
                output = response;
                result.length = sizeof(output);
"#,
                symbol = symbol,
                call = call
            ));
        } else {
            body.push_str(&format!("                {};\n", call));
        }

        let location = function
            .location
            .as_ref()
            .map(|l| format!("            // {}\n", l))
            .unwrap_or_default();
        format!(
            "        case CMD__{symbol}:\n{location}            {{\n{body}            }}\n            break;\n",
            symbol = symbol,
            location = location,
            body = body
        )
    }

    fn includes(&self) -> String {
        let definitions = self.plan.headers.iter().map(|header| {
            Path::new(header)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| header.clone())
        });
        let headers = self
            .config
            .includes
            .iter()
            .chain(std::iter::once(&self.config.buffer_header))
            .cloned()
            .chain(definitions);
        let mut lines: Vec<String> = Vec::new();
        for name in headers {
            let line = format!("#include \"{}\"", name);
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    fn qualified(&self, name: &str) -> String {
        if self.plan.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.plan.namespace, name)
        }
    }

    fn in_namespace(&self, body: &str) -> String {
        if self.plan.namespace.is_empty() {
            return body.to_string();
        }
        let parts: Vec<&str> = self.plan.namespace.split("::").collect();
        let open: Vec<String> = parts.iter().map(|p| format!("namespace {} {{", p)).collect();
        let close: Vec<&str> = parts.iter().map(|_| "}").collect();
        format!("{}\n{}\n{}", open.join(" "), body, close.join(" "))
    }
}

fn extern_declaration(attr: &AttributePlan) -> String {
    let d = &attr.descriptor;
    let qualifiers = format!(
        "{}{}",
        if d.is_volatile { "volatile " } else { "" },
        if d.is_const { "const " } else { "" }
    );
    match (d.kind, d.element_type.as_deref()) {
        (AttributeKind::FixedArray, Some(element)) => format!(
            "extern {}{} {}[{}];",
            qualifiers,
            strip_qualifiers(element),
            d.name,
            d.array_length.unwrap_or(0)
        ),
        _ => format!(
            "extern {}{} {};",
            qualifiers,
            strip_qualifiers(&d.type_name),
            d.name
        ),
    }
}

fn struct_pair(function: &FunctionPlan) -> String {
    let fields: String = function
        .fields
        .iter()
        .map(|f| format!("  {} {};\n", f.c_type, f.name))
        .collect();
    let result = function
        .result
        .as_ref()
        .map(|r| format!("  {} result;\n", r.c_type))
        .unwrap_or_default();
    format!(
        r#"typedef struct __attribute__((packed)) {{
{fields}}} {symbol}__Request;

typedef struct __attribute__((packed)) {{
{result}}} {symbol}__Response;
"#,
        fields = fields,
        result = result,
        symbol = function.symbol
    )
}
