use cpp_delegate_catalog::parse::{parse_ast_content, parse_ast_file};
use cpp_delegate_catalog::{CatalogConfig, Codec, TypeCatalog};
use cpp_delegate_codegen::{
    generate_all, write_host, write_remote, GeneratedSources, HostConfig, RemoteConfig,
};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn generate(config: CatalogConfig) -> GeneratedSources {
    let ast = parse_ast_file(fixture_path("blink.json")).expect("should parse blink.json");
    let catalog = TypeCatalog::build(&ast, &config).unwrap();
    generate_all(
        &ast,
        &catalog,
        &Codec::default(),
        &RemoteConfig::default(),
        &HostConfig::default(),
    )
    .expect("should generate")
}

#[test]
fn test_both_sides_share_plan_opcodes() {
    let generated = generate(CatalogConfig::default());
    let header = &generated.remote.member_header_h;
    let bindings = &generated.bindings_rs;

    assert_eq!(generated.plan.functions.len(), 4);
    for function in &generated.plan.functions {
        assert!(
            header.contains(&format!("const uint32_t CMD__{} = {};", function.symbol, function.opcode)),
            "missing C++ opcode for {}",
            function.name
        );
        assert!(
            bindings.contains(&format!(
                "pub const CMD_{}: u32 = {};",
                function.symbol.to_uppercase(),
                function.opcode
            )),
            "missing Rust opcode for {}",
            function.name
        );
        assert!(header.contains(&format!("case CMD__{}:", function.symbol)));
    }
}

#[test]
fn test_field_order_matches_on_both_sides() {
    let generated = generate(CatalogConfig::default());

    assert!(generated.remote.member_header_h.contains(
        "typedef struct __attribute__((packed)) {\n  int32_t a;\n  int32_t b;\n} add__Request;"
    ));
    assert!(generated
        .bindings_rs
        .contains("pub async fn add(&mut self, a: i32, b: i32) -> Result<i32, DelegateError> {"));
    assert!(generated
        .bindings_rs
        .contains("        put(&mut packed, a);\n        put(&mut packed, b);\n"));
    assert!(generated
        .bindings_rs
        .contains("let mut packed = Vec::with_capacity(8);"));
}

#[test]
fn test_dispatch_invokes_functions() {
    let generated = generate(CatalogConfig::default());
    let header = &generated.remote.member_header_h;

    assert!(header.contains("response.result = add(/* int32_t */ args.a, /* int32_t */ args.b);"));
    assert!(header.contains("set_led(/* bool */ args.on);"));
    assert!(header.contains("response.result = millis();"));
    assert!(header.contains("// src/Blink.h (line: 24, col: 9)"));
    assert!(header.contains("inline UInt8Array exec_function(uint32_t function_code, UInt8Array request) {"));
    assert!(header.contains("const uint16_t OP__exec = 0x0627;"));
    assert!(header.contains("const uint16_t OP__address_of = 0xafa7;"));
}

#[test]
fn test_host_result_types() {
    let bindings = generate(CatalogConfig::default()).bindings_rs;

    assert!(bindings.contains("pub async fn millis(&mut self) -> Result<u32, DelegateError> {"));
    assert!(bindings.contains("    /// Milliseconds since boot.\n"));
    assert!(bindings.contains("pub async fn set_led(&mut self, on: bool) -> Result<(), DelegateError> {"));
    assert!(bindings.contains("pub async fn delay(&mut self, ms: u32) -> Result<(), DelegateError> {"));
    assert!(bindings.contains("let packed: Vec<u8> = Vec::new();"));
}

#[test]
fn test_address_of_header() {
    let header = generate(CatalogConfig::default()).remote.address_of_h;

    assert!(header.contains("#include \"Arduino.h\"\n#include \"CArrayDefs.h\"\n#include \"BlinkState.h\""));
    assert!(header.contains("extern const uint8_t led_pin;"));
    assert!(header.contains("extern uint16_t pattern[4];"));
    assert!(header.contains("extern UInt8Array samples;"));
    assert!(header.contains("extern blink::State state;"));
    assert!(!header.contains("PORTB"));
    assert!(header.contains(r#"if (strcmp(member_name, "led_pin") == 0) {"#));
    assert!(header.contains(r#"} else if (strcmp(member_name, "blink_count") == 0) {"#));
    assert!(header.contains("return 0;"));
}

#[test]
fn test_namespaced_context() {
    let generated = generate(CatalogConfig::new().with_namespace("blink"));
    let header = &generated.remote.member_header_h;

    assert!(header.contains("response.result = blink::tick();"));
    assert!(generated.bindings_rs.contains("Remote functions of the `blink` namespace."));
    assert!(generated.remote.address_of_h.contains("inline uint32_t address_of"));
}

#[test]
fn test_write_outputs() {
    let generated = generate(CatalogConfig::default());
    let dir = std::env::temp_dir().join(format!("cpp-delegate-codegen-{}", std::process::id()));

    write_remote(&generated.remote, &dir).unwrap();
    write_host(&generated.bindings_rs, &dir.join("host/bindings.rs")).unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.join("MemberHeader.h")).unwrap(),
        generated.remote.member_header_h
    );
    assert!(dir.join("AddressOf.h").exists());
    assert!(dir.join("host/bindings.rs").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_dispatch_buffer_header_without_dynamic_arrays() {
    let ast = parse_ast_content(
        r#"{ "members": {
            "count": { "kind": "VAR_DECL", "name": "count", "type": "int32_t" },
            "millis": { "kind": "FUNCTION_DECL", "name": "millis", "result_type": "unsigned long" }
        } }"#,
    )
    .unwrap();
    let catalog = TypeCatalog::build(&ast, &CatalogConfig::default()).unwrap();
    let generate_with = |remote: &RemoteConfig| {
        generate_all(&ast, &catalog, &Codec::default(), remote, &HostConfig::default())
            .expect("should generate")
    };

    let generated = generate_with(&RemoteConfig::default());
    assert!(generated.plan.headers.is_empty());
    let header = &generated.remote.member_header_h;
    assert!(header.contains("#include \"Arduino.h\"\n#include \"CArrayDefs.h\""));
    assert!(header.contains("inline UInt8Array exec_function(uint32_t function_code, UInt8Array request) {"));

    let custom = generate_with(&RemoteConfig::default().with_buffer_header("Buffers.h"));
    assert!(custom.remote.member_header_h.contains("#include \"Buffers.h\""));
    assert!(!custom.remote.member_header_h.contains("CArrayDefs.h"));
}
