use async_trait::async_trait;
use bytes::Bytes;
use cpp_delegate_catalog::parse::parse_ast_content;
use cpp_delegate_catalog::{CppAst, Operation};
use cpp_delegate_sdk::{
    ByteChannel, CallResult, ContextConfig, DelegateError, RemoteContext, Scalar, Value,
};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const AST: &str = r#"{
    "members": {
        "ticks": { "kind": "VAR_DECL", "name": "ticks", "type": "uint32_t" },
        "count": { "kind": "VAR_DECL", "name": "count", "type": "int32_t", "const": true,
                   "location": { "file": "src/Counter.h", "start": { "line": 3, "column": 15 } } },
        "buffer": { "kind": "VAR_DECL", "name": "buffer", "type": "UInt8Array" },
        "levels": { "kind": "CONSTANTARRAY", "name": "levels", "type": "uint16_t [4]",
                    "element_type": "uint16_t", "array_size": 4 },
        "mode": { "kind": "VAR_DECL", "name": "mode", "type": "HardwareSerial" },
        "millis": { "kind": "FUNCTION_DECL", "name": "millis", "result_type": "unsigned long" },
        "add": { "kind": "FUNCTION_DECL", "name": "add", "result_type": "int32_t",
                 "arguments": [ { "name": "a", "type": "int32_t" }, { "name": "b", "type": "int32_t" } ] }
    },
    "classes": {
        "UInt8Array": {
            "members": { "data": { "kind": "POINTER", "name": "data", "pointee_type": "uint8_t" } },
            "location": { "file": "include/CArrayDefs.h" }
        }
    }
}"#;

/// Addresses answered during construction, in name-sorted order.
const ADDRESSES: [(&str, u32); 5] = [
    ("buffer", 0x100),
    ("count", 0x104),
    ("levels", 0x108),
    ("mode", 0x110),
    ("ticks", 0x114),
];

#[derive(Default)]
struct Script {
    responses: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
}

/// Replays canned responses and records every write.
#[derive(Clone, Default)]
struct ScriptedChannel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedChannel {
    fn respond(&self, bytes: &[u8]) {
        self.script.lock().unwrap().responses.push_back(bytes.to_vec());
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.script.lock().unwrap().writes.clone()
    }

    fn write_count(&self) -> usize {
        self.script.lock().unwrap().writes.len()
    }
}

#[async_trait]
impl ByteChannel for ScriptedChannel {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.script.lock().unwrap().writes.push(bytes.to_vec());
        Ok(())
    }

    async fn read_available(&mut self) -> io::Result<Bytes> {
        let next = self.script.lock().unwrap().responses.pop_front();
        match next {
            Some(bytes) => Ok(Bytes::from(bytes)),
            None => std::future::pending().await,
        }
    }
}

fn ast() -> CppAst {
    parse_ast_content(AST).unwrap()
}

async fn connect() -> (RemoteContext<ScriptedChannel>, ScriptedChannel) {
    connect_with(ContextConfig::new()).await
}

async fn connect_with(config: ContextConfig) -> (RemoteContext<ScriptedChannel>, ScriptedChannel) {
    let channel = ScriptedChannel::default();
    for (_, address) in ADDRESSES {
        channel.respond(&address.to_le_bytes());
    }
    let ctx = RemoteContext::connect(channel.clone(), &ast(), config)
        .await
        .expect("context should connect");
    (ctx, channel)
}

fn op(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[tokio::test]
async fn test_connect_resolves_addresses_in_name_order() {
    let (ctx, channel) = connect().await;

    let requested: Vec<String> = channel
        .writes()
        .iter()
        .map(|w| {
            assert_eq!(op(w), Operation::AddressOf.code());
            String::from_utf8(w[2..].to_vec()).unwrap()
        })
        .collect();
    assert_eq!(requested, vec!["buffer", "count", "levels", "mode", "ticks"]);

    let cached: Vec<(&str, u32)> = ctx.addresses().iter().collect();
    assert_eq!(cached, ADDRESSES.to_vec());
}

#[tokio::test]
async fn test_call_packs_arguments_and_decodes_result() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[5, 0, 0, 0]);

    let result = ctx.call("add", &[Scalar::I32(2), Scalar::I32(3)]).await.unwrap();
    assert_eq!(result, CallResult::Scalar(Scalar::I32(5)));

    let writes = channel.writes();
    assert_eq!(
        writes.last().unwrap(),
        &vec![0x27, 0x06, 0, 0, 0, 0, 8, 0, 0, 0, 14, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]
    );
}

#[tokio::test]
async fn test_call_without_arguments() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[0xe8, 0x03, 0, 0]);

    let result = ctx.call("millis", &[]).await.unwrap();
    assert_eq!(result, CallResult::Scalar(Scalar::U32(1000)));
    let last = channel.writes().pop().unwrap();
    assert_eq!(&last[2..6], &[1, 0, 0, 0]);
    assert_eq!(last.len(), 14);
}

#[tokio::test]
async fn test_call_arity_mismatch_sends_nothing() {
    let (mut ctx, channel) = connect().await;
    let before = channel.write_count();

    let err = ctx.call("add", &[Scalar::I32(2)]).await.unwrap_err();
    assert!(matches!(err, DelegateError::ArgumentMismatch { expected: 2, actual: 1, .. }));
    assert_eq!(channel.write_count(), before);
}

#[tokio::test]
async fn test_call_unknown_function_suggests() {
    let (mut ctx, _) = connect().await;
    let err = ctx.call("ad", &[]).await.unwrap_err();
    assert!(matches!(&err, DelegateError::FunctionNotFound { suggestions, .. }
        if suggestions[0].candidate == "add"));
}

#[tokio::test]
async fn test_get_dynamic_array_reads_header_then_payload() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[3, 0, 0, 0, 0x00, 0x20, 0, 0]);
    channel.respond(&[7, 8, 9]);

    let value = ctx.get("buffer").await.unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Scalar::U8(7), Scalar::U8(8), Scalar::U8(9)])
    );

    let writes = channel.writes();
    let reads = &writes[ADDRESSES.len()..];
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0], vec![0xe9, 0xc1, 0x00, 0x01, 0, 0, 8, 0]);
    assert_eq!(reads[1], vec![0xe9, 0xc1, 0x00, 0x20, 0, 0, 3, 0]);
}

#[tokio::test]
async fn test_get_fixed_array_returns_declared_length() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[1, 0, 2, 0, 3, 0, 4, 0]);

    let value = ctx.get("levels").await.unwrap();
    assert_eq!(value.len(), 4);
    assert_eq!(value.as_array().unwrap()[3], Scalar::U16(4));
}

#[tokio::test]
async fn test_get_scalar() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[0xff, 0xff, 0xff, 0xff]);

    assert_eq!(ctx.get("count").await.unwrap(), Value::Scalar(Scalar::I32(-1)));
}

#[tokio::test]
async fn test_unsupported_type_with_and_without_default() {
    let (mut ctx, channel) = connect().await;
    let before = channel.write_count();

    let err = ctx.get("mode").await.unwrap_err();
    assert!(matches!(err, DelegateError::UnsupportedType(t) if t == "HardwareSerial"));

    let value = ctx.get_or("mode", Value::Array(Vec::new())).await.unwrap();
    assert_eq!(value, Value::Array(Vec::new()));
    assert_eq!(channel.write_count(), before);
}

#[tokio::test]
async fn test_get_all_skips_unsupported() {
    let (mut ctx, channel) = connect().await;
    // AST order: ticks, count, buffer (header + payload), levels; mode is skipped.
    channel.respond(&[1, 0, 0, 0]);
    channel.respond(&[2, 0, 0, 0]);
    channel.respond(&[1, 0, 0, 0, 0x00, 0x20, 0, 0]);
    channel.respond(&[9]);
    channel.respond(&[0, 0, 0, 0, 0, 0, 0, 0]);

    let values = ctx.get_all().await.unwrap();
    let names: Vec<&str> = values.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["ticks", "count", "buffer", "levels", "mode"]);
    assert_eq!(values["buffer"], Some(Value::Array(vec![Scalar::U8(9)])));
    assert_eq!(values["mode"], None);
}

#[tokio::test]
async fn test_set_const_attribute_is_read_only() {
    let (mut ctx, channel) = connect().await;
    let before = channel.write_count();

    let err = ctx.set("count", Scalar::I32(4)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attribute 'count' is read-only (declared as \"const\" at `src/Counter.h (line: 3, col: 15)`)"
    );
    assert_eq!(channel.write_count(), before);
}

#[tokio::test]
async fn test_set_scalar_writes_element_size() {
    let (mut ctx, channel) = connect().await;

    ctx.set("ticks", Scalar::I32(258)).await.unwrap();
    let last = channel.writes().pop().unwrap();
    assert_eq!(last, vec![0x75, 0x71, 0x14, 0x01, 0, 0, 4, 0, 2, 1, 0, 0]);
}

#[tokio::test]
async fn test_set_fixed_array_length_mismatch_writes_nothing() {
    let (mut ctx, channel) = connect().await;
    let before = channel.write_count();

    let err = ctx
        .set("levels", vec![Scalar::U16(1), Scalar::U16(2), Scalar::U16(3)])
        .await
        .unwrap_err();
    assert!(matches!(err, DelegateError::ArrayLengthMismatch { expected: 4, actual: 3, .. }));
    assert_eq!(channel.write_count(), before);
}

#[tokio::test]
async fn test_set_fixed_array() {
    let (mut ctx, channel) = connect().await;

    let values: Vec<Scalar> = (1..=4).map(Scalar::I32).collect();
    ctx.set("levels", values).await.unwrap();
    let last = channel.writes().pop().unwrap();
    assert_eq!(&last[2..8], &[0x08, 0x01, 0, 0, 8, 0]);
    assert_eq!(&last[8..], &[1, 0, 2, 0, 3, 0, 4, 0]);
}

#[tokio::test]
async fn test_set_dynamic_array_checks_remote_length() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[3, 0, 0, 0, 0x00, 0x20, 0, 0]);
    let before = channel.write_count();

    let err = ctx.set("buffer", vec![Scalar::U8(1)]).await.unwrap_err();
    assert!(matches!(err, DelegateError::ArrayLengthMismatch { expected: 3, actual: 1, .. }));

    let writes = channel.writes();
    assert_eq!(writes.len(), before + 1);
    assert_eq!(op(writes.last().unwrap()), Operation::MemRead.code());
}

#[tokio::test]
async fn test_set_dynamic_array_writes_payload_at_data_pointer() {
    let (mut ctx, channel) = connect().await;
    channel.respond(&[2, 0, 0, 0, 0x00, 0x20, 0, 0]);

    ctx.set("buffer", vec![Scalar::U8(4), Scalar::U8(5)]).await.unwrap();
    let last = channel.writes().pop().unwrap();
    assert_eq!(last, vec![0x75, 0x71, 0x00, 0x20, 0, 0, 2, 0, 4, 5]);
}

#[tokio::test]
async fn test_address_resolution_timeout() {
    let channel = ScriptedChannel::default();
    let config = ContextConfig::new().with_address_timeout(Some(Duration::from_millis(20)));

    let err = RemoteContext::connect(channel, &ast(), config)
        .await
        .err()
        .expect("construction should fail");
    assert!(matches!(err, DelegateError::AddressResolutionTimeout { name, .. } if name == "buffer"));
}

#[tokio::test]
async fn test_request_timeout() {
    let config = ContextConfig::new().with_request_timeout(Some(Duration::from_millis(20)));
    let (mut ctx, _) = connect_with(config).await;

    let err = ctx.get("ticks").await.unwrap_err();
    assert!(matches!(
        err,
        DelegateError::Timeout { operation: Operation::MemRead, .. }
    ));
}

#[tokio::test]
async fn test_cancellation_aborts_pending_read() {
    let (mut ctx, _) = connect().await;
    let token = ctx.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });
    let err = ctx.get("ticks").await.unwrap_err();
    assert!(matches!(err, DelegateError::Cancelled { operation: Operation::MemRead }));

    let err = ctx.call("millis", &[]).await.unwrap_err();
    assert!(matches!(err, DelegateError::Cancelled { operation: Operation::Exec }));
}

#[tokio::test]
async fn test_list_descriptors() {
    let (ctx, _) = connect().await;
    let descriptors = ctx.list_descriptors();
    let names: Vec<&str> = descriptors.iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        vec!["ticks", "count", "buffer", "levels", "mode", "add", "millis"]
    );
}

const OVERLOADED_AST: &str = r#"{
    "members": {
        "scale": { "kind": "FUNCTION_DECL", "name": "scale", "result_type": "float",
                   "arguments": [ { "name": "x", "type": "float" } ] },
        "scale2": { "kind": "FUNCTION_DECL", "name": "scale", "result_type": "int32_t",
                    "arguments": [ { "name": "x", "type": "int32_t" } ] }
    }
}"#;

#[tokio::test]
async fn test_call_selects_overload_by_symbol() {
    let channel = ScriptedChannel::default();
    let ast = parse_ast_content(OVERLOADED_AST).unwrap();
    let mut ctx = RemoteContext::connect(channel.clone(), &ast, ContextConfig::new())
        .await
        .unwrap();

    let err = ctx.call("scale", &[Scalar::I32(3)]).await.unwrap_err();
    match err {
        DelegateError::AmbiguousFunction { name, candidates } => {
            assert_eq!(name, "scale");
            assert_eq!(candidates, vec!["scale_0", "scale_1"]);
        }
        other => panic!("expected AmbiguousFunction, got {other:?}"),
    }
    assert_eq!(channel.write_count(), 0);

    channel.respond(&[6, 0, 0, 0]);
    let result = ctx.call("scale_1", &[Scalar::I32(3)]).await.unwrap();
    assert_eq!(result, CallResult::Scalar(Scalar::I32(6)));

    let writes = channel.writes();
    let request = writes.last().unwrap();
    assert_eq!(op(request), Operation::Exec.code());
    assert_eq!(&request[2..6], &[1, 0, 0, 0]);
    assert!(request.ends_with(&[3, 0, 0, 0]));
}
