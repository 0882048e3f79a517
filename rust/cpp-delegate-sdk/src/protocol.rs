//! Request packets and the half-duplex wire client
//!
//! | Operation    | Request                                              | Response          |
//! |--------------|------------------------------------------------------|-------------------|
//! | `address_of` | op `u16`, name bytes                                 | address `u32`     |
//! | `mem_read`   | op `u16`, address `u32`, size `u16`                  | `size` raw bytes  |
//! | `mem_write`  | op `u16`, address `u32`, size `u16`, bytes           | none              |
//! | `exec`       | op `u16`, function `u32`, args view, packed args     | raw result buffer |
//!
//! All integers are little-endian.

use crate::error::DelegateError;
use crate::transport::{ByteChannel, Envelope, Passthrough};
use bytes::{BufMut, Bytes, BytesMut};
use cpp_delegate_catalog::{Codec, DynamicArrayView, Operation};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn address_of_packet(name: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 + name.len());
    buf.put_u16_le(Operation::AddressOf.code());
    buf.put_slice(name.as_bytes());
    buf.freeze()
}

pub fn mem_read_packet(address: u32, size: usize) -> Result<Bytes, DelegateError> {
    let size = size_field(size)?;
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u16_le(Operation::MemRead.code());
    buf.put_u32_le(address);
    buf.put_u16_le(size);
    Ok(buf.freeze())
}

pub fn mem_write_packet(address: u32, data: &[u8]) -> Result<Bytes, DelegateError> {
    let size = size_field(data.len())?;
    let mut buf = BytesMut::with_capacity(8 + data.len());
    buf.put_u16_le(Operation::MemWrite.code());
    buf.put_u32_le(address);
    buf.put_u16_le(size);
    buf.put_slice(data);
    Ok(buf.freeze())
}

/// The embedded view describes the packed arguments: their length, and
/// their offset from the start of this payload.
pub fn exec_packet(codec: &Codec, function_opcode: u32, packed_args: &[u8]) -> Bytes {
    let header_size = 2 + 4 + codec.view_size();
    let view = DynamicArrayView {
        length: packed_args.len() as u32,
        data: header_size as u64,
    };
    let mut buf = BytesMut::with_capacity(header_size + packed_args.len());
    buf.put_u16_le(Operation::Exec.code());
    buf.put_u32_le(function_opcode);
    buf.put_slice(&codec.encode_view(view));
    buf.put_slice(packed_args);
    buf.freeze()
}

fn size_field(size: usize) -> Result<u16, DelegateError> {
    u16::try_from(size).map_err(|_| DelegateError::RequestTooLarge { size })
}

/// Narrow a remote pointer to the protocol's 32-bit address field.
pub fn address_field(address: u64) -> Result<u32, DelegateError> {
    u32::try_from(address).map_err(|_| DelegateError::AddressOutOfRange(address))
}

/// Issues one request at a time over an exclusive channel.
pub struct WireClient<C> {
    channel: C,
    envelope: Box<dyn Envelope>,
    codec: Codec,
    address_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<C: ByteChannel> WireClient<C> {
    pub fn new(channel: C, codec: Codec) -> Self {
        Self {
            channel,
            envelope: Box::new(Passthrough),
            codec,
            address_timeout: None,
            request_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_envelope(mut self, envelope: impl Envelope + 'static) -> Self {
        self.envelope = Box::new(envelope);
        self
    }

    pub fn with_timeouts(mut self, address: Option<Duration>, request: Option<Duration>) -> Self {
        self.address_timeout = address;
        self.request_timeout = request;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    pub async fn address_of(&mut self, name: &str) -> Result<u32, DelegateError> {
        let packet = address_of_packet(name);
        let limit = self.address_timeout;
        let response = self
            .round_trip(Operation::AddressOf, packet, limit, |timeout| {
                DelegateError::AddressResolutionTimeout {
                    name: name.to_string(),
                    timeout,
                }
            })
            .await?;
        let bytes: [u8; 4] = response
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or(DelegateError::Truncated {
                expected: 4,
                actual: response.len(),
            })?;
        let address = u32::from_le_bytes(bytes);
        tracing::debug!(name, address = format_args!("0x{:08x}", address), "Resolved address");
        Ok(address)
    }

    pub async fn mem_read(&mut self, address: u32, size: usize) -> Result<Bytes, DelegateError> {
        let packet = mem_read_packet(address, size)?;
        let response = self.request(Operation::MemRead, packet).await?;
        tracing::debug!(
            address = format_args!("0x{:08x}", address),
            size,
            received = response.len(),
            "mem_read"
        );
        Ok(response)
    }

    pub async fn mem_write(&mut self, address: u32, data: &[u8]) -> Result<(), DelegateError> {
        let packet = mem_write_packet(address, data)?;
        self.send(Operation::MemWrite, packet).await?;
        tracing::debug!(
            address = format_args!("0x{:08x}", address),
            size = data.len(),
            "mem_write"
        );
        Ok(())
    }

    pub async fn exec(&mut self, function_opcode: u32, packed_args: &[u8]) -> Result<Bytes, DelegateError> {
        let packet = exec_packet(&self.codec, function_opcode, packed_args);
        let response = self.request(Operation::Exec, packet).await?;
        tracing::debug!(
            function_opcode,
            sent = packed_args.len(),
            received = response.len(),
            "exec"
        );
        Ok(response)
    }

    async fn request(&mut self, operation: Operation, packet: Bytes) -> Result<Bytes, DelegateError> {
        let limit = self.request_timeout;
        self.round_trip(operation, packet, limit, |timeout| DelegateError::Timeout {
            operation,
            timeout,
        })
        .await
    }

    async fn round_trip(
        &mut self,
        operation: Operation,
        packet: Bytes,
        limit: Option<Duration>,
        on_timeout: impl FnOnce(Duration) -> DelegateError,
    ) -> Result<Bytes, DelegateError> {
        self.send(operation, packet).await?;

        let Self {
            channel,
            envelope,
            cancel,
            ..
        } = self;
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DelegateError::Cancelled { operation }),
            read = async {
                match limit {
                    Some(limit) => tokio::time::timeout(limit, channel.read_available())
                        .await
                        .map_err(|_| on_timeout(limit))?
                        .map_err(DelegateError::from),
                    None => channel.read_available().await.map_err(DelegateError::from),
                }
            } => read?,
        };
        Ok(envelope.open(frame)?)
    }

    async fn send(&mut self, operation: Operation, packet: Bytes) -> Result<(), DelegateError> {
        if self.cancel.is_cancelled() {
            return Err(DelegateError::Cancelled { operation });
        }
        let frame = self.envelope.seal(packet);
        self.channel.write(&frame).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_of_packet() {
        let packet = address_of_packet("count");
        assert_eq!(&packet[..2], &[0xa7, 0xaf]);
        assert_eq!(&packet[2..], b"count");
    }

    #[test]
    fn test_mem_read_packet() {
        let packet = mem_read_packet(0x2000, 8).unwrap();
        assert_eq!(&packet[..], &[0xe9, 0xc1, 0x00, 0x20, 0, 0, 8, 0]);
    }

    #[test]
    fn test_mem_write_packet() {
        let packet = mem_write_packet(0x10, &[7, 9]).unwrap();
        assert_eq!(&packet[..], &[0x75, 0x71, 0x10, 0, 0, 0, 2, 0, 7, 9]);
    }

    #[test]
    fn test_oversized_request_rejected() {
        let err = mem_read_packet(0, 70_000).unwrap_err();
        assert!(matches!(err, DelegateError::RequestTooLarge { size: 70_000 }));
    }

    #[test]
    fn test_exec_packet_embeds_args_view() {
        let packet = exec_packet(&Codec::default(), 0, &[2, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(packet.len(), 2 + 4 + 8 + 8);
        assert_eq!(&packet[..2], &[0x27, 0x06]);
        assert_eq!(&packet[2..6], &[0, 0, 0, 0]);
        // length = 8, data = offset 14
        assert_eq!(&packet[6..14], &[8, 0, 0, 0, 14, 0, 0, 0]);
        assert_eq!(&packet[14..], &[2, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn test_address_field_range() {
        assert_eq!(address_field(0x2000).unwrap(), 0x2000);
        assert!(matches!(
            address_field(0x1_0000_0000),
            Err(DelegateError::AddressOutOfRange(_))
        ));
    }
}
