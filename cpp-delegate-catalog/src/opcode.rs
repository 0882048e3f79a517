//! Operation codes for the remote execution protocol

use sha2::{Digest, Sha256};
use std::fmt;

/// First two bytes of the SHA-256 digest of `name`, little-endian.
pub fn operation_code(name: &str) -> u16 {
    let hash = Sha256::digest(name.as_bytes());
    u16::from_le_bytes([hash[0], hash[1]])
}

/// The four protocol operations understood by the remote dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddressOf,
    MemRead,
    MemWrite,
    Exec,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::AddressOf,
        Operation::MemRead,
        Operation::MemWrite,
        Operation::Exec,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::AddressOf => "address_of",
            Operation::MemRead => "mem_read",
            Operation::MemWrite => "mem_write",
            Operation::Exec => "exec",
        }
    }

    pub fn code(self) -> u16 {
        operation_code(self.name())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
