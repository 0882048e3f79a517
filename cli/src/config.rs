use anyhow::{Context, Result};
use cpp_delegate_catalog::{CatalogConfig, CodecConfig, PointerWidth};
use cpp_delegate_codegen::{HostConfig, RemoteConfig};
use cpp_delegate_sdk::ContextConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of cpp-delegate.toml.
///
/// The file is optional: every value can also come from command-line flags,
/// which take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CppDelegateConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub host: HostSection,

    #[serde(default)]
    pub connection: ConnectionSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Path to the AST dump (`.json` or `.json.gz`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<PathBuf>,

    /// Namespace to expose; empty for the top level
    #[serde(default)]
    pub namespace: String,

    /// Members declared under these directories are ignored
    #[serde(default)]
    pub exclude_dirs: Vec<PathBuf>,

    /// Replaces the built-in list of hidden member names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disallowed: Option<Vec<String>>,

    /// Remote data pointer width in bits (32 or 64)
    #[serde(default = "default_pointer_bits")]
    pub pointer_bits: u32,
}

fn default_pointer_bits() -> u32 {
    32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_remote_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_includes")]
    pub includes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_name: Option<String>,

    /// Header declaring `UInt8Array` (default `CArrayDefs.h`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_header: Option<String>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            output_dir: default_remote_dir(),
            includes: default_includes(),
            dispatch_name: None,
            buffer_header: None,
        }
    }
}

fn default_remote_dir() -> PathBuf {
    PathBuf::from("./generated/remote")
}

fn default_includes() -> Vec<String> {
    vec!["Arduino.h".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSection {
    #[serde(default = "default_host_output")]
    pub output: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            output: default_host_output(),
            sdk_path: None,
            struct_name: None,
        }
    }
}

fn default_host_output() -> PathBuf {
    PathBuf::from("./generated/bindings.rs")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSection {
    /// `host:port` of the TCP byte bridge in front of the device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl CppDelegateConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load config, returning None if file doesn't exist
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CppDelegateConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.project.pointer_bits, 32 | 64) {
            anyhow::bail!(
                "pointer_bits must be 32 or 64, got {}",
                self.project.pointer_bits
            );
        }
        if self
            .project
            .namespace
            .split("::")
            .any(|part| part.is_empty() && !self.project.namespace.is_empty())
        {
            anyhow::bail!("Invalid namespace: '{}'", self.project.namespace);
        }
        if let Some(address) = &self.connection.address {
            if !address.contains(':') {
                anyhow::bail!("Connection address must be host:port, got '{}'", address);
            }
        }
        Ok(())
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::new().with_namespace(self.project.namespace.clone());
        if let Some(disallowed) = &self.project.disallowed {
            config = config.with_disallowed(disallowed.clone());
        }
        for dir in &self.project.exclude_dirs {
            config = config.with_exclude_dir(dir.clone());
        }
        config
    }

    pub fn codec_config(&self) -> CodecConfig {
        let width = match self.project.pointer_bits {
            64 => PointerWidth::Bits64,
            _ => PointerWidth::Bits32,
        };
        CodecConfig::new().with_pointer_width(width)
    }

    pub fn remote_config(&self) -> RemoteConfig {
        let mut config = RemoteConfig::default().with_includes(self.remote.includes.clone());
        if let Some(name) = &self.remote.dispatch_name {
            config = config.with_dispatch_name(name.clone());
        }
        if let Some(header) = &self.remote.buffer_header {
            config = config.with_buffer_header(header.clone());
        }
        config
    }

    pub fn host_config(&self) -> HostConfig {
        let mut config = HostConfig::default();
        if let Some(path) = &self.host.sdk_path {
            config = config.with_sdk_path(path.clone());
        }
        if let Some(name) = &self.host.struct_name {
            config = config.with_struct_name(name.clone());
        }
        config
    }

    pub fn context_config(&self) -> ContextConfig {
        let defaults = ContextConfig::default();
        ContextConfig::new()
            .with_catalog(self.catalog_config())
            .with_pointer_width(self.codec_config().pointer_width)
            .with_address_timeout(
                self.connection
                    .address_timeout_ms
                    .map(Duration::from_millis)
                    .or(defaults.address_timeout),
            )
            .with_request_timeout(
                self.connection
                    .request_timeout_ms
                    .map(Duration::from_millis)
                    .or(defaults.request_timeout),
            )
    }
}
