use crate::config::ContextConfig;
use crate::error::DelegateError;
use crate::protocol::{address_field, WireClient};
use crate::transport::{ByteChannel, Envelope};
use cpp_delegate_catalog::{
    AttributeDescriptor, BinaryLayout, CallResult, Codec, CppAst, Descriptor, FunctionPlan,
    Scalar, TypeCatalog, Value,
};
use indexmap::IndexMap;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tokio_util::sync::CancellationToken;

/// Attribute addresses, resolved once at construction and never invalidated.
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    addresses: BTreeMap<String, u32>,
}

impl AddressCache {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.addresses.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.addresses.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

/// The variables and functions of one namespace of a remote program.
///
/// Every operation takes `&mut self`: the channel carries one request at a
/// time, so a context cannot be shared between concurrent callers.
pub struct RemoteContext<C> {
    wire: WireClient<C>,
    catalog: TypeCatalog,
    codec: Codec,
    addresses: AddressCache,
    plans: HashMap<u32, FunctionPlan>,
}

impl<C: ByteChannel> RemoteContext<C> {
    /// Build the catalog for `config.catalog.namespace` and resolve every
    /// attribute address.
    pub async fn connect(channel: C, ast: &CppAst, config: ContextConfig) -> Result<Self, DelegateError> {
        let catalog = TypeCatalog::build(ast, &config.catalog)?;
        Self::with_catalog(channel, catalog, config).await
    }

    pub async fn with_catalog(
        channel: C,
        catalog: TypeCatalog,
        config: ContextConfig,
    ) -> Result<Self, DelegateError> {
        let codec = Codec::new(config.codec.clone());
        let wire = WireClient::new(channel, codec.clone())
            .with_timeouts(config.address_timeout, config.request_timeout)
            .with_cancellation(config.cancellation.clone());
        Self::from_wire(wire, catalog).await
    }

    /// Like [`RemoteContext::with_catalog`] with a custom packet envelope.
    pub async fn with_envelope(
        channel: C,
        catalog: TypeCatalog,
        config: ContextConfig,
        envelope: impl Envelope + 'static,
    ) -> Result<Self, DelegateError> {
        let codec = Codec::new(config.codec.clone());
        let wire = WireClient::new(channel, codec)
            .with_envelope(envelope)
            .with_timeouts(config.address_timeout, config.request_timeout)
            .with_cancellation(config.cancellation.clone());
        Self::from_wire(wire, catalog).await
    }

    async fn from_wire(mut wire: WireClient<C>, catalog: TypeCatalog) -> Result<Self, DelegateError> {
        let mut addresses = AddressCache::default();
        for name in catalog.sorted_attribute_names() {
            let address = wire.address_of(name).await?;
            addresses.addresses.insert(name.to_string(), address);
        }

        tracing::info!(
            namespace = %catalog.namespace(),
            attributes = addresses.len(),
            functions = catalog.functions().len(),
            "Remote context ready"
        );

        Ok(Self {
            codec: wire.codec().clone(),
            wire,
            catalog,
            addresses,
            plans: HashMap::new(),
        })
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn addresses(&self) -> &AddressCache {
        &self.addresses
    }

    pub fn list_descriptors(&self) -> Vec<Descriptor<'_>> {
        self.catalog.list_descriptors()
    }

    /// Token that aborts the in-flight and all later requests when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.wire.cancellation_token()
    }

    pub fn into_channel(self) -> C {
        self.wire.into_channel()
    }

    /// Read an attribute from the device; dynamic arrays cost two reads.
    pub async fn get(&mut self, name: &str) -> Result<Value, DelegateError> {
        let attr = self.catalog.attribute(name)?.clone();
        let layout = self.codec.attribute_layout(&attr)?;
        self.read(&attr, layout).await
    }

    /// Like [`RemoteContext::get`], but an attribute whose type has no codec
    /// layout yields `default` without touching the channel.
    pub async fn get_or(&mut self, name: &str, default: Value) -> Result<Value, DelegateError> {
        Ok(self.try_get(name).await?.unwrap_or(default))
    }

    /// Every attribute in catalog order; `None` for types without a layout.
    pub async fn get_all(&mut self) -> Result<IndexMap<String, Option<Value>>, DelegateError> {
        let names: Vec<String> = self
            .catalog
            .attribute_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut values = IndexMap::with_capacity(names.len());
        for name in names {
            let value = self.try_get(&name).await?;
            values.insert(name, value);
        }
        Ok(values)
    }

    async fn try_get(&mut self, name: &str) -> Result<Option<Value>, DelegateError> {
        let attr = self.catalog.attribute(name)?.clone();
        match self.codec.attribute_layout(&attr) {
            Ok(layout) => Ok(Some(self.read(&attr, layout).await?)),
            Err(err) => {
                tracing::warn!(attribute = name, "Skipping read: {}", err);
                Ok(None)
            }
        }
    }

    async fn read(&mut self, attr: &AttributeDescriptor, layout: BinaryLayout) -> Result<Value, DelegateError> {
        let address = self.address(&attr.name)?;
        match layout {
            BinaryLayout::Scalar { element } => {
                let bytes = self.wire.mem_read(address, element.size()).await?;
                Ok(Value::Scalar(element.decode(&bytes)?))
            }
            BinaryLayout::FixedArray { element, length } => {
                let count = length as usize;
                let bytes = self.wire.mem_read(address, count * element.size()).await?;
                Ok(Value::Array(element.decode_array(&bytes, count)?))
            }
            BinaryLayout::DynamicArray { element } => {
                let (data, count) = self.read_view(address).await?;
                let bytes = self.wire.mem_read(data, count * element.size()).await?;
                Ok(Value::Array(element.decode_array(&bytes, count)?))
            }
        }
    }

    /// Write an attribute. Arrays must be given exactly as many elements as
    /// the remote side holds.
    pub async fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), DelegateError> {
        let attr = self.catalog.attribute(name)?.clone();
        if attr.is_const {
            return Err(DelegateError::ReadOnlyAttribute {
                name: attr.name,
                location: attr
                    .location
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "unknown location".to_string()),
            });
        }
        let layout = self.codec.attribute_layout(&attr)?;
        let address = self.address(name)?;
        let values = value.into().into_scalars();

        let (target, expected) = match layout {
            BinaryLayout::Scalar { .. } => (address, 1),
            BinaryLayout::FixedArray { length, .. } => (address, length as usize),
            BinaryLayout::DynamicArray { .. } => self.read_view(address).await?,
        };
        if values.len() != expected {
            return Err(DelegateError::ArrayLengthMismatch {
                name: attr.name,
                expected,
                actual: values.len(),
            });
        }

        let data = layout.element().encode_all(&values);
        self.wire.mem_write(target, &data).await
    }

    /// Call a remote function with positional arguments. Overloads are
    /// addressed by their `name_<opcode>` symbol.
    pub async fn call(&mut self, name: &str, args: &[Scalar]) -> Result<CallResult, DelegateError> {
        let (opcode, function) = self.catalog.function(name)?;
        let plan = match self.plans.entry(opcode) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(FunctionPlan::build(opcode, function, &self.codec)?),
        };
        let packed = plan.pack(args)?;
        let response = self.wire.exec(opcode, &packed).await?;
        Ok(plan.decode_result(&response)?)
    }

    /// Raw exec round trip with already packed arguments.
    pub async fn exec(&mut self, function_opcode: u32, packed_args: &[u8]) -> Result<Vec<u8>, DelegateError> {
        let response = self.wire.exec(function_opcode, packed_args).await?;
        Ok(response.to_vec())
    }

    /// Read a dynamic array header; returns the data address and element count.
    async fn read_view(&mut self, address: u32) -> Result<(u32, usize), DelegateError> {
        let header = self.wire.mem_read(address, self.codec.view_size()).await?;
        let view = self.codec.decode_view(&header)?;
        Ok((address_field(view.data)?, view.length as usize))
    }

    fn address(&self, name: &str) -> Result<u32, DelegateError> {
        self.addresses
            .get(name)
            .ok_or_else(|| DelegateError::AttributeNotFound {
                name: name.to_string(),
                suggestions: Vec::new(),
            })
    }
}
