//! Reads and writes named properties of a [`DataObject`] through a [`Transport`].
//!
//! Nothing here returns an error: every outcome is a [`Status`]. Multi-property
//! operations stop at the first hard failure (see [`StatusKind::is_hard`]) and
//! step over soft ones, recording them in a [`Report`].
//!
//! Connection lifecycle belongs to the caller. Transports are expected to be
//! connected already; see [`crate::endpoint::Endpoint`] for the usual wrapper.

pub mod block;

pub use block::{plan, Block, DEFAULT_BLOCK_SIZE, MODBUS_MAX_READ};

use crate::error::{Status, StatusKind};
use crate::registry::{DataObject, PropertyDescriptor, Registry, PRIMARY_SECTION};
use crate::sunspec::{Registers, Value};
use crate::transport::Transport;
use log::{debug, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// One transport read per property, in declaration order.
    #[default]
    Strict,
    /// Merge adjacent properties into reads of up to `max_block_size` registers.
    Block { max_block_size: u16 },
}

impl ReadMode {
    pub fn block(max_block_size: u16) -> Self {
        Self::Block {
            max_block_size: max_block_size.clamp(1, MODBUS_MAX_READ),
        }
    }
}

/// Per-property outcomes of a multi-property operation, in the order attempted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub results: Vec<(String, Status)>,
}

impl Report {
    fn record(&mut self, name: &str, status: Status) {
        self.results.push((name.to_string(), status));
    }

    /// The hard failure that stopped the operation, or good.
    pub fn status(&self) -> Status {
        self.results
            .iter()
            .map(|(_, status)| status)
            .find(|status| status.kind.is_hard())
            .cloned()
            .unwrap_or_else(Status::good)
    }

    pub fn is_good(&self) -> bool {
        self.results.iter().all(|(_, status)| status.is_good())
    }

    pub fn get(&self, name: &str) -> Option<&Status> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, status)| status)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Status)> {
        self.results
            .iter()
            .filter(|(_, status)| !status.is_good())
            .map(|(name, status)| (name.as_str(), status))
    }
}

fn lookup<O>(object: &O, name: &str) -> Result<PropertyDescriptor, Status>
where
    O: DataObject + ?Sized,
{
    object
        .catalog()
        .describe(name)
        .cloned()
        .ok_or_else(|| Status::not_found(name))
}

fn decode(descriptor: &PropertyDescriptor, words: &[u16]) -> Result<Value, Status> {
    descriptor.kind.decode(words).map_err(|err| {
        Status::new(
            StatusKind::EncodingError,
            format!("{}: {}", descriptor.name, err),
        )
    })
}

fn assign<O>(object: &mut O, descriptor: &PropertyDescriptor, value: Value) -> Status
where
    O: DataObject + ?Sized,
{
    match object.set_field(&descriptor.name, value) {
        Ok(()) => Status::good(),
        Err(err) => Status::new(
            StatusKind::InternalError,
            format!("{}: {}", descriptor.name, err),
        ),
    }
}

async fn fetch<T>(transport: &mut T, offset: u16, length: u16) -> Result<Vec<u16>, Status>
where
    T: Transport + ?Sized,
{
    let words = transport
        .read_registers(offset, length)
        .await
        .map_err(Status::from)?;
    if words.len() < usize::from(length) {
        return Err(Status::new(
            StatusKind::CommunicationError,
            format!(
                "asked for {} registers at {}, got {}",
                length,
                offset,
                words.len()
            ),
        ));
    }
    Ok(words)
}

async fn read_descriptor<O, T>(object: &mut O, descriptor: &PropertyDescriptor, transport: &mut T) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    let words = match fetch(transport, descriptor.offset, descriptor.length).await {
        Ok(words) => words,
        Err(status) => return status,
    };
    match decode(descriptor, &words) {
        Ok(value) => assign(object, descriptor, value),
        Err(status) => status,
    }
}

/// Read one property from the device into `object`.
pub async fn read_property<O, T>(object: &mut O, name: &str, transport: &mut T) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    let descriptor = match lookup(object, name) {
        Ok(descriptor) => descriptor,
        Err(status) => return status,
    };
    if !descriptor.access.is_readable() {
        return Status::not_readable(name);
    }
    let status = read_descriptor(object, &descriptor, transport).await;
    if !status.is_good() {
        debug!("read {} failed: {}", name, status);
    }
    status
}

/// Write the current value of one property of `object` to the device.
pub async fn write_property<O, T>(object: &mut O, name: &str, transport: &mut T) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    let descriptor = match lookup(object, name) {
        Ok(descriptor) => descriptor,
        Err(status) => return status,
    };
    if !descriptor.access.is_writable() {
        return Status::not_writable(name);
    }
    let value = match object.get_field(&descriptor.name) {
        Some(value) => value,
        None => {
            return Status::new(
                StatusKind::InternalError,
                format!("{} has no backing field", descriptor.name),
            )
        }
    };
    if value.kind() != descriptor.kind {
        return Status::new(
            StatusKind::EncodingError,
            format!(
                "{} holds a {} but is declared {}",
                descriptor.name,
                value.kind(),
                descriptor.kind
            ),
        );
    }
    store(&descriptor, &value.encode(), transport).await
}

async fn store<T>(descriptor: &PropertyDescriptor, words: &[u16], transport: &mut T) -> Status
where
    T: Transport + ?Sized,
{
    match transport.write_registers(descriptor.offset, words).await {
        Ok(()) => Status::good(),
        Err(err) => {
            let status = Status::from(err);
            debug!("write {} failed: {}", descriptor.name, status);
            status
        }
    }
}

/// Parse `text` as the property's kind, write it, and on success store it on `object`.
pub async fn write_property_str<O, T>(object: &mut O, name: &str, text: &str, transport: &mut T) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    let descriptor = match lookup(object, name) {
        Ok(descriptor) => descriptor,
        Err(status) => return status,
    };
    if !descriptor.access.is_writable() {
        return Status::not_writable(name);
    }
    let value = match descriptor.kind.parse(text) {
        Ok(value) => value,
        Err(err) => return Status::from(err),
    };
    let status = store(&descriptor, &value.encode(), transport).await;
    if !status.is_good() {
        return status;
    }
    assign(object, &descriptor, value)
}

/// Read every readable property of the primary section.
pub async fn read_all<O, T>(object: &mut O, transport: &mut T, mode: ReadMode) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    read_section(object, PRIMARY_SECTION, transport, mode).await
}

/// Read every readable property of one section. Stops at the first failure.
pub async fn read_section<O, T>(object: &mut O, section: &str, transport: &mut T, mode: ReadMode) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    let registry: Registry = match object.catalog().section(section) {
        Some(registry) => registry.clone(),
        None => {
            return Status::new(StatusKind::NotFound, format!("no section named {}", section))
        }
    };

    let status = match mode {
        ReadMode::Strict => read_strict(object, &registry, transport).await,
        ReadMode::Block { max_block_size } => {
            read_blocks(object, &registry, transport, max_block_size).await
        }
    };
    if !status.is_good() {
        warn!("reading {} stopped: {}", section, status);
    }
    status
}

async fn read_strict<O, T>(object: &mut O, registry: &Registry, transport: &mut T) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    for descriptor in registry.readable() {
        let status = read_descriptor(object, descriptor, transport).await;
        if !status.is_good() {
            return status;
        }
    }
    Status::good()
}

async fn read_blocks<O, T>(object: &mut O, registry: &Registry, transport: &mut T, max_block_size: u16) -> Status
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
{
    for block in plan(registry.iter(), max_block_size) {
        let words = match fetch(transport, block.offset, block.length).await {
            Ok(words) => words,
            Err(status) => return status,
        };
        for member in &block.members {
            let status = match block.slice(member, &words) {
                Some(slice) => match decode(member, slice) {
                    Ok(value) => assign(object, member, value),
                    Err(status) => status,
                },
                None => Status::new(
                    StatusKind::InternalError,
                    format!("{} lies outside its block", member.name),
                ),
            };
            if !status.is_good() {
                return status;
            }
        }
    }
    Status::good()
}

/// Read the named properties in order. Soft failures are recorded and skipped.
pub async fn read_properties<O, T, S>(object: &mut O, names: &[S], transport: &mut T) -> Report
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
    S: AsRef<str> + Sync,
{
    let mut report = Report::default();
    for name in names {
        let name = name.as_ref();
        let status = read_property(object, name, transport).await;
        let hard = status.kind.is_hard();
        report.record(name, status);
        if hard {
            break;
        }
    }
    report
}

/// Write the named properties in order. Soft failures are recorded and skipped.
pub async fn write_properties<O, T, S>(object: &mut O, names: &[S], transport: &mut T) -> Report
where
    O: DataObject + ?Sized,
    T: Transport + ?Sized,
    S: AsRef<str> + Sync,
{
    let mut report = Report::default();
    for name in names {
        let name = name.as_ref();
        let status = write_property(object, name, transport).await;
        let hard = status.kind.is_hard();
        report.record(name, status);
        if hard {
            break;
        }
    }
    report
}
