pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};

pub use std::io::Write;
pub use tokio::sync::broadcast;

pub use crate::channels::{ChannelData, Channels};
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::options::Options;

pub use crate::dispatcher::{ReadMode, Report};
pub use crate::dynamic::DynamicObject;
pub use crate::endpoint::Endpoint;
pub use crate::error::{CodecError, Status, StatusKind};
pub use crate::registry::{Access, Catalog, DataObject, PropertyDescriptor, Registry};
pub use crate::sunspec::{RegisterCodec, Registers, ScaleFactor, Value, ValueKind};
pub use crate::transport::{Simulator, TcpTransport, Transport, TransportError};
