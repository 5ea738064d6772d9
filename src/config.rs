use crate::prelude::*;

use crate::dispatcher::{ReadMode, DEFAULT_BLOCK_SIZE, MODBUS_MAX_READ};
use crate::registry::{Access, Catalog, PropertyDescriptor, Registry};
use crate::sunspec::ValueKind;
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "Vec::new")]
    pub devices: Vec<Device>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// Optional path to append decoded snapshots to, one JSON object per line
    pub datalog_file: Option<String>,
}

// Device {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub name: String,
    pub host: String,
    #[serde(default = "Config::default_modbus_port")]
    pub port: u16,

    pub unit_id: Option<u8>,
    pub read_timeout: Option<u64>,
    pub poll_interval: Option<u64>,
    pub block_read: Option<bool>,
    pub register_block_size: Option<u16>,
    pub keep_connected: Option<bool>,

    #[serde(default = "Vec::new")]
    pub properties: Vec<Property>,
    #[serde(default = "Vec::new")]
    pub views: Vec<View>,
}
impl Device {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id.unwrap_or(1)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout.unwrap_or(5))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(60))
    }

    pub fn block_read(&self) -> bool {
        self.block_read.unwrap_or(true)
    }

    pub fn register_block_size(&self) -> u16 {
        self.register_block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    pub fn keep_connected(&self) -> bool {
        self.keep_connected == Some(true)
    }

    pub fn read_mode(&self) -> ReadMode {
        if self.block_read() {
            ReadMode::block(self.register_block_size())
        } else {
            ReadMode::Strict
        }
    }

    /// Build the register map described by `properties` and `views`.
    pub fn catalog(&self) -> Result<Catalog> {
        let descriptors = self
            .properties
            .iter()
            .map(Property::descriptor)
            .collect::<Vec<_>>();
        let registry = Registry::new(descriptors)
            .map_err(|err| anyhow!("device {}: {}", self.name, err))?;

        let mut catalog = Catalog::new(registry);
        for view in &self.views {
            catalog = catalog
                .with_view(&view.name, &view.properties)
                .map_err(|err| anyhow!("device {}: {}", self.name, err))?;
        }
        Ok(catalog)
    }
} // }}}

// Property {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Property {
    pub name: String,
    pub offset: u16,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    /// Checked against the type when given
    pub length: Option<u16>,
    #[serde(default = "Config::default_access")]
    pub access: Access,
}
impl Property {
    fn descriptor(&self) -> PropertyDescriptor {
        let mut descriptor = PropertyDescriptor::new(&self.name, self.offset, self.access, self.kind);
        if let Some(length) = self.length {
            descriptor.length = length;
        }
        descriptor
    }
} // }}}

// View {{{
#[derive(Clone, Debug, Deserialize)]
pub struct View {
    pub name: String,
    pub properties: Vec<String>,
} // }}}

pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        let config = Config::new(file)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn devices(&self) -> Vec<Device> {
        self.lock().devices.clone()
    }

    pub fn set_devices(&self, new: Vec<Device>) {
        self.lock().devices = new;
    }

    pub fn enabled_devices(&self) -> Vec<Device> {
        self.devices().into_iter().filter(|d| d.enabled()).collect()
    }

    pub fn device_with_name(&self, name: &str) -> Option<Device> {
        self.devices().into_iter().find(|d| d.name() == name)
    }

    pub fn loglevel(&self) -> String {
        self.lock().loglevel.clone()
    }

    pub fn datalog_file(&self) -> Option<String> {
        self.lock().datalog_file.clone()
    }

    pub fn log_summary(&self) {
        self.lock().log_summary()
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;
        Self::from_yaml(&content).map_err(|err| anyhow!("{}: {}", file, err))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Devices: {} configured, {} enabled",
            self.devices.len(),
            self.devices.iter().filter(|d| d.enabled).count()
        );
        for (i, device) in self.devices.iter().enumerate() {
            info!("    Device[{}]: {}", i, device.name);
            info!("      Enabled: {}", device.enabled);
            info!("      Host: {}:{}", device.host, device.port);
            info!("      Unit ID: {}", device.unit_id());
            info!("      Read Timeout: {}s", device.read_timeout().as_secs());
            info!("      Poll Interval: {}s", device.poll_interval().as_secs());
            info!("      Read Mode: {:?}", device.read_mode());
            info!("      Keep Connected: {}", device.keep_connected());
            info!(
                "      Properties: {} ({} views)",
                device.properties.len(),
                device.views.len()
            );
        }
        info!(
            "  Datalog File: {}",
            self.datalog_file.as_deref().unwrap_or("disabled")
        );
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();

        for (i, device) in self.devices.iter().enumerate() {
            if !names.insert(device.name.as_str()) {
                bail!("device[{}]: name {} is used twice", i, device.name);
            }
            if !device.enabled {
                continue;
            }
            if device.host.is_empty() {
                bail!("device[{}].host cannot be empty", i);
            }
            if device.port == 0 {
                bail!("device[{}].port must be between 1 and 65535", i);
            }
            if device.read_timeout.unwrap_or(5) == 0 {
                bail!("device[{}].read_timeout cannot be 0", i);
            }
            if device.poll_interval.unwrap_or(60) == 0 {
                bail!("device[{}].poll_interval cannot be 0", i);
            }
            let block_size = device.register_block_size();
            if block_size == 0 || block_size > MODBUS_MAX_READ {
                bail!(
                    "device[{}].register_block_size must be between 1 and {}",
                    i,
                    MODBUS_MAX_READ
                );
            }
            device.catalog()?;
        }

        Ok(())
    }

    fn default_modbus_port() -> u16 {
        502
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_access() -> Access {
        Access::ReadOnly
    }
}
