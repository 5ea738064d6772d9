#![allow(dead_code)]

pub use sunspec_bridge::prelude::*;
use sunspec_bridge::data_object;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

data_object! {
    /// Something like a pellet boiler. Registers 10-11 and 17-19 are unmapped.
    pub struct Boiler {
        "BoilerState" => boiler_state: Enum16 @ 0, ReadOnly;
        "SetPoint" => set_point: Int16 @ 1, ReadWrite;
        "Temperature" => temperature: Int16 @ 2, ReadOnly;
        "Temperature_SF" => temperature_sf: ScaleFactor @ 3, ReadOnly;
        "OperatingHours" => operating_hours: Acc32 @ 4, ReadOnly;
        "Faults" => faults: Bitfield32 @ 6, ReadOnly;
        "Address" => address: IpV4 @ 8, ReadWrite;
        "Energy" => energy: Acc64 @ 12, ReadOnly;
        "Reset" => reset: UInt16 @ 16, WriteOnly;
        "Serial" => serial: UInt64 @ 20, ReadOnly;
        "Gateway" => gateway: IpV6 @ 24, ReadOnly;
        "Mode" => mode: Enum32 @ 32, ReadWrite;
        "Power" => power: Int32 @ 34, ReadOnly;
        "Flags" => flags: Bitfield16 @ 36, ReadOnly;
        "Starts" => starts: Acc16 @ 37, ReadOnly;
        "Reserved" => reserved: Pad @ 38, ReadOnly;
        "Counter" => counter: UInt32 @ 39, ReadOnly;
        "Drift" => drift: Int64 @ 41, ReadOnly;
        "Hidden" => hidden: UInt16 @ 45, None;
    }
    views {
        "Setup" => ["SetPoint", "Address", "Mode"],
        "Status" => ["BoilerState", "Faults"],
    }
}

pub struct Factory;

impl Factory {
    /// Register contents matching `Boiler`.
    pub fn bank() -> Vec<(u16, Vec<u16>)> {
        vec![
            (0, vec![3]),
            (1, vec![650]),
            (2, vec![0xFF38]),
            (3, vec![0xFFFF]),
            (4, vec![0x0001, 0x0002]),
            (6, vec![0x0000, 0x0005]),
            (8, vec![0xC0A8, 0x0164]),
            (10, vec![0xDEAD, 0xBEEF]),
            (12, vec![0, 0, 0, 1234]),
            (20, vec![0, 0, 0x0001, 0x0000]),
            (24, vec![0xFE80, 0, 0, 0, 0, 0, 0, 0x0001]),
            (32, vec![0, 2]),
            (34, vec![0xFFFF, 0xFF9C]),
            (36, vec![0x8001]),
            (37, vec![0]),
            (38, vec![0x1234]),
            (39, vec![0xFFFF, 0xFFFF]),
            (41, vec![0x8000, 0, 0, 0]),
            (45, vec![7]),
        ]
    }

    pub fn simulator() -> Simulator {
        let simulator = Simulator::new();
        for (offset, words) in Self::bank() {
            simulator.load(offset, &words);
        }
        simulator
    }

    pub async fn connected_simulator() -> Simulator {
        let mut simulator = Self::simulator();
        simulator
            .connect()
            .await
            .expect("simulator always connects");
        simulator.clear_calls();
        simulator
    }

    /// The same map as `Boiler`, as a device would describe it in config.yaml.
    pub fn config_yaml() -> &'static str {
        r#"
loglevel: debug
devices:
  - name: boiler
    host: 127.0.0.1
    poll_interval: 1
    register_block_size: 20
    properties:
      - { name: BoilerState, offset: 0, type: enum16 }
      - { name: SetPoint, offset: 1, type: int16, access: rw }
      - { name: Temperature, offset: 2, type: int16 }
      - { name: Temperature_SF, offset: 3, type: sunssf }
      - { name: OperatingHours, offset: 4, type: acc32 }
      - { name: Faults, offset: 6, type: bitfield32 }
      - { name: Address, offset: 8, type: ipaddr, access: rw }
      - { name: Energy, offset: 12, type: acc64, length: 4 }
      - { name: Reset, offset: 16, type: uint16, access: w }
      - { name: Serial, offset: 20, type: uint64 }
      - { name: Gateway, offset: 24, type: ipv6addr }
      - { name: Mode, offset: 32, type: enum32, access: rw }
      - { name: Power, offset: 34, type: int32 }
      - { name: Flags, offset: 36, type: bitfield16 }
      - { name: Starts, offset: 37, type: acc16 }
      - { name: Reserved, offset: 38, type: pad }
      - { name: Counter, offset: 39, type: uint32 }
      - { name: Drift, offset: 41, type: int64 }
      - { name: Hidden, offset: 45, type: uint16, access: none }
    views:
      - { name: Setup, properties: [SetPoint, Address, Mode] }
  - name: spare
    enabled: false
    host: 127.0.0.2
"#
    }

    pub fn config() -> ConfigWrapper {
        ConfigWrapper::from_config(Config::from_yaml(Self::config_yaml()).expect("valid config"))
    }

    pub fn dynamic_boiler() -> DynamicObject {
        let device = Self::config()
            .device_with_name("boiler")
            .expect("boiler is configured");
        DynamicObject::new(device.catalog().expect("valid register map"))
    }

    /// Offsets of every read issued, in order.
    pub fn read_offsets(calls: &[Call]) -> Vec<u16> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Read { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect()
    }
}

pub use sunspec_bridge::transport::{Call, Fault};
