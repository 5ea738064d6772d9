mod common;
use common::*;

use sunspec_bridge::registry::{RegistryError, PRIMARY_SECTION};

#[test]
fn lookups_are_total() {
    common_setup();

    let boiler = Boiler::default();
    let catalog = boiler.catalog();

    assert!(catalog.is_property("SetPoint"));
    assert!(catalog.is_writable("SetPoint"));
    assert!(catalog.is_readable("SetPoint"));
    assert!(catalog.is_property("BoilerState"));
    assert!(!catalog.is_writable("BoilerState"));
    assert!(!catalog.is_property("Pressure"));
    assert!(!catalog.is_readable("Pressure"));

    assert!(catalog.is_writable("Reset"));
    assert!(!catalog.is_readable("Reset"));
    assert!(catalog.is_property("Hidden"));
    assert!(!catalog.is_readable("Hidden"));
    assert!(!catalog.is_writable("Hidden"));
}

#[test]
fn descriptors_follow_the_declaration() {
    let catalog = Boiler::static_catalog();
    let primary = catalog.primary();

    assert_eq!(primary.len(), 19);
    let energy = primary.describe("Energy").unwrap();
    assert_eq!(energy.offset, 12);
    assert_eq!(energy.length, 4);
    assert_eq!(energy.kind, ValueKind::Acc64);
    assert_eq!(energy.access, Access::ReadOnly);

    let names: Vec<_> = primary.iter().take(3).map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["BoilerState", "SetPoint", "Temperature"]);
    assert_eq!(primary.readable().count(), 17);
}

#[test]
fn catalog_is_built_once() {
    let a = Boiler::default();
    let b = Boiler::default();
    assert!(std::ptr::eq(a.catalog(), b.catalog()));
}

#[test]
fn qualified_names() {
    let catalog = Boiler::static_catalog();

    assert_eq!(
        catalog.section_names().collect::<Vec<_>>(),
        vec![PRIMARY_SECTION, "Setup", "Status"]
    );
    assert_eq!(
        catalog.describe("Data.BoilerState"),
        catalog.describe("BoilerState")
    );
    assert!(catalog.is_writable("Setup.Address"));
    assert!(catalog.is_property("Status.Faults"));
    // views only expose their own members
    assert!(!catalog.is_property("Setup.BoilerState"));
    assert!(!catalog.is_property("Boiler.BoilerState"));

    let setup = catalog.section("Setup").unwrap();
    let offsets: Vec<_> = setup.iter().map(|d| d.offset).collect();
    assert_eq!(offsets, vec![1, 8, 32]);
}

#[test]
fn field_access_by_name() {
    let mut boiler = Boiler::default();
    assert_eq!(
        boiler.get_field("SetPoint"),
        Some(Value::from(sunspec_bridge::sunspec::Int16::default()))
    );

    boiler
        .set_field("SetPoint", sunspec_bridge::sunspec::Int16::new(600).into())
        .unwrap();
    assert_eq!(boiler.set_point.value(), Some(600));

    let wrong = boiler.set_field("SetPoint", sunspec_bridge::sunspec::UInt16::new(1).into());
    assert_eq!(wrong, Err(CodecError::KindMismatch("int16", "uint16")));
    assert!(boiler.set_field("Pressure", Value::from(ScaleFactor::Zero)).is_err());
    assert_eq!(boiler.get_field("Pressure"), None);
}

#[test]
fn dynamic_objects_share_the_contract() {
    let boiler = Factory::dynamic_boiler();
    let catalog = boiler.catalog();
    let fixed = Boiler::static_catalog();

    for descriptor in fixed.primary().iter() {
        assert_eq!(catalog.describe(&descriptor.name), Some(descriptor));
    }
    assert!(catalog.is_writable("Setup.Mode"));
    assert!(catalog.section("Status").is_none());
}

#[test]
fn broken_maps_are_refused() {
    let err = Registry::new(vec![
        PropertyDescriptor::new("A", 100, Access::ReadWrite, ValueKind::UInt64),
        PropertyDescriptor::new("B", 103, Access::ReadOnly, ValueKind::UInt16),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Overlap {
            first: "A".into(),
            second: "B".into()
        }
    );
    assert_eq!(err.to_string(), "property B overlaps A");
}
