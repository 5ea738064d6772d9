//! Property metadata: which registers back which named field.
//!
//! A [`Registry`] is built once per domain type and never changes after.
//! A [`Catalog`] groups the full registry with filtered views of it so that
//! callers can address properties as `"Section.Property"`.

use crate::error::CodecError;
use crate::sunspec::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Name of the section holding every property of a data object.
pub const PRIMARY_SECTION: &str = "Data";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    None,
    #[serde(alias = "r", alias = "R")]
    ReadOnly,
    #[serde(alias = "w", alias = "W")]
    WriteOnly,
    #[serde(alias = "rw", alias = "RW")]
    ReadWrite,
}

impl Access {
    pub fn is_readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub offset: u16,
    pub length: u16,
    pub access: Access,
    pub kind: ValueKind,
}

impl PropertyDescriptor {
    /// Length is taken from the value kind.
    pub fn new(name: impl Into<String>, offset: u16, access: Access, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            offset,
            length: kind.length() as u16,
            access,
            kind,
        }
    }

    /// One past the last register, widened so it can't wrap.
    pub fn end(&self) -> u32 {
        u32::from(self.offset) + u32::from(self.length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("property {0} declared twice")]
    Duplicate(String),

    #[error("property {name} is {length} registers long but {kind} needs {expected}")]
    LengthMismatch {
        name: String,
        length: u16,
        kind: ValueKind,
        expected: usize,
    },

    #[error("property {second} overlaps {first}")]
    Overlap { first: String, second: String },

    #[error("property {0} runs past register 65535")]
    AddressOverflow(String),

    #[error("section {section} refers to unknown property {name}")]
    UnknownProperty { section: String, name: String },

    #[error("section {0} declared twice")]
    DuplicateSection(String),

    #[error("{0:?} is not a usable name: names must be non-empty and contain no '.'")]
    BadName(String),
}

/// Names are addressed as `Section.Property`, so neither part may hold a dot.
fn check_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() || name.contains('.') {
        return Err(RegistryError::BadName(name.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    descriptors: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new(descriptors: Vec<PropertyDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(descriptors.len());

        for (position, descriptor) in descriptors.iter().enumerate() {
            check_name(&descriptor.name)?;
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(RegistryError::Duplicate(descriptor.name.clone()));
            }
            if usize::from(descriptor.length) != descriptor.kind.length() {
                return Err(RegistryError::LengthMismatch {
                    name: descriptor.name.clone(),
                    length: descriptor.length,
                    kind: descriptor.kind,
                    expected: descriptor.kind.length(),
                });
            }
            if descriptor.end() > 0x1_0000 {
                return Err(RegistryError::AddressOverflow(descriptor.name.clone()));
            }
        }

        let mut by_offset: Vec<&PropertyDescriptor> = descriptors.iter().collect();
        by_offset.sort_by_key(|d| d.offset);
        for pair in by_offset.windows(2) {
            if u32::from(pair[1].offset) < pair[0].end() {
                return Err(RegistryError::Overlap {
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        Ok(Self { descriptors, index })
    }

    pub fn describe(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Declaration order position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_readable(&self, name: &str) -> bool {
        self.describe(name).is_some_and(|d| d.access.is_readable())
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.describe(name).is_some_and(|d| d.access.is_writable())
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }

    pub fn readable(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.iter().filter(|d| d.access.is_readable())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// A registry restricted to `names`, kept in this registry's order.
    pub fn view<S: AsRef<str>>(&self, section: &str, names: &[S]) -> Result<Self, RegistryError> {
        for name in names {
            if !self.is_property(name.as_ref()) {
                return Err(RegistryError::UnknownProperty {
                    section: section.to_string(),
                    name: name.as_ref().to_string(),
                });
            }
        }
        let descriptors = self
            .iter()
            .filter(|d| names.iter().any(|n| n.as_ref() == d.name))
            .cloned()
            .collect();
        Self::new(descriptors)
    }
}

/// A property name, optionally qualified with a section: `Data.BoilerState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    pub section: Option<&'a str>,
    pub property: &'a str,
}

impl<'a> QualifiedName<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name.split_once('.') {
            Some((section, property)) => Self {
                section: Some(section),
                property,
            },
            None => Self {
                section: None,
                property: name,
            },
        }
    }
}

/// The primary registry plus any named views over it.
#[derive(Clone, Debug)]
pub struct Catalog {
    sections: Vec<(String, Registry)>,
}

impl Catalog {
    pub fn new(primary: Registry) -> Self {
        Self {
            sections: vec![(PRIMARY_SECTION.to_string(), primary)],
        }
    }

    pub fn with_view<S: AsRef<str>>(mut self, section: &str, names: &[S]) -> Result<Self, RegistryError> {
        check_name(section)?;
        if self.section(section).is_some() {
            return Err(RegistryError::DuplicateSection(section.to_string()));
        }
        let view = self.primary().view(section, names)?;
        self.sections.push((section.to_string(), view));
        Ok(self)
    }

    pub fn primary(&self) -> &Registry {
        &self.sections[0].1
    }

    pub fn section(&self, name: &str) -> Option<&Registry> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, registry)| registry)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    /// Resolve a bare or qualified name. Bare names live in the primary section.
    pub fn describe(&self, name: &str) -> Option<&PropertyDescriptor> {
        let name = QualifiedName::parse(name);
        let registry = match name.section {
            Some(section) => self.section(section)?,
            None => self.primary(),
        };
        registry.describe(name.property)
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.describe(name).is_some()
    }

    pub fn is_readable(&self, name: &str) -> bool {
        self.describe(name).is_some_and(|d| d.access.is_readable())
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.describe(name).is_some_and(|d| d.access.is_writable())
    }
}

/// By-name access to a domain record's fields.
///
/// Names handed to `get_field`/`set_field` are always bare property names
/// as they appear in the primary registry.
pub trait DataObject {
    fn catalog(&self) -> &Catalog;
    fn get_field(&self, name: &str) -> Option<Value>;
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), CodecError>;
}

/// Declare a domain record backed by a fixed register map.
///
/// ```ignore
/// data_object! {
///     pub struct Boiler {
///         "BoilerState" => boiler_state: Enum16 @ 0, ReadOnly;
///         "SetPoint" => set_point: Int16 @ 1, ReadWrite;
///     }
///     views {
///         "Setup" => ["SetPoint"],
///     }
/// }
/// ```
///
/// Field types are the codec types in [`crate::sunspec`]. The catalog is
/// built on first use and shared by every instance.
#[macro_export]
macro_rules! data_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $property:literal => $field:ident : $ty:ident @ $offset:literal, $access:ident;
            )*
        }
        $(
            views {
                $( $view:literal => [ $( $member:literal ),* $(,)? ] ),* $(,)?
            }
        )?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $crate::sunspec::$ty,
            )*
        }

        impl $name {
            pub fn static_catalog() -> &'static $crate::registry::Catalog {
                static CATALOG: ::std::sync::OnceLock<$crate::registry::Catalog> =
                    ::std::sync::OnceLock::new();

                CATALOG.get_or_init(|| {
                    let build = || -> ::std::result::Result<
                        $crate::registry::Catalog,
                        $crate::registry::RegistryError,
                    > {
                        let registry = $crate::registry::Registry::new(vec![
                            $(
                                $crate::registry::PropertyDescriptor::new(
                                    $property,
                                    $offset,
                                    $crate::registry::Access::$access,
                                    <$crate::sunspec::$ty as $crate::sunspec::RegisterCodec>::KIND,
                                ),
                            )*
                        ])?;
                        #[allow(unused_mut)]
                        let mut catalog = $crate::registry::Catalog::new(registry);
                        $($(
                            catalog = catalog.with_view($view, &[$($member),*] as &[&str])?;
                        )*)?
                        Ok(catalog)
                    };
                    build().unwrap_or_else(|err| {
                        panic!("invalid register map for {}: {}", stringify!($name), err)
                    })
                })
            }
        }

        impl $crate::registry::DataObject for $name {
            fn catalog(&self) -> &$crate::registry::Catalog {
                Self::static_catalog()
            }

            fn get_field(&self, name: &str) -> Option<$crate::sunspec::Value> {
                match name {
                    $( $property => Some(self.$field.into()), )*
                    _ => None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::sunspec::Value,
            ) -> ::std::result::Result<(), $crate::error::CodecError> {
                match name {
                    $(
                        $property => {
                            self.$field = <$crate::sunspec::$ty as $crate::sunspec::RegisterCodec>::from_value(value)
                                .ok_or_else(|| $crate::error::CodecError::KindMismatch(
                                    <$crate::sunspec::$ty as $crate::sunspec::RegisterCodec>::KIND.name(),
                                    $crate::sunspec::Registers::kind(&value).name(),
                                ))?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::CodecError::InvalidArgument(format!(
                        "{} has no field {}",
                        stringify!($name),
                        name
                    ))),
                }
            }
        }
    };
}
