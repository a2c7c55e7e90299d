//! Device lookup and value encoding.
//!
//! Consumers address devices by human-readable resource paths
//! (`name`, `name/location`, or `location/name/value-name`) rather than by the
//! hub's numeric ids. [`DeviceDirectory`] keeps the most recent `DeviceList`
//! snapshot and resolves those paths to a [`DeviceTarget`].

use std::collections::BTreeMap;

use crate::error::LookupError;
use crate::protocol::{Device, DeviceList};

/// Value index used when the resource path does not name a value.
pub const DEFAULT_VALUE_INDEX: &str = "1";

/// Parsed resource path. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Device `Name`.
    pub name: String,
    /// Device `Location`.
    pub location: String,
    /// Device `FriendlyDeviceType`.
    pub kind: String,
    /// Name of the value to address, e.g. `SWITCH BINARY`.
    pub value_name: String,
}

impl DeviceQuery {
    /// Parse `name`, `name/location` or `location/name/value-name`.
    pub fn parse(resource: &str) -> Result<Self, LookupError> {
        let parts: Vec<&str> = resource.split('/').collect();
        let query = match parts.as_slice() {
            [name] => Self {
                name: (*name).to_string(),
                ..Self::default()
            },
            [name, location] => Self {
                name: (*name).to_string(),
                location: (*location).to_string(),
                ..Self::default()
            },
            [location, name, value_name] => Self {
                name: (*name).to_string(),
                location: (*location).to_string(),
                value_name: (*value_name).to_string(),
                ..Self::default()
            },
            _ => return Err(LookupError::InvalidResource(resource.to_string())),
        };
        Ok(query)
    }

    fn matches(&self, device: &Device) -> bool {
        fn field_matches(wanted: &str, actual: Option<&str>) -> bool {
            wanted.is_empty() || actual == Some(wanted)
        }

        field_matches(&self.name, device.name())
            && field_matches(&self.location, device.location())
            && field_matches(&self.kind, device.kind())
    }
}

/// Where an update should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    /// Hub-assigned device id.
    pub id: String,
    /// Value index on the device.
    pub index: String,
    /// Device kind, used to pick a value encoding.
    pub kind: String,
}

/// Latest device snapshot, replaced wholesale on every update.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: BTreeMap<String, Device>,
}

impl DeviceDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `list`.
    pub fn update(&mut self, list: &DeviceList) {
        self.devices.clone_from(&list.devices);
        log::debug!("[Directory] Snapshot now has {} device(s)", self.devices.len());
    }

    /// Device with hub id `id`.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// All devices, ordered by id.
    pub fn devices(&self) -> impl Iterator<Item = (&str, &Device)> {
        self.devices.iter().map(|(id, device)| (id.as_str(), device))
    }

    /// Number of devices in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// First device (lowest id) matching `query`.
    #[must_use]
    pub fn find(&self, query: &DeviceQuery) -> Option<DeviceTarget> {
        self.devices.iter().find_map(|(key, device)| {
            if !query.matches(device) {
                return None;
            }
            let index = if query.value_name.is_empty() {
                DEFAULT_VALUE_INDEX
            } else {
                device.value_index(&query.value_name)?
            };
            Some(DeviceTarget {
                id: device.attribute("ID").unwrap_or(key).to_string(),
                index: index.to_string(),
                kind: device.kind().unwrap_or_default().to_string(),
            })
        })
    }

    /// Parse `resource` and resolve it.
    pub fn resolve(&self, resource: &str) -> Result<DeviceTarget, LookupError> {
        let query = DeviceQuery::parse(resource)?;
        self.find(&query)
            .ok_or_else(|| LookupError::DeviceNotFound(resource.to_string()))
    }
}

/// Translate a friendly value into the hub's encoding for devices of `kind`.
///
/// Unknown kinds and values pass through unchanged.
#[must_use]
pub fn encode_value(kind: &str, data: &str) -> String {
    let encoded = match (kind, data) {
        ("MultilevelSwitch", "on") => "100",
        ("MultilevelSwitch", "off") => "0",
        ("DoorLock", "lock" | "close") => "255",
        ("DoorLock", "unlock" | "open") => "0",
        _ => data,
    };
    encoded.to_string()
}
