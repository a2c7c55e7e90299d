//! Request and response shapes.
//!
//! Every frame on the wire is a flat JSON object sharing one envelope
//! ([`Meta`]) plus variant-specific fields. Requests are serialized from
//! [`Request`]; responses are decoded into [`Response`] by
//! [`super::decode_response`] and re-serialized unchanged for consumers that
//! republish them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Wire name of the action field.
pub const ACTION: &str = "Action";
/// Wire name of the command-type tag.
pub const COMMAND_TYPE: &str = "CommandType";
/// Wire name of the correlation id.
pub const MOBILE_INTERNAL_INDEX: &str = "MobileInternalIndex";

/// Envelope fields shared by every request and response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    /// Correlation id, echoed by the hub in the matching response.
    #[serde(rename = "MobileInternalIndex", skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    /// Command-type tag.
    #[serde(rename = "CommandType", skip_serializing_if = "String::is_empty")]
    pub command_type: String,
    /// Action reported by the hub (e.g. `"update"`), empty on requests.
    #[serde(rename = "Action", skip_serializing_if = "String::is_empty")]
    pub action: String,
}

impl Meta {
    fn for_command(command_type: CommandType) -> Self {
        Self {
            command_type: command_type.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// The closed set of command types the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandType {
    /// Full device snapshot.
    DeviceList,
    /// One or more device values changed.
    DynamicIndexUpdated,
    /// The hub's mode (home/away) changed.
    DynamicAlmondModeUpdated,
    /// Acknowledgement of an update request.
    UpdateDeviceIndex,
    /// A network client was added.
    DynamicClientAdded,
    /// A network client joined.
    DynamicClientJoined,
    /// A network client left.
    DynamicClientLeft,
}

impl CommandType {
    /// Every known command type.
    pub const ALL: [Self; 7] = [
        Self::DeviceList,
        Self::DynamicIndexUpdated,
        Self::DynamicAlmondModeUpdated,
        Self::UpdateDeviceIndex,
        Self::DynamicClientAdded,
        Self::DynamicClientJoined,
        Self::DynamicClientLeft,
    ];

    /// Wire name of this command type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeviceList => "DeviceList",
            Self::DynamicIndexUpdated => "DynamicIndexUpdated",
            Self::DynamicAlmondModeUpdated => "DynamicAlmondModeUpdated",
            Self::UpdateDeviceIndex => "UpdateDeviceIndex",
            Self::DynamicClientAdded => "DynamicClientAdded",
            Self::DynamicClientJoined => "DynamicClientJoined",
            Self::DynamicClientLeft => "DynamicClientLeft",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| DecodeError::UnsupportedCommandType(s.to_string()))
    }
}

/// Point-in-time record of one hub-managed device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Flat attributes: `ID`, `Name`, `FriendlyDeviceType`, `Location`, ...
    #[serde(rename = "Data", default)]
    pub data: HashMap<String, String>,
    /// Current values keyed by value index.
    #[serde(rename = "DeviceValues", default)]
    pub values: BTreeMap<String, DeviceValue>,
}

impl Device {
    /// Look up a flat attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attribute("Name")
    }

    /// Room or location label.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.attribute("Location")
    }

    /// Device kind, e.g. `MultilevelSwitch` or `DoorLock`.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.attribute("FriendlyDeviceType")
    }

    /// Index of the value with the given name.
    #[must_use]
    pub fn value_index(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(index, _)| index.as_str())
    }
}

/// A named current value of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceValue {
    /// Value name, e.g. `SWITCH MULTILEVEL`.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Current value as sent by the hub.
    #[serde(rename = "Value", default)]
    pub value: String,
}

/// Device map carried by `DeviceList` and `DynamicIndexUpdated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceList {
    /// Envelope.
    #[serde(flatten)]
    pub meta: Meta,
    /// Devices keyed by hub id.
    #[serde(rename = "Devices")]
    pub devices: BTreeMap<String, Device>,
}

/// Payload of `DynamicAlmondModeUpdated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeUpdated {
    /// Envelope.
    #[serde(flatten)]
    pub meta: Meta,
    /// New mode.
    #[serde(rename = "Mode")]
    pub mode: String,
    /// Account that changed it.
    #[serde(rename = "EmailId")]
    pub email_id: String,
}

/// Acknowledgement of an `UpdateDeviceIndex` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateAck {
    /// Envelope.
    #[serde(flatten)]
    pub meta: Meta,
    /// `"true"` when the hub applied the update.
    #[serde(rename = "Success")]
    pub success: String,
}

impl UpdateAck {
    /// Whether the hub reported success.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success.eq_ignore_ascii_case("true")
    }
}

/// Payload of the three client-membership events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientsChanged {
    /// Envelope.
    #[serde(flatten)]
    pub meta: Meta,
    /// Client records exactly as sent by the hub.
    #[serde(rename = "Clients")]
    pub clients: serde_json::Value,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `DeviceList`.
    DeviceList(DeviceList),
    /// `DynamicIndexUpdated`.
    IndexUpdated(DeviceList),
    /// `DynamicAlmondModeUpdated`.
    ModeUpdated(ModeUpdated),
    /// `UpdateDeviceIndex`.
    UpdateAck(UpdateAck),
    /// `DynamicClientAdded`.
    ClientAdded(ClientsChanged),
    /// `DynamicClientJoined`.
    ClientJoined(ClientsChanged),
    /// `DynamicClientLeft`.
    ClientLeft(ClientsChanged),
}

impl Response {
    /// Envelope of this response.
    #[must_use]
    pub fn meta(&self) -> &Meta {
        match self {
            Self::DeviceList(r) | Self::IndexUpdated(r) => &r.meta,
            Self::ModeUpdated(r) => &r.meta,
            Self::UpdateAck(r) => &r.meta,
            Self::ClientAdded(r) | Self::ClientJoined(r) | Self::ClientLeft(r) => &r.meta,
        }
    }

    /// Command type this response was decoded as.
    #[must_use]
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::DeviceList(_) => CommandType::DeviceList,
            Self::IndexUpdated(_) => CommandType::DynamicIndexUpdated,
            Self::ModeUpdated(_) => CommandType::DynamicAlmondModeUpdated,
            Self::UpdateAck(_) => CommandType::UpdateDeviceIndex,
            Self::ClientAdded(_) => CommandType::DynamicClientAdded,
            Self::ClientJoined(_) => CommandType::DynamicClientJoined,
            Self::ClientLeft(_) => CommandType::DynamicClientLeft,
        }
    }

    /// Correlation id echoed by the hub; empty for unsolicited events.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.meta().correlation_id
    }

    /// Action reported by the hub.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.meta().action
    }
}

/// Body of an `UpdateDeviceIndex` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateDeviceIndex {
    /// Envelope.
    #[serde(flatten)]
    pub meta: Meta,
    /// Target device id.
    #[serde(rename = "ID")]
    pub id: String,
    /// Value index on that device.
    #[serde(rename = "Index")]
    pub index: String,
    /// New value, already in the hub's encoding.
    #[serde(rename = "Value")]
    pub value: String,
}

/// An outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Request {
    /// Ask for a full `DeviceList` snapshot.
    DeviceList(Meta),
    /// Change one value of one device.
    UpdateDeviceIndex(UpdateDeviceIndex),
}

impl Request {
    /// Request the full device list.
    #[must_use]
    pub fn device_list() -> Self {
        Self::DeviceList(Meta::for_command(CommandType::DeviceList))
    }

    /// Set value `index` of device `id` to `value`.
    #[must_use]
    pub fn update_device_index(
        id: impl Into<String>,
        index: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UpdateDeviceIndex(UpdateDeviceIndex {
            meta: Meta::for_command(CommandType::UpdateDeviceIndex),
            id: id.into(),
            index: index.into(),
            value: value.into(),
        })
    }

    /// Command type of this request.
    #[must_use]
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::DeviceList(_) => CommandType::DeviceList,
            Self::UpdateDeviceIndex(_) => CommandType::UpdateDeviceIndex,
        }
    }

    /// Correlation id, empty until the client stamps it.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.meta().correlation_id
    }

    fn meta(&self) -> &Meta {
        match self {
            Self::DeviceList(meta) => meta,
            Self::UpdateDeviceIndex(r) => &r.meta,
        }
    }

    pub(crate) fn set_correlation_id(&mut self, id: &str) {
        let meta = match self {
            Self::DeviceList(meta) => meta,
            Self::UpdateDeviceIndex(r) => &mut r.meta,
        };
        meta.correlation_id = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_type_round_trips_wire_names() {
        for ct in CommandType::ALL {
            assert_eq!(ct.as_str().parse::<CommandType>().unwrap(), ct);
        }
        assert!(matches!(
            "Bogus".parse::<CommandType>(),
            Err(DecodeError::UnsupportedCommandType(s)) if s == "Bogus"
        ));
    }

    #[test]
    fn test_update_request_wire_shape() {
        let mut request = Request::update_device_index("dev1", "1", "100");
        request.set_correlation_id("7");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "MobileInternalIndex": "7",
                "CommandType": "UpdateDeviceIndex",
                "ID": "dev1",
                "Index": "1",
                "Value": "100"
            })
        );
    }

    #[test]
    fn test_device_list_request_omits_empty_fields() {
        let json = serde_json::to_value(Request::device_list()).unwrap();
        assert_eq!(json, serde_json::json!({ "CommandType": "DeviceList" }));
    }

    #[test]
    fn test_update_ack_success_flag() {
        let ack = UpdateAck {
            success: "true".to_string(),
            ..UpdateAck::default()
        };
        assert!(ack.succeeded());

        let nack = UpdateAck {
            success: "false".to_string(),
            ..UpdateAck::default()
        };
        assert!(!nack.succeeded());
    }

    #[test]
    fn test_device_value_index_by_name() {
        let mut device = Device::default();
        device.values.insert(
            "1".to_string(),
            DeviceValue {
                name: "SWITCH BINARY".to_string(),
                value: "true".to_string(),
            },
        );
        device.values.insert(
            "2".to_string(),
            DeviceValue {
                name: "BATTERY".to_string(),
                value: "88".to_string(),
            },
        );

        assert_eq!(device.value_index("BATTERY"), Some("2"));
        assert_eq!(device.value_index("TEMPERATURE"), None);
    }
}
