//! Inbound frame decoding.
//!
//! A frame is first parsed into a generic JSON object, the `CommandType` tag
//! is read, and only then are the type-specific fields decoded. This keeps
//! one bad payload from looking like a transport failure: the caller logs the
//! [`DecodeError`] and moves on to the next frame.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::types::{
    ClientsChanged, CommandType, DeviceList, Meta, ModeUpdated, Response, UpdateAck, ACTION,
    COMMAND_TYPE, MOBILE_INTERNAL_INDEX,
};
use crate::error::DecodeError;

/// Decode one text frame into a typed [`Response`].
///
/// # Errors
///
/// Returns a [`DecodeError`] if the frame is not a JSON object, carries an
/// unknown command type, or lacks a field its command type requires.
pub fn decode_response(frame: &str) -> Result<Response, DecodeError> {
    let fields: Map<String, Value> = serde_json::from_str(frame).map_err(DecodeError::Malformed)?;
    let envelope = Envelope {
        fields,
        command_type: "",
    };
    let meta = envelope.meta();
    let command_type: CommandType = meta.command_type.parse()?;
    let envelope = Envelope {
        command_type: command_type.as_str(),
        ..envelope
    };

    let response = match command_type {
        CommandType::DeviceList => Response::DeviceList(DeviceList {
            devices: envelope.nullable("Devices")?.unwrap_or_default(),
            meta,
        }),
        CommandType::DynamicIndexUpdated => Response::IndexUpdated(DeviceList {
            devices: envelope.nullable("Devices")?.unwrap_or_default(),
            meta,
        }),
        CommandType::DynamicAlmondModeUpdated => Response::ModeUpdated(ModeUpdated {
            mode: envelope.required("Mode")?,
            email_id: envelope.required("EmailId")?,
            meta,
        }),
        CommandType::UpdateDeviceIndex => Response::UpdateAck(UpdateAck {
            success: envelope.required("Success")?,
            meta,
        }),
        CommandType::DynamicClientAdded => Response::ClientAdded(ClientsChanged {
            clients: envelope.required("Clients")?,
            meta,
        }),
        CommandType::DynamicClientJoined => Response::ClientJoined(ClientsChanged {
            clients: envelope.required("Clients")?,
            meta,
        }),
        CommandType::DynamicClientLeft => Response::ClientLeft(ClientsChanged {
            clients: envelope.required("Clients")?,
            meta,
        }),
    };

    Ok(response)
}

/// A parsed frame whose payload fields have not been decoded yet.
struct Envelope {
    fields: Map<String, Value>,
    command_type: &'static str,
}

impl Envelope {
    fn meta(&self) -> Meta {
        Meta {
            correlation_id: self.string(MOBILE_INTERNAL_INDEX),
            command_type: self.string(COMMAND_TYPE),
            action: self.string(ACTION),
        }
    }

    /// Envelope fields that are not strings read as empty.
    fn string(&self, key: &str) -> String {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn required<T: DeserializeOwned>(&self, field: &'static str) -> Result<T, DecodeError> {
        let raw = self.fields.get(field).ok_or(DecodeError::MissingField {
            command_type: self.command_type,
            field,
        })?;
        self.parse(field, raw)
    }

    /// Required field that may be `null`, which decodes as `None`.
    fn nullable<T: DeserializeOwned>(&self, field: &'static str) -> Result<Option<T>, DecodeError> {
        self.required(field)
    }

    fn parse<T: DeserializeOwned>(&self, field: &'static str, raw: &Value) -> Result<T, DecodeError> {
        T::deserialize(raw).map_err(|source| DecodeError::InvalidField {
            command_type: self.command_type,
            field,
            source,
        })
    }
}
