//! Almond wire protocol: request/response types and frame decoding.

mod decode;
pub mod types;

pub use decode::decode_response;
pub use types::{
    ClientsChanged, CommandType, Device, DeviceList, DeviceValue, Meta, ModeUpdated, Request,
    Response, UpdateAck, UpdateDeviceIndex,
};
