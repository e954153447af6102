//! Reactive mirror of remote devices and their typed properties.

mod catalog;
pub mod device;
pub mod property;
pub mod rest;

pub use catalog::{CommandOptions, DeviceCatalog};
pub use device::{CommandInfo, Device, DeviceInterface};
pub use property::{Access, PropertyInfo, PropertyModel, PropertyModelData};
