// Domain model: controller configuration, device prototypes, and the
// inventory entities the engine reconciles against.

pub mod controller;
pub mod inventory;
pub mod prototype;

pub use controller::{Controller, ControllerKind, HostnamePatterns, RunStamp};
pub use inventory::{
    Device, DeviceType, Duplex, Interface, InterfaceTemplate, IpAddress, MacAddressRecord, Module,
    ModuleBay, ModuleBayTemplate, ModuleType, PortMode, Prefix, Role, Site, Tenant,
};
pub use prototype::{DevicePrototype, PositionedModule, SyncStatus, UnitReport};
