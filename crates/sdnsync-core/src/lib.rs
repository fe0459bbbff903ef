// sdnsync-core: domain model and reconciliation engine between a
// controller source (sdnsync-api) and an inventory repository.

pub mod context;
pub mod engine;
pub mod error;
pub mod ifname;
pub mod model;
pub mod net;
pub mod report;
pub mod repository;
pub mod source;
pub mod store;

mod import;
mod matching;
mod positions;
mod remap;
mod split;
mod sync;
mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use engine::SyncEngine;
pub use error::CoreError;
pub use report::{CollectingReporter, Reporter, RunReport, StatusSummary, TracingReporter};
pub use repository::{ChangeAction, ChangeEntry, InventoryRepository};
pub use source::ControllerSource;
pub use store::MemoryRepository;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Controller configuration
    Controller, ControllerKind, HostnamePatterns, RunStamp,
    // Prototypes
    DevicePrototype, PositionedModule, SyncStatus, UnitReport,
    // Inventory entities
    Device, DeviceType, Duplex, Interface, InterfaceTemplate, IpAddress, MacAddressRecord,
    Module, ModuleBay, ModuleBayTemplate, ModuleType, PortMode, Prefix, Role, Site, Tenant,
};
