// ── Inventory repository ──
//
// Storage seam for the asset-of-record inventory. The engine never
// touches a backend directly; everything goes through this trait so
// the same pipeline runs against the bundled in-memory store or an
// embedder's database adapter.
//
// Lookup semantics are part of the contract: methods say whether a
// match is exact, case-insensitive, or substring, and the matching
// cascade depends on those distinctions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{
    Controller, Device, DevicePrototype, DeviceType, Interface, InterfaceTemplate, IpAddress,
    MacAddressRecord, Module, ModuleBay, ModuleType, Prefix, Role, Site,
};

// ── Change log ──────────────────────────────────────────────────────

/// What happened to an inventory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// One attributed change-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub action: ChangeAction,
    pub object_type: String,
    pub object_id: Uuid,
    /// Human-readable label of the object at change time.
    pub object_label: String,
    pub user: String,
    pub time: DateTime<Utc>,
}

impl ChangeEntry {
    pub fn new(action: ChangeAction, object_type: &str, object_id: Uuid, label: &str, user: &str) -> Self {
        Self {
            action,
            object_type: object_type.to_owned(),
            object_id,
            object_label: label.to_owned(),
            user: user.to_owned(),
            time: Utc::now(),
        }
    }
}

// ── Repository trait ────────────────────────────────────────────────

/// CRUD plus the filtered queries the reconciliation pipeline needs.
///
/// `create_*` and `save_*` are split because creation has side
/// effects: creating a device or module materializes interface and
/// bay records from its type's templates (placeholder names included),
/// the way the inventory system itself would.
pub trait InventoryRepository: Send + Sync {
    // ── Controllers ──

    fn get_controller(&self, id: Uuid) -> Result<Controller, CoreError>;

    fn save_controller(&self, controller: &Controller) -> Result<(), CoreError>;

    // ── Prototypes ──

    fn get_prototype(&self, id: Uuid) -> Result<DevicePrototype, CoreError>;

    /// Identity lookup by `(instance_uuid, serial)` within a controller.
    fn find_prototype(
        &self,
        controller: Uuid,
        instance_uuid: &str,
        serial: &str,
    ) -> Result<Option<DevicePrototype>, CoreError>;

    fn prototypes_for_controller(&self, controller: Uuid) -> Result<Vec<DevicePrototype>, CoreError>;

    /// All sibling prototypes sharing one stack's instance UUID.
    fn prototypes_by_instance(
        &self,
        controller: Uuid,
        instance_uuid: &str,
    ) -> Result<Vec<DevicePrototype>, CoreError>;

    fn save_prototype(&self, prototype: &DevicePrototype) -> Result<(), CoreError>;

    // ── Devices ──

    fn get_device(&self, id: Uuid) -> Result<Device, CoreError>;

    /// Exact serial match.
    fn find_device_by_serial(&self, serial: &str) -> Result<Option<Device>, CoreError>;

    /// Exact name match.
    fn find_device_by_name(&self, name: &str) -> Result<Option<Device>, CoreError>;

    /// Case-insensitive substring match on the name.
    fn find_device_by_name_contains(&self, fragment: &str) -> Result<Option<Device>, CoreError>;

    fn find_device_by_primary_ip(&self, ip: Uuid) -> Result<Option<Device>, CoreError>;

    fn devices_by_role(&self, role: Uuid) -> Result<Vec<Device>, CoreError>;

    /// Creates the device and materializes its type's interface and
    /// module-bay templates.
    fn create_device(&self, device: &Device) -> Result<(), CoreError>;

    fn save_device(&self, device: &Device) -> Result<(), CoreError>;

    // ── Device types & templates ──

    fn get_device_type(&self, id: Uuid) -> Result<DeviceType, CoreError>;

    fn find_device_type_by_model(&self, model: &str) -> Result<Option<DeviceType>, CoreError>;

    fn find_device_type_by_part_number(&self, part_number: &str)
    -> Result<Option<DeviceType>, CoreError>;

    fn interface_templates_for_device_type(
        &self,
        device_type: Uuid,
    ) -> Result<Vec<InterfaceTemplate>, CoreError>;

    /// Every interface template in the system, across device and
    /// module types. Input to the most-common-type inference.
    fn all_interface_templates(&self) -> Result<Vec<InterfaceTemplate>, CoreError>;

    // ── Module types ──

    fn find_module_type_by_model(&self, model: &str) -> Result<Option<ModuleType>, CoreError>;

    fn find_module_type_by_part_number(&self, part_number: &str)
    -> Result<Option<ModuleType>, CoreError>;

    // ── Interfaces ──

    fn get_interface(&self, id: Uuid) -> Result<Interface, CoreError>;

    fn interfaces_for_device(&self, device: Uuid) -> Result<Vec<Interface>, CoreError>;

    /// Case-insensitive name match within a device.
    fn find_interface_by_name(&self, device: Uuid, name: &str)
    -> Result<Option<Interface>, CoreError>;

    fn create_interface(&self, interface: &Interface) -> Result<(), CoreError>;

    fn save_interface(&self, interface: &Interface) -> Result<(), CoreError>;

    fn delete_interface(&self, id: Uuid) -> Result<(), CoreError>;

    // ── Module bays ──

    fn module_bays_for_device(&self, device: Uuid) -> Result<Vec<ModuleBay>, CoreError>;

    fn create_module_bay(&self, bay: &ModuleBay) -> Result<(), CoreError>;

    fn save_module_bay(&self, bay: &ModuleBay) -> Result<(), CoreError>;

    fn delete_module_bay(&self, id: Uuid) -> Result<(), CoreError>;

    // ── Modules ──

    fn find_module_by_bay(&self, bay: Uuid) -> Result<Option<Module>, CoreError>;

    /// Creates the module and materializes its type's interface
    /// templates onto the owning device, resolving `{module}` to the
    /// bay position.
    fn create_module(&self, module: &Module) -> Result<(), CoreError>;

    fn save_module(&self, module: &Module) -> Result<(), CoreError>;

    // ── MAC addresses ──

    fn get_mac(&self, id: Uuid) -> Result<MacAddressRecord, CoreError>;

    fn find_mac(&self, mac: &str) -> Result<Option<MacAddressRecord>, CoreError>;

    fn create_mac(&self, mac: &MacAddressRecord) -> Result<(), CoreError>;

    // ── IP addresses ──

    fn get_ip(&self, id: Uuid) -> Result<IpAddress, CoreError>;

    /// Exact address-text match (`"10.20.0.5/24"`).
    fn find_ip_by_address(&self, address: &str) -> Result<Option<IpAddress>, CoreError>;

    /// First record whose address text starts with the given string.
    fn find_ip_starting_with(&self, prefix: &str) -> Result<Option<IpAddress>, CoreError>;

    fn create_ip(&self, ip: &IpAddress) -> Result<(), CoreError>;

    fn save_ip(&self, ip: &IpAddress) -> Result<(), CoreError>;

    // ── Prefixes, sites, roles ──

    /// Prefixes containing the address, ordered by network then
    /// prefix length.
    fn prefixes_containing(&self, address: &str) -> Result<Vec<Prefix>, CoreError>;

    /// Case-insensitive facility-code match.
    fn find_site_by_facility(&self, facility: &str) -> Result<Option<Site>, CoreError>;

    /// Roles whose `facility` custom field equals the given value.
    fn roles_with_facility(&self, facility: &str) -> Result<Vec<Role>, CoreError>;

    // ── Change log ──

    fn record_change(&self, entry: ChangeEntry) -> Result<(), CoreError>;

    fn changes(&self) -> Result<Vec<ChangeEntry>, CoreError>;
}
