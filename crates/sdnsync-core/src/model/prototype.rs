// ── Device prototype domain types ──
//
// A prototype is a controller-sourced candidate inventory record. It is
// upserted once per fetch pass keyed by (instance_uuid, serial), carries
// everything the controller reported about one physical unit, and moves
// through the discovered/imported/deleted lifecycle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sdnsync_api::models::{CardRecord, DeviceRecord, InterfaceRecord, ModuleRecord, VlanRecord};

/// Lifecycle state of a prototype.
///
/// `Discovered` is the default. `Imported` is entered only through a
/// successful validation after an import attempt; `Deleted` only through
/// deletion detection. A deleted prototype re-reported by the controller
/// is resurrected to `Discovered` on the next fetch.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
    Discovered,
    Imported,
    Deleted,
}

impl SyncStatus {
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// A module with its resolved stack/slot position.
///
/// `record.name` holds the working name: rewritten to
/// `"Switch <s> Module <m>"` once both numbers are known, which makes it
/// the module-bay lookup key during import. The original reported name
/// is retained in `reported_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedModule {
    pub record: ModuleRecord,
    pub reported_name: String,
    #[serde(default)]
    pub switch_number: Option<String>,
    #[serde(default)]
    pub slot_number: Option<String>,
}

/// Everything the controller reported about one physical unit, parsed
/// once at the boundary. Unknown controller fields survive inside the
/// wire records' catch-all maps, so persisting this snapshot is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub device: DeviceRecord,
    /// Interfaces keyed by reported port name, in report order.
    pub interfaces: IndexMap<String, InterfaceRecord>,
    /// Modules keyed by working name, in report order.
    pub modules: IndexMap<String, PositionedModule>,
    pub vlans: Vec<VlanRecord>,
    /// Line/supervisor card detail keyed by card serial.
    pub cards: IndexMap<String, CardRecord>,
    /// The interface carrying the unit's management IP, if identified.
    pub management_interface: Option<InterfaceRecord>,
}

/// A candidate inventory record sourced from the controller.
///
/// Identity key: (`instance_uuid`, `serial`) — globally unique. All
/// prototypes sharing an `instance_uuid` are units of the same physical
/// stack or chassis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePrototype {
    pub id: Uuid,
    pub controller: Uuid,
    /// Controller-assigned identity of the parent record. Opaque.
    pub instance_uuid: String,
    /// This unit's serial; empty when the controller reported none.
    #[serde(default)]
    pub serial: String,

    // ── Reported attributes ──
    /// Hostname with the domain suffix dropped, plus `-<rank>` for
    /// multi-unit stacks.
    pub hostname: String,
    /// Management IP with CIDR suffix when the mask was reported.
    #[serde(default)]
    pub management_ip: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    /// Reported platform ID for this unit.
    #[serde(default)]
    pub reported_type: Option<String>,
    /// Role as named by the controller (informational).
    #[serde(default)]
    pub reported_role: Option<String>,

    // ── Resolved references (operator-editable, preserved on re-fetch) ──
    #[serde(default)]
    pub device_type: Option<Uuid>,
    #[serde(default)]
    pub primary_ip4: Option<Uuid>,
    #[serde(default)]
    pub site: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<Uuid>,
    #[serde(default)]
    pub role: Option<Uuid>,

    // ── Match state ──
    /// High-confidence serial match.
    #[serde(default)]
    pub matching_device: Option<Uuid>,
    /// Weaker hostname/IP match, never auto-adopted.
    #[serde(default)]
    pub related_device: Option<Uuid>,
    /// Advisory confidence score; not a gating threshold.
    #[serde(default)]
    pub score: i32,

    // ── Stack identity ──
    /// serial → unit rank for the whole stack/chassis.
    #[serde(default)]
    pub stack_info: IndexMap<String, u32>,
    /// This unit's rank, as a string.
    pub stack_index: String,

    pub sync_status: SyncStatus,
    #[serde(default)]
    pub tags: Vec<String>,

    /// Lossless snapshot of the controller report for this unit.
    pub raw: UnitReport,
}

impl DevicePrototype {
    /// The (instance_uuid, serial) identity key.
    pub fn identity_key(&self) -> (String, String) {
        (self.instance_uuid.clone(), self.serial.clone())
    }
}
