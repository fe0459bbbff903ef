// ── Inventory domain types ──
//
// Entities owned by the asset-of-record inventory system. The engine
// reads them through `InventoryRepository` queries and writes them only
// through the importer. `serial` follows inventory convention: an empty
// string means "unknown", not a distinct value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Device ──────────────────────────────────────────────────────────

/// One physical device in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub device_type: Option<Uuid>,
    #[serde(default)]
    pub role: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<Uuid>,
    #[serde(default)]
    pub site: Option<Uuid>,
    /// Primary IPv4 record of this device.
    #[serde(default)]
    pub primary_ip4: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Denormalized bay count, recomputed after bay writes.
    #[serde(default)]
    pub module_bay_count: usize,
}

/// A device hardware profile. `model` and `part_number` are the lookup
/// keys for reported platform IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: Uuid,
    pub model: String,
    #[serde(default)]
    pub part_number: String,
    pub manufacturer: String,
}

/// A module hardware profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleType {
    pub id: Uuid,
    pub model: String,
    #[serde(default)]
    pub part_number: String,
}

/// Interface template attached to a device type or module type.
///
/// Template names may embed `{chassis}` / `{module}` placeholders that
/// are instantiated when the owning device or module is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceTemplate {
    pub name: String,
    pub if_type: String,
}

/// Module bay template attached to a device type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleBayTemplate {
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
}

// ── Interface ───────────────────────────────────────────────────────

/// Link duplex setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Half,
    Full,
    Auto,
}

impl Duplex {
    /// Normalize a controller-reported duplex string (`"FullDuplex"`,
    /// `"AutoNegotiate"`, …) by substring match.
    pub fn from_reported(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        [Self::Half, Self::Full, Self::Auto]
            .into_iter()
            .find(|choice| lower.contains(choice.as_str()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Half => "half",
            Self::Full => "full",
            Self::Auto => "auto",
        }
    }
}

/// 802.1Q mode of a switched interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    Access,
    Tagged,
}

/// One interface of an inventory device.
///
/// `if_type` is an open string domain: hardware types come from
/// device-type templates, with the reported `"Physical"`/`"Virtual"`
/// classification as a fallback and `"lag"` for aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub id: Uuid,
    pub device: Uuid,
    pub name: String,
    pub if_type: String,
    #[serde(default)]
    pub speed: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duplex: Option<Duplex>,
    #[serde(default)]
    pub mode: Option<PortMode>,
    /// Module occupying this interface's bay, if any.
    #[serde(default)]
    pub module: Option<Uuid>,
    /// Physical cable termination, if any. Owned by the inventory
    /// system; the engine only reads it for merge precedence.
    #[serde(default)]
    pub cable: Option<Uuid>,
    #[serde(default)]
    pub primary_mac_address: Option<Uuid>,
}

/// A MAC address record attachable to an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacAddressRecord {
    pub id: Uuid,
    pub mac: String,
    #[serde(default)]
    pub assigned_interface: Option<Uuid>,
    #[serde(default)]
    pub custom_fields: serde_json::Map<String, serde_json::Value>,
}

// ── Modules ─────────────────────────────────────────────────────────

/// A bay in a device that can host a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleBay {
    pub id: Uuid,
    pub device: Uuid,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A field-replaceable module seated in a bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub device: Uuid,
    pub module_bay: Uuid,
    pub module_type: Uuid,
    pub status: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub description: String,
}

// ── IPAM ────────────────────────────────────────────────────────────

/// An IP address record, stored with its prefix length
/// (e.g. `"10.20.0.5/24"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: Uuid,
    pub address: String,
    pub status: String,
    #[serde(default)]
    pub tenant: Option<Uuid>,
    #[serde(default)]
    pub assigned_interface: Option<Uuid>,
}

/// An IPAM prefix, optionally scoped to a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    pub id: Uuid,
    /// CIDR notation, e.g. `"10.20.0.0/16"`.
    pub prefix: String,
    #[serde(default)]
    pub site: Option<Uuid>,
}

// ── Organizational ──────────────────────────────────────────────────

/// A physical site. `facility` is the operator-assigned facility code
/// matched by hostname-derived tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub facility: String,
}

/// A device functional role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub custom_fields: serde_json::Map<String, serde_json::Value>,
}

/// A tenant owning devices and addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
}
