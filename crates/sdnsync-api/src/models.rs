// Intent API response types
//
// Models for the controller's Intent API JSON payloads. All responses are
// wrapped in the `Envelope<T>` container. Fields use `#[serde(default)]`
// liberally because the API is inconsistent about field presence across
// device families and controller releases.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Intent API response envelope.
///
/// Every endpoint wraps its payload:
/// ```json
/// { "response": ..., "version": "1.0" }
/// ```
///
/// A scoped query with no data may carry `"response": null`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub response: Option<T>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Token issued by `POST /dna/system/api/v1/auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "Token")]
    pub token: String,
}

// ── Network device ───────────────────────────────────────────────────

/// One managed device from `network-device`.
///
/// A single record may represent a whole stack or chassis: `serialNumber`
/// and `platformId` are then comma-separated lists, one entry per member.
/// The API can return dozens more fields; everything unmodeled lands in
/// `extra` so the stored payload stays lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default)]
    pub instance_uuid: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub management_ip_address: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub platform_id: Option<String>,
    /// Marketing name of the platform line, e.g. `"Cisco Catalyst 9300 Switch"`.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub software_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub reachability_status: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Interface ────────────────────────────────────────────────────────

/// One interface from `interface/network-device/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub port_name: Option<String>,
    /// `"Physical"` or `"Virtual"`.
    #[serde(default)]
    pub interface_type: Option<String>,
    #[serde(default)]
    pub ipv4_address: Option<String>,
    /// Dotted-decimal netmask, e.g. `"255.255.255.0"`.
    #[serde(default)]
    pub ipv4_mask: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    /// Negotiated speed in kbit/s, reported as a decimal string.
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub duplex: Option<String>,
    #[serde(default)]
    pub port_mode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vlan_id: Option<String>,
    #[serde(default)]
    pub admin_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One VLAN from `network-device/{id}/vlan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanRecord {
    #[serde(default)]
    pub vlan_number: Option<i64>,
    #[serde(default)]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub mask: Option<i64>,
    #[serde(default)]
    pub network_address: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub vlan_type: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Stack / chassis detail ───────────────────────────────────────────

/// Stack membership detail from `network-device/{id}/stack`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackDetail {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub stack_switch_info: Vec<StackMember>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One stack member inside [`StackDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackMember {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub stack_member_number: Option<u32>,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One chassis slot from `network-device/{id}/chassis`.
///
/// `name` embeds the slot number (`"Chassis 2"`); members are matched
/// to serials by the digits of that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChassisSlot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Modules and cards ────────────────────────────────────────────────

/// One module from `network-device/module?deviceId={id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub operational_state_code: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One line card or supervisor card from the per-device card endpoints.
///
/// Positions here are authoritative: when a module's serial appears in
/// the card list, `switchno`/`slotno` override any name-based inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(default)]
    pub serialno: Option<String>,
    #[serde(default)]
    pub partno: Option<String>,
    #[serde(default)]
    pub switchno: Option<String>,
    #[serde(default)]
    pub slotno: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
