// ── Prototype repository sync ──
//
// The fetch pass: walk every split unit, assemble its report snapshot
// (interfaces, modules, VLANs, cards), run the matcher, and upsert the
// resulting prototype by its (instance_uuid, serial) identity key.
// Deletion detection afterwards tombstones every stored prototype the
// pass did not touch.
//
// Stack siblings share a controller device id, so interface, VLAN, and
// hardware lookups are fetched once per id and cached in the run
// context rather than once per unit.

use indexmap::IndexMap;

use sdnsync_api::models::InterfaceRecord;

use crate::context::RunContext;
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::ifname;
use crate::model::{Controller, DevicePrototype, SyncStatus, UnitReport};
use crate::report::RunReport;
use crate::repository::{ChangeAction, InventoryRepository};
use crate::source::ControllerSource;
use crate::split::SplitUnit;

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Fetch, split, match, and upsert every reported unit.
    ///
    /// Returns the identity keys seen in this pass, for deletion
    /// detection. With `filter` set only the named instance UUIDs are
    /// processed (and the caller must then skip deletion detection).
    pub(crate) async fn fetch_pass(
        &self,
        controller: &Controller,
        ctx: &mut RunContext,
        filter: Option<&[String]>,
        report: &mut RunReport,
    ) -> Result<Vec<(String, String)>, CoreError> {
        let units = self.split_device_list(controller, filter).await?;

        let mut parent_ids: Vec<&str> = units.iter().map(|u| u.device.id.as_str()).collect();
        parent_ids.dedup();
        report.devices_fetched = parent_ids.len();
        report.units_split = units.len();

        let mut seen = Vec::with_capacity(units.len());
        for unit in &units {
            let prototype = self.sync_unit(controller, ctx, unit).await?;
            seen.push(prototype.identity_key());
            report.prototypes_upserted += 1;
        }
        Ok(seen)
    }

    /// Assemble one unit's report, match it, and persist the prototype.
    async fn sync_unit(
        &self,
        controller: &Controller,
        ctx: &mut RunContext,
        unit: &SplitUnit,
    ) -> Result<DevicePrototype, CoreError> {
        let device_id = unit.device.id.clone();

        if !ctx.hardware.contains_key(&device_id) {
            let hardware = self
                .extract_module_positions(&unit.device, unit.is_multiple, unit.total_units)
                .await?;
            ctx.hardware.insert(device_id.clone(), hardware);
        }
        if !ctx.interfaces.contains_key(&device_id) {
            let interfaces = self.source.list_interfaces(&device_id).await?;
            ctx.interfaces.insert(device_id.clone(), interfaces);
        }
        if !ctx.vlans.contains_key(&device_id) {
            let vlans = self.source.list_vlans(&device_id).await?;
            ctx.vlans.insert(device_id.clone(), vlans);
        }

        let hardware = ctx.hardware.get(&device_id).cloned().unwrap_or_default();
        let mut interfaces = ctx.interfaces.get(&device_id).cloned().unwrap_or_default();
        let vlans = ctx.vlans.get(&device_id).cloned().unwrap_or_default();

        let mut modules = hardware.modules;
        if unit.is_multiple {
            interfaces.retain(|iface| include_interface_for_rank(iface, unit.rank));
            modules.retain(|module| {
                module
                    .switch_number
                    .as_deref()
                    .and_then(|n| n.parse::<u32>().ok())
                    .is_some_and(|n| n == unit.rank)
            });
        }

        let management_interface =
            resolve_duplicate_addresses(&mut interfaces, unit.device.management_ip_address.as_deref());

        let raw = UnitReport {
            device: unit.device.clone(),
            interfaces: interfaces
                .into_iter()
                .map(|iface| (iface.port_name.clone().unwrap_or_default(), iface))
                .collect(),
            modules: modules
                .into_iter()
                .map(|module| (module.record.name.clone().unwrap_or_default(), module))
                .collect(),
            vlans,
            cards: hardware.cards,
            management_interface,
        };

        let fresh = self.resolve_identity(controller, ctx, unit, raw)?;
        let persisted = self.upsert_prototype(controller, fresh)?;

        if let Some(code) = unit.device.error_code.as_deref().filter(|c| !c.is_empty()) {
            self.reporter.log_failure(&format!(
                "Check {} error for prototype {}. Error code: {code}. Error description: {}.",
                controller.kind.label(),
                persisted.hostname,
                unit.device.error_description.as_deref().unwrap_or("none"),
            ));
        }

        Ok(persisted)
    }

    /// Upsert by identity key.
    ///
    /// Operator-editable references (device type, primary IP, site,
    /// tenant, role) and tags survive a re-fetch; reported attributes,
    /// match state, and the raw snapshot are always replaced. An
    /// imported prototype stays imported; a tombstoned one that the
    /// controller reports again is resurrected to discovered. When the
    /// merge changes nothing the stored row is left untouched, so a
    /// repeated identical fetch writes no change-log entries.
    fn upsert_prototype(
        &self,
        controller: &Controller,
        fresh: DevicePrototype,
    ) -> Result<DevicePrototype, CoreError> {
        let existing =
            self.repository
                .find_prototype(controller.id, &fresh.instance_uuid, &fresh.serial)?;

        let Some(current) = existing else {
            self.repository.save_prototype(&fresh)?;
            self.log_change(
                ChangeAction::Create,
                "deviceprototype",
                fresh.id,
                &fresh.hostname,
            )?;
            return Ok(fresh);
        };

        let mut merged = fresh;
        merged.id = current.id;
        merged.device_type = current.device_type;
        merged.primary_ip4 = current.primary_ip4;
        merged.site = current.site;
        merged.tenant = current.tenant;
        merged.role = current.role;
        merged.tags = current.tags.clone();
        merged.sync_status = match current.sync_status {
            SyncStatus::Deleted => SyncStatus::Discovered,
            status => status,
        };

        if merged == current {
            return Ok(current);
        }
        self.repository.save_prototype(&merged)?;
        self.log_change(
            ChangeAction::Update,
            "deviceprototype",
            merged.id,
            &merged.hostname,
        )?;
        Ok(merged)
    }

    /// Tombstone every stored prototype of this controller whose
    /// identity key the pass did not report. Already-tombstoned rows
    /// are left alone.
    pub(crate) fn detect_deletions(
        &self,
        controller: &Controller,
        seen: &[(String, String)],
    ) -> Result<usize, CoreError> {
        let mut deleted = 0;
        for mut prototype in self.repository.prototypes_for_controller(controller.id)? {
            if prototype.sync_status.is_deleted() {
                continue;
            }
            if seen.contains(&prototype.identity_key()) {
                continue;
            }
            prototype.sync_status = SyncStatus::Deleted;
            self.repository.save_prototype(&prototype)?;
            self.log_change(
                ChangeAction::Update,
                "deviceprototype",
                prototype.id,
                &prototype.hostname,
            )?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Multi-unit interface assignment by the unit number embedded in the
/// port name: rank 1 takes unnumbered ports and unit numbers below 2,
/// higher ranks take exactly their own unit number. The app-hosting
/// ports are controller artifacts and belong to no unit.
fn include_interface_for_rank(iface: &InterfaceRecord, rank: u32) -> bool {
    let name = iface.port_name.as_deref().unwrap_or_default();
    if name.to_lowercase().contains("appgigabitethernet") {
        return false;
    }
    let unit = ifname::extract_unit_number(name);
    if rank == 1 {
        return unit.is_none_or(|n| n < 2);
    }
    unit == Some(rank)
}

/// Two-pass duplicate-IPv4 resolution: for each reported address keep
/// one holder, preferring physical interfaces over virtual ones, and
/// blank the address on every loser. Returns the interface left
/// holding the unit's management IP, if any.
fn resolve_duplicate_addresses(
    interfaces: &mut [InterfaceRecord],
    management_ip: Option<&str>,
) -> Option<InterfaceRecord> {
    let mut winners: IndexMap<String, usize> = IndexMap::new();
    for (index, iface) in interfaces.iter().enumerate() {
        let Some(address) = iface.ipv4_address.as_deref().filter(|a| !a.is_empty()) else {
            continue;
        };
        if !winners.contains_key(address) || iface.interface_type.as_deref() == Some("Physical") {
            winners.insert(address.to_owned(), index);
        }
    }

    let mut management_interface = None;
    for (index, iface) in interfaces.iter_mut().enumerate() {
        let Some(address) = iface.ipv4_address.clone().filter(|a| !a.is_empty()) else {
            continue;
        };
        if winners.get(&address) != Some(&index) {
            iface.ipv4_address = None;
            continue;
        }
        if management_ip.is_some_and(|ip| ip == address) {
            management_interface = Some(iface.clone());
        }
    }
    management_interface
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn iface(name: &str, kind: &str, ipv4: Option<&str>) -> InterfaceRecord {
        InterfaceRecord {
            id: None,
            port_name: Some(name.to_owned()),
            interface_type: Some(kind.to_owned()),
            ipv4_address: ipv4.map(str::to_owned),
            ipv4_mask: None,
            mac_address: None,
            speed: None,
            duplex: None,
            port_mode: None,
            description: None,
            vlan_id: None,
            admin_status: None,
            status: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_physical_interface_wins_duplicate_address() {
        let mut interfaces = vec![
            iface("Vlan100", "Virtual", Some("10.0.0.5")),
            iface("GigabitEthernet1/0/1", "Physical", Some("10.0.0.5")),
        ];
        let management = resolve_duplicate_addresses(&mut interfaces, Some("10.0.0.5"));

        assert_eq!(interfaces[0].ipv4_address, None);
        assert_eq!(interfaces[1].ipv4_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(
            management.unwrap().port_name.as_deref(),
            Some("GigabitEthernet1/0/1")
        );
    }

    #[test]
    fn test_rank_one_takes_unnumbered_and_low_units() {
        let shared = iface("Loopback0", "Virtual", None);
        let unit_one = iface("GigabitEthernet1/0/3", "Physical", None);
        let unit_two = iface("GigabitEthernet2/0/3", "Physical", None);
        let app = iface("AppGigabitEthernet1/0/1", "Physical", None);

        assert!(include_interface_for_rank(&shared, 1));
        assert!(include_interface_for_rank(&unit_one, 1));
        assert!(!include_interface_for_rank(&unit_two, 1));
        assert!(!include_interface_for_rank(&app, 1));

        assert!(!include_interface_for_rank(&shared, 2));
        assert!(!include_interface_for_rank(&unit_one, 2));
        assert!(include_interface_for_rank(&unit_two, 2));
    }
}
