// ── Identity matcher and scorer ──
//
// Builds the fresh prototype for one unit: resolves the management IP
// to an inventory address record, matches the unit against existing
// devices (exact serial first, weaker hostname/IP heuristics second),
// adopts site/tenant/role from a matched device, falls back to
// hostname-pattern inference, and computes the advisory confidence
// score. Persistence of the result is the sync stage's job.

use regex::Regex;
use uuid::Uuid;

use crate::context::RunContext;
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::model::{Controller, DevicePrototype, IpAddress, SyncStatus, UnitReport};
use crate::net;
use crate::repository::{ChangeAction, InventoryRepository};
use crate::source::ControllerSource;
use crate::split::{instance_identity, SplitUnit};

/// Capture group 1 of `pattern` in `hostname`, trimmed; `None` when the
/// pattern does not hit or captures nothing usable.
fn capture_facility(pattern: &Regex, hostname: &str) -> Option<String> {
    if hostname.is_empty() {
        return None;
    }
    pattern
        .captures(hostname)?
        .get(1)
        .map(|m| m.as_str().trim().to_owned())
        .filter(|s| !s.is_empty())
}

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Match one unit against the inventory and build its prototype.
    ///
    /// Scoring: +5 for a serial-matched device, +1 each for serial and
    /// hostname equality with it, +1 each for a resolved management IP,
    /// device type, and site. Maximum 10.
    pub(crate) fn resolve_identity(
        &self,
        controller: &Controller,
        ctx: &RunContext,
        unit: &SplitUnit,
        raw: UnitReport,
    ) -> Result<DevicePrototype, CoreError> {
        let mut tenant = controller.default_tenant;
        let hostname = unit.device.hostname.clone().unwrap_or_default();
        let serial = unit.device.serial_number.clone().unwrap_or_default();

        // Management IP, with the interface's netmask appended when the
        // report included one.
        let management_ip = unit.device.management_ip_address.as_ref().map(|ip| {
            raw.management_interface
                .as_ref()
                .and_then(|iface| iface.ipv4_mask.as_deref())
                .and_then(|mask| net::with_prefix_len(ip, mask))
                .unwrap_or_else(|| ip.clone())
        });

        let mut matching = if serial.is_empty() {
            None
        } else {
            self.repository.find_device_by_serial(&serial)?
        };

        // A matched device about to become unit 1 of a stack gets the
        // "-1" suffix so sibling units line up, unless that name is
        // already taken.
        if let Some(device) = &mut matching {
            if hostname.ends_with("-1") && !device.name.ends_with("-1") {
                let renamed = format!("{}-1", device.name);
                if self.repository.find_device_by_name(&renamed)?.is_none() {
                    device.name = renamed;
                    self.repository.save_device(device)?;
                    self.log_change(ChangeAction::Update, "device", device.id, &device.name)?;
                }
            }
        }

        let device_type = match unit.device.platform_id.as_deref() {
            Some(platform) if !platform.is_empty() => {
                match self.repository.find_device_type_by_model(platform)? {
                    Some(found) => Some(found),
                    None => self.repository.find_device_type_by_part_number(platform)?,
                }
            }
            _ => None,
        };

        let mut site: Option<Uuid> = None;
        let mut primary_ip4: Option<IpAddress> = None;
        if let Some(address) = &management_ip {
            primary_ip4 = self.repository.find_ip_starting_with(address)?;
            if primary_ip4.is_none() {
                let ip = IpAddress {
                    id: Uuid::new_v4(),
                    address: address.clone(),
                    status: "active".to_owned(),
                    tenant,
                    assigned_interface: None,
                };
                self.repository.create_ip(&ip)?;
                self.log_change(ChangeAction::Create, "ipaddress", ip.id, &ip.address)?;
                primary_ip4 = Some(ip);
            }
            if let Some(ip) = &primary_ip4 {
                site = self.site_from_prefix(&ip.address)?;
            }
        }

        // Weaker "related" match: exact name, then primary IP, then
        // name substring.
        let mut related = None;
        if matching.is_none() && !hostname.is_empty() {
            related = self.repository.find_device_by_name(&hostname)?;
        }
        if related.is_none() {
            if let Some(ip) = &primary_ip4 {
                related = self.repository.find_device_by_primary_ip(ip.id)?;
            }
        }
        if related.is_none() && !hostname.is_empty() {
            related = self.repository.find_device_by_name_contains(&hostname)?;
        }

        // Promote a related device with no serial of its own: claim it
        // by writing this unit's serial onto it.
        if matching.is_none() && !serial.is_empty() {
            if let Some(candidate) = &related {
                if candidate.serial.is_empty() {
                    let mut claimed = candidate.clone();
                    claimed.serial = serial.clone();
                    self.repository.save_device(&claimed)?;
                    self.log_change(ChangeAction::Update, "device", claimed.id, &claimed.name)?;
                    matching = Some(claimed);
                }
            }
        }

        let mut role: Option<Uuid> = None;
        let mut score = 0;
        if let Some(device) = &matching {
            site = device.site;
            if device.tenant.is_some() {
                tenant = device.tenant;
            }
            role = device.role;

            score += 5;
            if serial == device.serial {
                score += 1;
            }
            if hostname == device.name {
                score += 1;
            }
        }

        if site.is_none() {
            if let Some(pattern) = &ctx.site_pattern {
                if let Some(facility) = capture_facility(pattern, &hostname) {
                    site = self.repository.find_site_by_facility(&facility)?.map(|s| s.id);
                }
            }
        }
        if role.is_none() {
            if let Some(pattern) = &ctx.role_pattern {
                if let Some(facility) = capture_facility(pattern, &hostname) {
                    role = self.infer_role(controller, &facility)?;
                }
            }
        }

        if primary_ip4.is_some() {
            score += 1;
        }
        if device_type.is_some() {
            score += 1;
        }
        if site.is_some() {
            score += 1;
        }

        Ok(DevicePrototype {
            id: Uuid::new_v4(),
            controller: controller.id,
            instance_uuid: instance_identity(&unit.device).to_owned(),
            serial,
            hostname,
            management_ip,
            family: unit.device.family.clone(),
            reported_type: unit.device.platform_id.clone(),
            reported_role: unit.device.role.clone(),
            device_type: device_type.map(|dt| dt.id),
            primary_ip4: primary_ip4.map(|ip| ip.id),
            site,
            tenant,
            role,
            matching_device: matching.map(|d| d.id),
            related_device: related.map(|d| d.id),
            score,
            stack_info: unit.stack_info.clone(),
            stack_index: unit.rank.to_string(),
            sync_status: SyncStatus::Discovered,
            tags: Vec::new(),
            raw,
        })
    }

    /// The site scoped to the first IPAM prefix containing `address`,
    /// in (network, prefix length) order.
    pub(crate) fn site_from_prefix(&self, address: &str) -> Result<Option<Uuid>, CoreError> {
        for prefix in self.repository.prefixes_containing(address)? {
            if let Some(site) = prefix.site {
                return Ok(Some(site));
            }
        }
        Ok(None)
    }

    /// A role whose facility custom field matches, restricted to roles
    /// already populated by devices of the controller's vendor.
    fn infer_role(
        &self,
        controller: &Controller,
        facility: &str,
    ) -> Result<Option<Uuid>, CoreError> {
        let vendor = controller.kind.vendor();
        for candidate in self.repository.roles_with_facility(facility)? {
            for device in self.repository.devices_by_role(candidate.id)? {
                let Some(type_id) = device.device_type else {
                    continue;
                };
                let device_type = self.repository.get_device_type(type_id)?;
                if device_type.manufacturer.to_lowercase() == vendor {
                    return Ok(Some(candidate.id));
                }
            }
        }
        Ok(None)
    }
}
