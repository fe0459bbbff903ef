// ── Importer ──
//
// Materializes validated prototypes as inventory records: the device
// itself, its module bays and seated modules, its interfaces with MAC
// and IP attachments. Existing records are merged with a fill-empty,
// warn-on-conflict policy; the importer never overwrites a populated
// inventory attribute with a differing reported value.
//
// Every sub-object (bay, module, interface, IP) is processed under its
// own failure boundary: one malformed record is logged and skipped,
// never aborting the prototype import around it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use sdnsync_api::models::InterfaceRecord;

use crate::context::RunContext;
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::ifname;
use crate::model::{
    Controller, Device, DevicePrototype, Duplex, Interface, IpAddress, MacAddressRecord, Module,
    ModuleBay, PortMode, PositionedModule, SyncStatus,
};
use crate::net;
use crate::repository::{ChangeAction, InventoryRepository};
use crate::source::ControllerSource;

/// Trailing numeric position of a reported bay name.
static BAY_POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("bay position pattern is valid"));

/// Port-number suffix used for loose interface-name matching.
static NAME_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(/\d+)+)$").expect("name suffix pattern is valid"));

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Import every selected prototype, one failure boundary each.
    ///
    /// Returns `false` when any failure was logged during the pass.
    pub(crate) fn import_pass(
        &self,
        controller: &Controller,
        ctx: &mut RunContext,
        selected: &[DevicePrototype],
    ) -> Result<bool, CoreError> {
        for prototype in selected {
            if let Err(err) = self.import_one(controller, ctx, prototype.id) {
                self.reporter.log_failure(&format!(
                    "Unable to create prototype : {} - {err}",
                    prototype.hostname
                ));
            }
        }
        Ok(!self.reporter.failed())
    }

    fn import_one(
        &self,
        controller: &Controller,
        ctx: &mut RunContext,
        prototype_id: Uuid,
    ) -> Result<(), CoreError> {
        let mut prototype = self.repository.get_prototype(prototype_id)?;

        self.clean_prototype_interfaces(controller, &prototype)?;

        if !self.validate_prototype(controller, &prototype, ctx, self.log_all_errors, false)? {
            return self.revert_to_discovered(&mut prototype);
        }

        // Locate or create the inventory device. Interface-name sanity
        // checking only applies to devices that already have interfaces.
        let (device, map_interfaces) = match prototype.matching_device {
            Some(device_id) => {
                let mut device = self.repository.get_device(device_id)?;
                if device.serial.is_empty() {
                    device.serial = prototype.serial.clone();
                    self.repository.save_device(&device)?;
                    self.log_change(ChangeAction::Update, "device", device.id, &device.name)?;
                } else if device.serial != prototype.serial {
                    self.log_attribute_mismatch("Serial", &prototype, &device);
                }
                self.compare_device_attributes(&prototype, &device);
                self.reporter.log_info(&format!(
                    "Device {} updated with prototype {}",
                    device.name, prototype.hostname
                ));
                (device, true)
            }
            None => {
                let device = Device {
                    id: Uuid::new_v4(),
                    name: prototype.hostname.clone(),
                    serial: prototype.serial.clone(),
                    device_type: prototype.device_type,
                    role: prototype.role,
                    tenant: prototype.tenant,
                    site: prototype.site,
                    primary_ip4: None,
                    tags: Vec::new(),
                    module_bay_count: 0,
                };
                self.repository.create_device(&device)?;
                self.log_change(ChangeAction::Create, "device", device.id, &device.name)?;

                // Device-type templates seed bays the controller knows
                // nothing about; only reported bays may remain.
                for bay in self.repository.module_bays_for_device(device.id)? {
                    self.repository.delete_module_bay(bay.id)?;
                }
                self.rewrite_device_placeholders(device.id, &prototype.stack_index)?;

                self.reporter.log_info(&format!(
                    "New device {} created with prototype {}",
                    device.name, prototype.hostname
                ));
                (self.repository.get_device(device.id)?, false)
            }
        };

        let label = controller.kind.label().to_owned();
        prototype.matching_device = Some(device.id);
        prototype.sync_status = SyncStatus::Imported;
        if !prototype.tags.contains(&label) {
            prototype.tags.push(label.clone());
        }
        self.repository.save_prototype(&prototype)?;
        self.log_change(
            ChangeAction::Update,
            "deviceprototype",
            prototype.id,
            &prototype.hostname,
        )?;

        let mut device = self.repository.get_device(device.id)?;
        if !device.tags.contains(&label) {
            device.tags.push(label);
        }
        if prototype.device_type.is_some() {
            device.device_type = prototype.device_type;
        }
        self.repository.save_device(&device)?;
        self.log_change(ChangeAction::Update, "device", device.id, &device.name)?;

        self.process_module_bays(&device, &prototype)?;
        self.process_interfaces(controller, ctx, &device, &prototype, map_interfaces)?;
        self.remap_interfaces(&prototype, device.id)?;

        // Bays and modules may have reshaped the interface set; judge
        // the final state.
        let mut prototype = self.repository.get_prototype(prototype.id)?;
        if self.validate_prototype(controller, &prototype, ctx, self.log_all_errors, true)? {
            self.reporter.log_info(&format!("Prototype {} is IMPORTED", prototype.hostname));
            Ok(())
        } else {
            self.revert_to_discovered(&mut prototype)
        }
    }

    fn revert_to_discovered(&self, prototype: &mut DevicePrototype) -> Result<(), CoreError> {
        prototype.sync_status = SyncStatus::Discovered;
        self.repository.save_prototype(prototype)?;
        self.log_change(
            ChangeAction::Update,
            "deviceprototype",
            prototype.id,
            &prototype.hostname,
        )?;
        self.reporter
            .log_info(&format!("Prototype {} is DISCOVERED", prototype.hostname));
        Ok(())
    }

    // ── Device attributes ───────────────────────────────────────────

    fn log_attribute_mismatch(&self, attribute: &str, prototype: &DevicePrototype, device: &Device) {
        self.reporter.log_warning(&format!(
            "{attribute} doesn't match between prototype {} and NetBox Device {}",
            prototype.hostname, device.name
        ));
    }

    /// Comparison only: mismatches are reported, never overwritten.
    fn compare_device_attributes(&self, prototype: &DevicePrototype, device: &Device) {
        let mismatches = [
            ("Name", device.name != prototype.hostname),
            ("Role", device.role != prototype.role),
            ("Device_type", device.device_type != prototype.device_type),
            ("Tenant", device.tenant != prototype.tenant),
            ("Site", device.site != prototype.site),
            ("Serial", device.serial != prototype.serial),
        ];
        for (attribute, mismatched) in mismatches {
            if mismatched {
                self.log_attribute_mismatch(attribute, prototype, device);
            }
        }
    }

    // ── Orphan cleanup ──────────────────────────────────────────────

    /// Across all stack siblings with a matching device, delete
    /// interfaces that carry no cable, no module, are not valid
    /// controller-style names, and did not come from a device-type
    /// template.
    pub(crate) fn clean_prototype_interfaces(
        &self,
        controller: &Controller,
        prototype: &DevicePrototype,
    ) -> Result<(), CoreError> {
        for sibling in self
            .repository
            .prototypes_by_instance(controller.id, &prototype.instance_uuid)?
        {
            let Some(device_id) = sibling.matching_device else {
                continue;
            };
            for interface in self.repository.interfaces_for_device(device_id)? {
                if interface.cable.is_none()
                    && interface.module.is_none()
                    && !ifname::is_valid_interface(&interface.name)
                    && !self.is_device_type_template(&interface)?
                {
                    self.repository.delete_interface(interface.id)?;
                }
            }
        }
        Ok(())
    }

    /// Whether an interface's hardware-type prefix matches any of its
    /// device type's interface templates.
    pub(crate) fn is_device_type_template(&self, interface: &Interface) -> Result<bool, CoreError> {
        let device = self.repository.get_device(interface.device)?;
        let Some(type_id) = device.device_type else {
            return Ok(false);
        };

        let canonical = ifname::canonical_name(&interface.name);
        let prefix = ifname::interface_type_prefix(&canonical);
        if prefix.is_empty() {
            return Ok(false);
        }

        for template in self.repository.interface_templates_for_device_type(type_id)? {
            let template_canonical = ifname::canonical_name(&template.name);
            if ifname::interface_type_prefix(&template_canonical) == prefix {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Module bays and modules ─────────────────────────────────────

    fn process_module_bays(
        &self,
        device: &Device,
        prototype: &DevicePrototype,
    ) -> Result<(), CoreError> {
        for (bay_name, positioned) in &prototype.raw.modules {
            if let Err(err) = self.process_one_module_bay(device, prototype, bay_name, positioned) {
                self.reporter.log_failure(&format!(
                    "Unable to create module bay {bay_name} for prototype {} - {err}",
                    prototype.hostname
                ));
            }
        }
        Ok(())
    }

    fn process_one_module_bay(
        &self,
        device: &Device,
        prototype: &DevicePrototype,
        bay_name: &str,
        positioned: &PositionedModule,
    ) -> Result<(), CoreError> {
        let position = BAY_POSITION_RE
            .captures(bay_name)
            .map(|captures| captures[1].to_owned());

        // Cascade: exact name, then the position field, then a position
        // parsed out of an existing bay's name. A positional match is
        // renamed to the reported name.
        let bays = self.repository.module_bays_for_device(device.id)?;
        let mut bay = bays
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(bay_name))
            .cloned();

        if bay.is_none() {
            if let Some(found) = bays.iter().find(|b| b.position == position) {
                let mut renamed = found.clone();
                renamed.name = bay_name.to_owned();
                self.repository.save_module_bay(&renamed)?;
                self.log_change(ChangeAction::Update, "modulebay", renamed.id, &renamed.name)?;
                bay = Some(renamed);
            }
        }
        if bay.is_none() {
            if let Some(wanted) = &position {
                if let Some(found) = bays
                    .iter()
                    .find(|b| ifname::extract_position(&b.name) == *wanted)
                {
                    let mut renamed = found.clone();
                    renamed.name = bay_name.to_owned();
                    self.repository.save_module_bay(&renamed)?;
                    self.log_change(
                        ChangeAction::Update,
                        "modulebay",
                        renamed.id,
                        &renamed.name,
                    )?;
                    bay = Some(renamed);
                }
            }
        }

        let (mut bay, action) = match bay {
            Some(existing) => (existing, ChangeAction::Update),
            None => (
                ModuleBay {
                    id: Uuid::new_v4(),
                    device: device.id,
                    name: bay_name.to_owned(),
                    position: position.clone(),
                    description: String::new(),
                },
                ChangeAction::Create,
            ),
        };

        let reported_description = positioned.record.description.clone().unwrap_or_default();
        if bay.description.is_empty() {
            bay.description = reported_description;
        } else if bay.description != reported_description {
            self.reporter.log_warning(&format!(
                "Description doesn't match between prototype {} module bay {bay_name} and \
                 NetBox device {}",
                prototype.hostname, device.name
            ));
        }

        match action {
            ChangeAction::Create => self.repository.create_module_bay(&bay)?,
            _ => self.repository.save_module_bay(&bay)?,
        }
        self.log_change(action, "modulebay", bay.id, &bay.name)?;

        let mut owner = self.repository.get_device(device.id)?;
        owner.module_bay_count = self.repository.module_bays_for_device(device.id)?.len();
        self.repository.save_device(&owner)?;
        self.log_change(ChangeAction::Update, "device", owner.id, &owner.name)?;

        if let Err(err) = self.process_module(prototype, positioned, &bay) {
            self.reporter.log_warning(&format!(
                "Unable to create module with module type {} for device {} and module bay {} \
                 with prototype {} - {err}",
                positioned.record.part_number.as_deref().unwrap_or("none"),
                device.name,
                bay.name,
                prototype.hostname
            ));
        }
        Ok(())
    }

    /// Seat (or merge) the reported module in its bay. Silently a no-op
    /// when no module type matches the reported part number.
    fn process_module(
        &self,
        prototype: &DevicePrototype,
        positioned: &PositionedModule,
        bay: &ModuleBay,
    ) -> Result<(), CoreError> {
        let Some(part) = positioned
            .record
            .part_number
            .as_deref()
            .filter(|p| !p.is_empty())
        else {
            return Ok(());
        };
        let module_type = match self.repository.find_module_type_by_model(part)? {
            Some(found) => Some(found),
            None => self.repository.find_module_type_by_part_number(part)?,
        };
        let Some(module_type) = module_type else {
            return Ok(());
        };

        let reported_serial = positioned.record.serial_number.clone().unwrap_or_default();
        let reported_description = positioned.record.description.clone().unwrap_or_default();

        match self.repository.find_module_by_bay(bay.id)? {
            None => {
                let module = Module {
                    id: Uuid::new_v4(),
                    device: bay.device,
                    module_bay: bay.id,
                    module_type: module_type.id,
                    status: "active".to_owned(),
                    serial: reported_serial,
                    description: reported_description,
                };
                self.repository.create_module(&module)?;
                self.log_change(ChangeAction::Create, "module", module.id, &bay.name)?;
                self.rewrite_module_placeholders(prototype, module.id, bay)?;
            }
            Some(mut module) => {
                if module.module_type != module_type.id {
                    self.reporter.log_warning(&format!(
                        "Module_type doesn't match between prototype {} module and module {}",
                        prototype.hostname, bay.name
                    ));
                }
                if module.serial.is_empty() {
                    module.serial = reported_serial;
                } else if module.serial != reported_serial {
                    self.reporter.log_warning(&format!(
                        "Serial doesn't match between prototype {} module and module {}",
                        prototype.hostname, bay.name
                    ));
                }
                if module.description.is_empty() {
                    module.description = reported_description;
                } else if module.description != reported_description {
                    self.reporter.log_warning(&format!(
                        "Description doesn't match between prototype {} module and module {}",
                        prototype.hostname, bay.name
                    ));
                }
                self.repository.save_module(&module)?;
                self.log_change(ChangeAction::Update, "module", module.id, &bay.name)?;
            }
        }

        self.repository.save_module_bay(bay)?;
        self.log_change(ChangeAction::Update, "modulebay", bay.id, &bay.name)?;
        Ok(())
    }

    // ── Placeholder rewriting ───────────────────────────────────────

    /// Instantiate `{chassis}` in device-template-derived interface
    /// names with the unit's stack rank.
    fn rewrite_device_placeholders(
        &self,
        device: Uuid,
        stack_index: &str,
    ) -> Result<(), CoreError> {
        for mut interface in self.repository.interfaces_for_device(device)? {
            if interface.name.contains("{chassis}") {
                interface.name = interface.name.replace("{chassis}", stack_index);
                self.repository.save_interface(&interface)?;
            }
        }
        Ok(())
    }

    /// Instantiate `{chassis}` in the interfaces a module's templates
    /// just materialized.
    ///
    /// Multi-unit stacks substitute the switch number parsed from the
    /// bay name. A single-unit device whose module templates carry more
    /// slash depth than the controller reports drops the `{chassis}/`
    /// segment instead, so template names collapse onto the reported
    /// port layout.
    fn rewrite_module_placeholders(
        &self,
        prototype: &DevicePrototype,
        module: Uuid,
        bay: &ModuleBay,
    ) -> Result<(), CoreError> {
        let single_unit = prototype.stack_info.len() <= 1;
        let chassis = if single_unit {
            Some("1".to_owned())
        } else {
            ifname::extract_chassis_number(&bay.name).map(|n| n.to_string())
        };
        let Some(chassis) = chassis else {
            return Ok(());
        };

        let created: Vec<Interface> = self
            .repository
            .interfaces_for_device(bay.device)?
            .into_iter()
            .filter(|i| i.module == Some(module))
            .collect();

        let template_depth = created
            .iter()
            .map(|i| i.name.matches('/').count())
            .max()
            .unwrap_or(0);
        let reported_depth = prototype
            .raw
            .interfaces
            .keys()
            .map(|name| name.matches('/').count())
            .max()
            .unwrap_or(0);
        let truncate = single_unit && template_depth > reported_depth;

        for mut interface in created {
            if !interface.name.contains("{chassis}") {
                continue;
            }
            interface.name = if truncate {
                interface.name.replace("{chassis}/", "")
            } else {
                interface.name.replace("{chassis}", &chassis)
            };
            self.repository.save_interface(&interface)?;
        }
        Ok(())
    }

    // ── Interfaces ──────────────────────────────────────────────────

    /// At least one reported interface must be recognizable on the
    /// device, by case-insensitive name or by port-number suffix. A
    /// device with no interfaces at all passes trivially.
    fn matching_interfaces(
        &self,
        prototype: &DevicePrototype,
        device: &Device,
    ) -> Result<bool, CoreError> {
        let existing = self.repository.interfaces_for_device(device.id)?;
        if existing.is_empty() {
            return Ok(true);
        }

        for name in prototype.raw.interfaces.keys() {
            if existing.iter().any(|i| i.name.eq_ignore_ascii_case(name)) {
                return Ok(true);
            }
            let Some(suffix) = NAME_SUFFIX_RE
                .captures(name)
                .map(|captures| captures[1].to_owned())
            else {
                continue;
            };
            let pattern = Regex::new(&format!(r"(\D|^){suffix}(\D|$)"))
                .map_err(|err| CoreError::Internal(format!("suffix pattern: {err}")))?;
            if existing.iter().any(|i| pattern.is_match(&i.name)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn process_interfaces(
        &self,
        controller: &Controller,
        ctx: &mut RunContext,
        device: &Device,
        prototype: &DevicePrototype,
        map_interfaces: bool,
    ) -> Result<(), CoreError> {
        if map_interfaces && !self.matching_interfaces(prototype, device)? {
            self.reporter.log_failure(&format!(
                "Device {} interface naming doesnt match {} {} prototype interfaces. \
                 Check serial number and stack number",
                device.name,
                controller.kind.label(),
                prototype.hostname
            ));
            return Ok(());
        }

        for (name, record) in &prototype.raw.interfaces {
            if let Err(err) = self.process_one_interface(ctx, device, prototype, name, record) {
                self.reporter.log_failure(&format!(
                    "Unable to create interface {name} for prototype {} - {err}",
                    prototype.hostname
                ));
            }
        }
        Ok(())
    }

    fn process_one_interface(
        &self,
        ctx: &mut RunContext,
        device: &Device,
        prototype: &DevicePrototype,
        name: &str,
        record: &InterfaceRecord,
    ) -> Result<(), CoreError> {
        let reported_speed = match record.speed.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| CoreError::MalformedReport {
                message: format!("unparseable interface speed {raw:?}"),
            })?),
            None => None,
        };
        let reported_duplex = record.duplex.as_deref().and_then(Duplex::from_reported);
        let reported_description = record.description.clone().unwrap_or_default();

        let existing = self.repository.find_interface_by_name(device.id, name)?;
        let (mut interface, action) = match existing {
            Some(found) => (found, ChangeAction::Update),
            None => {
                if !ifname::is_valid_interface(name) {
                    return Ok(());
                }
                let reported_type =
                    record
                        .interface_type
                        .as_deref()
                        .ok_or_else(|| CoreError::MalformedReport {
                            message: "interface report carries no type".to_owned(),
                        })?;
                let mut if_type = reported_type.to_owned();
                if if_type.eq_ignore_ascii_case("physical") {
                    if let Some(common) =
                        self.most_common_interface_type(&mut ctx.template_types, name)?
                    {
                        if_type = common;
                    }
                }
                if if_type.eq_ignore_ascii_case("virtual")
                    && name.to_lowercase().contains("port-channel")
                {
                    if_type = "lag".to_owned();
                }
                (
                    Interface {
                        id: Uuid::new_v4(),
                        device: device.id,
                        name: name.to_owned(),
                        if_type,
                        speed: None,
                        description: String::new(),
                        duplex: None,
                        mode: None,
                        module: None,
                        cable: None,
                        primary_mac_address: None,
                    },
                    ChangeAction::Create,
                )
            }
        };

        // Fill-empty, warn-on-conflict for the merge attributes.
        match interface.speed.filter(|s| *s != 0) {
            Some(current) if Some(current) != reported_speed => {
                self.log_interface_mismatch("Speed", prototype, name, device);
            }
            Some(_) => {}
            None => interface.speed = reported_speed,
        }
        if interface.description.is_empty() {
            interface.description = reported_description;
        } else if interface.description != reported_description {
            self.log_interface_mismatch("Description", prototype, name, device);
        }
        match interface.duplex {
            Some(current) if Some(current) != reported_duplex => {
                self.log_interface_mismatch("Duplex", prototype, name, device);
            }
            Some(_) => {}
            None => interface.duplex = reported_duplex,
        }

        if let Some(mac) = record.mac_address.as_deref().filter(|m| !m.is_empty()) {
            let needs_update = match interface.primary_mac_address {
                None => true,
                Some(id) => self.repository.get_mac(id)?.mac != mac,
            };
            if needs_update {
                let record = match self.repository.find_mac(mac)? {
                    Some(found) => found,
                    None => {
                        let mut custom_fields = serde_json::Map::new();
                        custom_fields.insert(
                            "created_by".to_owned(),
                            self.user
                                .as_deref()
                                .map_or(Value::Null, |u| Value::String(u.to_owned())),
                        );
                        let created = MacAddressRecord {
                            id: Uuid::new_v4(),
                            mac: mac.to_owned(),
                            assigned_interface: Some(interface.id),
                            custom_fields,
                        };
                        self.repository.create_mac(&created)?;
                        created
                    }
                };
                interface.primary_mac_address = Some(record.id);
            }
        }

        match record.port_mode.as_deref() {
            Some("access") => interface.mode = Some(PortMode::Access),
            Some("trunk") => interface.mode = Some(PortMode::Tagged),
            _ => {}
        }

        match action {
            ChangeAction::Create => self.repository.create_interface(&interface)?,
            _ => self.repository.save_interface(&interface)?,
        }
        self.log_change(action, "interface", interface.id, &interface.name)?;

        if let Err(err) = self.process_ip_addresses(prototype, record, &interface) {
            self.reporter.log_failure(&format!(
                "Unable to create ip address {} in interface {} for prototype {} - {err}",
                record.ipv4_address.as_deref().unwrap_or("none"),
                interface.name,
                prototype.hostname
            ));
        }
        Ok(())
    }

    fn log_interface_mismatch(
        &self,
        attribute: &str,
        prototype: &DevicePrototype,
        name: &str,
        device: &Device,
    ) {
        self.reporter.log_warning(&format!(
            "{attribute} doesn't match between prototype {} interface {name} and \
             NetBox device {}",
            prototype.hostname, device.name
        ));
    }

    // ── IP addresses ────────────────────────────────────────────────

    fn process_ip_addresses(
        &self,
        prototype: &DevicePrototype,
        record: &InterfaceRecord,
        interface: &Interface,
    ) -> Result<(), CoreError> {
        let management_ip = prototype.raw.device.management_ip_address.as_deref();
        let reported_ip = record.ipv4_address.as_deref().filter(|a| !a.is_empty());

        // Primacy is judged on the bare addresses, before the mask is
        // appended.
        let address_is_primary =
            matches!((management_ip, reported_ip), (Some(m), Some(i)) if m == i);

        let Some(bare) = reported_ip else {
            return Ok(());
        };
        let address = match record.ipv4_mask.as_deref().filter(|m| !m.is_empty()) {
            Some(mask) => {
                net::with_prefix_len(bare, mask).ok_or_else(|| CoreError::MalformedReport {
                    message: format!("unparseable netmask {mask:?}"),
                })?
            }
            None => bare.to_owned(),
        };

        let (mut ip, action) = match self.repository.find_ip_by_address(&address)? {
            None => (
                IpAddress {
                    id: Uuid::new_v4(),
                    address: address.clone(),
                    status: "active".to_owned(),
                    tenant: None,
                    assigned_interface: Some(interface.id),
                },
                ChangeAction::Create,
            ),
            Some(mut found) => {
                match found.assigned_interface {
                    Some(assigned) if assigned != interface.id => {
                        let holder = self.repository.get_interface(assigned)?;
                        self.reporter.log_warning(&format!(
                            "Address {address} for {} already assigned to {}",
                            interface.name, holder.name
                        ));
                    }
                    _ => {
                        found.assigned_interface = Some(interface.id);
                        found.status = "active".to_owned();
                    }
                }
                (found, ChangeAction::Update)
            }
        };

        let device = self.repository.get_device(interface.device)?;
        if ip.tenant.is_none() {
            ip.tenant = device.tenant;
        }
        match action {
            ChangeAction::Create => self.repository.create_ip(&ip)?,
            _ => self.repository.save_ip(&ip)?,
        }
        self.log_change(action, "ipaddress", ip.id, &ip.address)?;

        if address_is_primary {
            let mut device = self.repository.get_device(interface.device)?;
            match device.primary_ip4 {
                Some(primary) if primary != ip.id => {
                    let current = self.repository.get_ip(primary)?;
                    self.reporter.log_warning(&format!(
                        "Primary ipv4 {address} for prototype {} does not match device {} \
                         and {}",
                        prototype.hostname, device.name, current.address
                    ));
                }
                Some(_) => {}
                None => {
                    device.primary_ip4 = Some(ip.id);
                    self.repository.save_device(&device)?;
                    self.log_change(ChangeAction::Update, "device", device.id, &device.name)?;
                }
            }
        }
        Ok(())
    }

    // ── Interface-type inference ────────────────────────────────────

    /// Most frequent template type for an interface name: exact-name
    /// templates first, then templates whose name contains the full
    /// name, then templates whose name contains the name stripped of
    /// digits, slashes, and hyphens. First-seen type wins a tie.
    pub(crate) fn most_common_interface_type(
        &self,
        cache: &mut HashMap<String, Option<String>>,
        name: &str,
    ) -> Result<Option<String>, CoreError> {
        if let Some(cached) = cache.get(name) {
            return Ok(cached.clone());
        }

        let all = self.repository.all_interface_templates()?;
        let lower = name.to_lowercase();

        let mut candidates: Vec<&str> = all
            .iter()
            .filter(|t| t.name == name)
            .map(|t| t.if_type.as_str())
            .collect();
        if candidates.is_empty() {
            candidates = all
                .iter()
                .filter(|t| t.name.to_lowercase().contains(&lower))
                .map(|t| t.if_type.as_str())
                .collect();
        }
        if candidates.is_empty() {
            let base = ifname::interface_base_name(name).to_lowercase();
            candidates = all
                .iter()
                .filter(|t| t.name.to_lowercase().contains(&base))
                .map(|t| t.if_type.as_str())
                .collect();
        }

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for if_type in candidates {
            match counts.iter_mut().find(|(t, _)| *t == if_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((if_type, 1)),
            }
        }
        let result = counts
            .iter()
            .max_by_key(|(_, count)| *count)
            .map(|(if_type, _)| (*if_type).to_owned());

        cache.insert(name.to_owned(), result.clone());
        Ok(result)
    }

    /// Post-import sweep: replace the placeholder "physical" type on
    /// matched devices' interfaces with the most common template type,
    /// and reclassify virtual port-channels as link aggregates.
    pub fn find_missing_interface_types(&self, controller_id: Uuid) -> Result<(), CoreError> {
        let mut cache: HashMap<String, Option<String>> = HashMap::new();

        for prototype in self.repository.prototypes_for_controller(controller_id)? {
            let Some(device_id) = prototype.matching_device else {
                continue;
            };
            for mut interface in self.repository.interfaces_for_device(device_id)? {
                if interface.if_type.eq_ignore_ascii_case("physical") {
                    if let Some(common) =
                        self.most_common_interface_type(&mut cache, &interface.name)?
                    {
                        interface.if_type = common;
                        self.repository.save_interface(&interface)?;
                        self.log_change(
                            ChangeAction::Update,
                            "interface",
                            interface.id,
                            &interface.name,
                        )?;
                    }
                }
                if interface.name.to_lowercase().contains("port-channel")
                    && interface.if_type.eq_ignore_ascii_case("virtual")
                {
                    interface.if_type = "lag".to_owned();
                    self.repository.save_interface(&interface)?;
                    self.log_change(
                        ChangeAction::Update,
                        "interface",
                        interface.id,
                        &interface.name,
                    )?;
                }
            }
        }
        Ok(())
    }
}
