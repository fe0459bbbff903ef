// ── In-memory inventory store ──
//
// Lock-free concurrent storage backed by `DashMap`, one map per entity
// type. Filtered scans collect and sort by a natural key (usually the
// name) so "first match" queries are deterministic, mirroring the
// default orderings of the inventory system this models.

use std::net::Ipv4Addr;
use std::sync::Mutex;

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{
    Controller, Device, DevicePrototype, DeviceType, Interface, InterfaceTemplate, IpAddress,
    MacAddressRecord, Module, ModuleBay, ModuleBayTemplate, ModuleType, Prefix, Role, Site,
};
use crate::net;
use crate::repository::{ChangeEntry, InventoryRepository};

/// Repository implementation holding everything in process memory.
///
/// Ships as the default backend for tests and single-process runs.
/// Creation of devices and modules materializes template interfaces
/// and bays, placeholder names included, the way the modeled inventory
/// system does it.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    controllers: DashMap<Uuid, Controller>,
    prototypes: DashMap<Uuid, DevicePrototype>,
    devices: DashMap<Uuid, Device>,
    device_types: DashMap<Uuid, DeviceType>,
    device_type_interfaces: DashMap<Uuid, Vec<InterfaceTemplate>>,
    device_type_bays: DashMap<Uuid, Vec<ModuleBayTemplate>>,
    module_types: DashMap<Uuid, ModuleType>,
    module_type_interfaces: DashMap<Uuid, Vec<InterfaceTemplate>>,
    interfaces: DashMap<Uuid, Interface>,
    module_bays: DashMap<Uuid, ModuleBay>,
    modules: DashMap<Uuid, Module>,
    macs: DashMap<Uuid, MacAddressRecord>,
    ips: DashMap<Uuid, IpAddress>,
    prefixes: DashMap<Uuid, Prefix>,
    sites: DashMap<Uuid, Site>,
    roles: DashMap<Uuid, Role>,
    changes: Mutex<Vec<ChangeEntry>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding (catalog data the engine never creates) ──

    /// Register a device type with its interface and bay templates.
    pub fn add_device_type(
        &self,
        device_type: DeviceType,
        interfaces: Vec<InterfaceTemplate>,
        bays: Vec<ModuleBayTemplate>,
    ) {
        self.device_type_interfaces.insert(device_type.id, interfaces);
        self.device_type_bays.insert(device_type.id, bays);
        self.device_types.insert(device_type.id, device_type);
    }

    /// Register a module type with its interface templates.
    pub fn add_module_type(&self, module_type: ModuleType, interfaces: Vec<InterfaceTemplate>) {
        self.module_type_interfaces.insert(module_type.id, interfaces);
        self.module_types.insert(module_type.id, module_type);
    }

    pub fn add_site(&self, site: Site) {
        self.sites.insert(site.id, site);
    }

    pub fn add_role(&self, role: Role) {
        self.roles.insert(role.id, role);
    }

    pub fn add_prefix(&self, prefix: Prefix) {
        self.prefixes.insert(prefix.id, prefix);
    }

    fn sorted_devices(&self) -> Vec<Device> {
        let mut all: Vec<Device> = self.devices.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn sorted_prototypes(&self, controller: Uuid) -> Vec<DevicePrototype> {
        let mut all: Vec<DevicePrototype> = self
            .prototypes
            .iter()
            .filter(|r| r.value().controller == controller)
            .map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| (&a.hostname, &a.serial).cmp(&(&b.hostname, &b.serial)));
        all
    }

    /// Keeps the denormalized bay count in step with bay writes.
    fn refresh_bay_count(&self, device: Uuid) {
        let count = self
            .module_bays
            .iter()
            .filter(|r| r.value().device == device)
            .count();
        if let Some(mut record) = self.devices.get_mut(&device) {
            record.value_mut().module_bay_count = count;
        }
    }
}

/// Sort key for containment results: network address, then length.
fn prefix_sort_key(prefix: &str) -> (u32, u8) {
    let network = prefix
        .split('/')
        .next()
        .and_then(|n| n.trim().parse::<Ipv4Addr>().ok())
        .map_or(0, u32::from);
    (network, net::prefix_len(prefix).unwrap_or(0))
}

impl InventoryRepository for MemoryRepository {
    // ── Controllers ──

    fn get_controller(&self, id: Uuid) -> Result<Controller, CoreError> {
        self.controllers
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::ControllerNotFound {
                identifier: id.to_string(),
            })
    }

    fn save_controller(&self, controller: &Controller) -> Result<(), CoreError> {
        self.controllers.insert(controller.id, controller.clone());
        Ok(())
    }

    // ── Prototypes ──

    fn get_prototype(&self, id: Uuid) -> Result<DevicePrototype, CoreError> {
        self.prototypes
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::PrototypeNotFound {
                identifier: id.to_string(),
            })
    }

    fn find_prototype(
        &self,
        controller: Uuid,
        instance_uuid: &str,
        serial: &str,
    ) -> Result<Option<DevicePrototype>, CoreError> {
        Ok(self
            .sorted_prototypes(controller)
            .into_iter()
            .find(|p| p.instance_uuid == instance_uuid && p.serial == serial))
    }

    fn prototypes_for_controller(
        &self,
        controller: Uuid,
    ) -> Result<Vec<DevicePrototype>, CoreError> {
        Ok(self.sorted_prototypes(controller))
    }

    fn prototypes_by_instance(
        &self,
        controller: Uuid,
        instance_uuid: &str,
    ) -> Result<Vec<DevicePrototype>, CoreError> {
        Ok(self
            .sorted_prototypes(controller)
            .into_iter()
            .filter(|p| p.instance_uuid == instance_uuid)
            .collect())
    }

    fn save_prototype(&self, prototype: &DevicePrototype) -> Result<(), CoreError> {
        self.prototypes.insert(prototype.id, prototype.clone());
        Ok(())
    }

    // ── Devices ──

    fn get_device(&self, id: Uuid) -> Result<Device, CoreError> {
        self.devices
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::not_found("device", id))
    }

    fn find_device_by_serial(&self, serial: &str) -> Result<Option<Device>, CoreError> {
        Ok(self.sorted_devices().into_iter().find(|d| d.serial == serial))
    }

    fn find_device_by_name(&self, name: &str) -> Result<Option<Device>, CoreError> {
        Ok(self.sorted_devices().into_iter().find(|d| d.name == name))
    }

    fn find_device_by_name_contains(&self, fragment: &str) -> Result<Option<Device>, CoreError> {
        let fragment = fragment.to_lowercase();
        Ok(self
            .sorted_devices()
            .into_iter()
            .find(|d| d.name.to_lowercase().contains(&fragment)))
    }

    fn find_device_by_primary_ip(&self, ip: Uuid) -> Result<Option<Device>, CoreError> {
        Ok(self
            .sorted_devices()
            .into_iter()
            .find(|d| d.primary_ip4 == Some(ip)))
    }

    fn devices_by_role(&self, role: Uuid) -> Result<Vec<Device>, CoreError> {
        Ok(self
            .sorted_devices()
            .into_iter()
            .filter(|d| d.role == Some(role))
            .collect())
    }

    fn create_device(&self, device: &Device) -> Result<(), CoreError> {
        let mut device = device.clone();

        // Materialize the type's templates, placeholders intact.
        if let Some(type_id) = device.device_type {
            let templates = self
                .device_type_interfaces
                .get(&type_id)
                .map(|r| r.value().clone())
                .unwrap_or_default();
            for template in templates {
                let id = Uuid::new_v4();
                self.interfaces.insert(
                    id,
                    Interface {
                        id,
                        device: device.id,
                        name: template.name,
                        if_type: template.if_type,
                        speed: None,
                        description: String::new(),
                        duplex: None,
                        mode: None,
                        module: None,
                        cable: None,
                        primary_mac_address: None,
                    },
                );
            }
            let bays = self
                .device_type_bays
                .get(&type_id)
                .map(|r| r.value().clone())
                .unwrap_or_default();
            device.module_bay_count = bays.len();
            for template in bays {
                let id = Uuid::new_v4();
                self.module_bays.insert(
                    id,
                    ModuleBay {
                        id,
                        device: device.id,
                        name: template.name,
                        position: template.position,
                        description: String::new(),
                    },
                );
            }
        }

        self.devices.insert(device.id, device);
        Ok(())
    }

    fn save_device(&self, device: &Device) -> Result<(), CoreError> {
        self.devices.insert(device.id, device.clone());
        Ok(())
    }

    // ── Device types & templates ──

    fn get_device_type(&self, id: Uuid) -> Result<DeviceType, CoreError> {
        self.device_types
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::not_found("device type", id))
    }

    fn find_device_type_by_model(&self, model: &str) -> Result<Option<DeviceType>, CoreError> {
        let mut all: Vec<DeviceType> = self.device_types.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(all.into_iter().find(|t| t.model == model))
    }

    fn find_device_type_by_part_number(
        &self,
        part_number: &str,
    ) -> Result<Option<DeviceType>, CoreError> {
        let mut all: Vec<DeviceType> = self.device_types.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(all.into_iter().find(|t| t.part_number == part_number))
    }

    fn interface_templates_for_device_type(
        &self,
        device_type: Uuid,
    ) -> Result<Vec<InterfaceTemplate>, CoreError> {
        Ok(self
            .device_type_interfaces
            .get(&device_type)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    fn all_interface_templates(&self) -> Result<Vec<InterfaceTemplate>, CoreError> {
        let mut all: Vec<InterfaceTemplate> = self
            .device_type_interfaces
            .iter()
            .chain(self.module_type_interfaces.iter())
            .flat_map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    // ── Module types ──

    fn find_module_type_by_model(&self, model: &str) -> Result<Option<ModuleType>, CoreError> {
        let mut all: Vec<ModuleType> = self.module_types.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(all.into_iter().find(|t| t.model == model))
    }

    fn find_module_type_by_part_number(
        &self,
        part_number: &str,
    ) -> Result<Option<ModuleType>, CoreError> {
        let mut all: Vec<ModuleType> = self.module_types.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(all.into_iter().find(|t| t.part_number == part_number))
    }

    // ── Interfaces ──

    fn get_interface(&self, id: Uuid) -> Result<Interface, CoreError> {
        self.interfaces
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::not_found("interface", id))
    }

    fn interfaces_for_device(&self, device: Uuid) -> Result<Vec<Interface>, CoreError> {
        let mut all: Vec<Interface> = self
            .interfaces
            .iter()
            .filter(|r| r.value().device == device)
            .map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn find_interface_by_name(
        &self,
        device: Uuid,
        name: &str,
    ) -> Result<Option<Interface>, CoreError> {
        Ok(self
            .interfaces_for_device(device)?
            .into_iter()
            .find(|i| i.name.eq_ignore_ascii_case(name)))
    }

    fn create_interface(&self, interface: &Interface) -> Result<(), CoreError> {
        self.interfaces.insert(interface.id, interface.clone());
        Ok(())
    }

    fn save_interface(&self, interface: &Interface) -> Result<(), CoreError> {
        self.interfaces.insert(interface.id, interface.clone());
        Ok(())
    }

    fn delete_interface(&self, id: Uuid) -> Result<(), CoreError> {
        self.interfaces.remove(&id);
        // References behave like ON DELETE SET NULL.
        for mut ip in self.ips.iter_mut() {
            if ip.value().assigned_interface == Some(id) {
                ip.value_mut().assigned_interface = None;
            }
        }
        for mut mac in self.macs.iter_mut() {
            if mac.value().assigned_interface == Some(id) {
                mac.value_mut().assigned_interface = None;
            }
        }
        Ok(())
    }

    // ── Module bays ──

    fn module_bays_for_device(&self, device: Uuid) -> Result<Vec<ModuleBay>, CoreError> {
        let mut all: Vec<ModuleBay> = self
            .module_bays
            .iter()
            .filter(|r| r.value().device == device)
            .map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn create_module_bay(&self, bay: &ModuleBay) -> Result<(), CoreError> {
        self.module_bays.insert(bay.id, bay.clone());
        self.refresh_bay_count(bay.device);
        Ok(())
    }

    fn save_module_bay(&self, bay: &ModuleBay) -> Result<(), CoreError> {
        self.module_bays.insert(bay.id, bay.clone());
        Ok(())
    }

    fn delete_module_bay(&self, id: Uuid) -> Result<(), CoreError> {
        let owner = self.module_bays.remove(&id).map(|(_, bay)| bay.device);
        // A seated module goes with its bay.
        let seated: Vec<Uuid> = self
            .modules
            .iter()
            .filter(|r| r.value().module_bay == id)
            .map(|r| r.value().id)
            .collect();
        for module_id in seated {
            self.modules.remove(&module_id);
            for mut interface in self.interfaces.iter_mut() {
                if interface.value().module == Some(module_id) {
                    interface.value_mut().module = None;
                }
            }
        }
        if let Some(device) = owner {
            self.refresh_bay_count(device);
        }
        Ok(())
    }

    // ── Modules ──

    fn find_module_by_bay(&self, bay: Uuid) -> Result<Option<Module>, CoreError> {
        Ok(self
            .modules
            .iter()
            .find(|r| r.value().module_bay == bay)
            .map(|r| r.value().clone()))
    }

    fn create_module(&self, module: &Module) -> Result<(), CoreError> {
        let bay_position = self
            .module_bays
            .get(&module.module_bay)
            .and_then(|b| b.value().position.clone())
            .unwrap_or_default();

        let templates = self
            .module_type_interfaces
            .get(&module.module_type)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        for template in templates {
            let name = template.name.replace("{module}", &bay_position);

            // An interface already present under the materialized name
            // is adopted by the module instead of duplicated.
            let adopted = self
                .interfaces
                .iter_mut()
                .find(|r| {
                    r.value().device == module.device && r.value().name.eq_ignore_ascii_case(&name)
                })
                .map(|mut r| r.value_mut().module = Some(module.id));
            if adopted.is_some() {
                continue;
            }

            let id = Uuid::new_v4();
            self.interfaces.insert(
                id,
                Interface {
                    id,
                    device: module.device,
                    name,
                    if_type: template.if_type,
                    speed: None,
                    description: String::new(),
                    duplex: None,
                    mode: None,
                    module: Some(module.id),
                    cable: None,
                    primary_mac_address: None,
                },
            );
        }

        self.modules.insert(module.id, module.clone());
        Ok(())
    }

    fn save_module(&self, module: &Module) -> Result<(), CoreError> {
        self.modules.insert(module.id, module.clone());
        Ok(())
    }

    // ── MAC addresses ──

    fn get_mac(&self, id: Uuid) -> Result<MacAddressRecord, CoreError> {
        self.macs
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::not_found("mac address", id))
    }

    fn find_mac(&self, mac: &str) -> Result<Option<MacAddressRecord>, CoreError> {
        let mut all: Vec<MacAddressRecord> = self.macs.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.mac.cmp(&b.mac));
        Ok(all.into_iter().find(|m| m.mac == mac))
    }

    fn create_mac(&self, mac: &MacAddressRecord) -> Result<(), CoreError> {
        self.macs.insert(mac.id, mac.clone());
        Ok(())
    }

    // ── IP addresses ──

    fn get_ip(&self, id: Uuid) -> Result<IpAddress, CoreError> {
        self.ips
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::not_found("ip address", id))
    }

    fn find_ip_by_address(&self, address: &str) -> Result<Option<IpAddress>, CoreError> {
        let mut all: Vec<IpAddress> = self.ips.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(all.into_iter().find(|ip| ip.address == address))
    }

    fn find_ip_starting_with(&self, prefix: &str) -> Result<Option<IpAddress>, CoreError> {
        let mut all: Vec<IpAddress> = self.ips.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(all.into_iter().find(|ip| ip.address.starts_with(prefix)))
    }

    fn create_ip(&self, ip: &IpAddress) -> Result<(), CoreError> {
        self.ips.insert(ip.id, ip.clone());
        Ok(())
    }

    fn save_ip(&self, ip: &IpAddress) -> Result<(), CoreError> {
        self.ips.insert(ip.id, ip.clone());
        Ok(())
    }

    // ── Prefixes, sites, roles ──

    fn prefixes_containing(&self, address: &str) -> Result<Vec<Prefix>, CoreError> {
        let mut containing: Vec<Prefix> = self
            .prefixes
            .iter()
            .filter(|r| net::prefix_contains(&r.value().prefix, address))
            .map(|r| r.value().clone())
            .collect();
        containing.sort_by_key(|p| prefix_sort_key(&p.prefix));
        Ok(containing)
    }

    fn find_site_by_facility(&self, facility: &str) -> Result<Option<Site>, CoreError> {
        let mut all: Vec<Site> = self.sites.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all
            .into_iter()
            .find(|s| s.facility.eq_ignore_ascii_case(facility)))
    }

    fn roles_with_facility(&self, facility: &str) -> Result<Vec<Role>, CoreError> {
        let mut matching: Vec<Role> = self
            .roles
            .iter()
            .filter(|r| {
                r.value()
                    .custom_fields
                    .get("facility")
                    .and_then(|v| v.as_str())
                    .is_some_and(|v| v == facility)
            })
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }

    // ── Change log ──

    fn record_change(&self, entry: ChangeEntry) -> Result<(), CoreError> {
        self.changes
            .lock()
            .expect("change log lock poisoned")
            .push(entry);
        Ok(())
    }

    fn changes(&self) -> Result<Vec<ChangeEntry>, CoreError> {
        Ok(self.changes.lock().expect("change log lock poisoned").clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn device_type(model: &str) -> DeviceType {
        DeviceType {
            id: Uuid::new_v4(),
            model: model.to_owned(),
            part_number: String::new(),
            manufacturer: "cisco".to_owned(),
        }
    }

    #[test]
    fn test_create_device_materializes_templates() {
        let repo = MemoryRepository::new();
        let dt = device_type("C9300-24T");
        repo.add_device_type(
            dt.clone(),
            vec![
                InterfaceTemplate {
                    name: "GigabitEthernet{chassis}/0/1".to_owned(),
                    if_type: "1000base-t".to_owned(),
                },
                InterfaceTemplate {
                    name: "GigabitEthernet{chassis}/0/2".to_owned(),
                    if_type: "1000base-t".to_owned(),
                },
            ],
            vec![ModuleBayTemplate {
                name: "Switch {chassis} Uplink 1".to_owned(),
                position: Some("1".to_owned()),
            }],
        );

        let device = Device {
            id: Uuid::new_v4(),
            name: "sw1".to_owned(),
            serial: "AAA111".to_owned(),
            device_type: Some(dt.id),
            role: None,
            tenant: None,
            site: None,
            primary_ip4: None,
            tags: Vec::new(),
            module_bay_count: 0,
        };
        repo.create_device(&device).unwrap();

        let interfaces = repo.interfaces_for_device(device.id).unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].name, "GigabitEthernet{chassis}/0/1");

        let bays = repo.module_bays_for_device(device.id).unwrap();
        assert_eq!(bays.len(), 1);
        assert_eq!(repo.get_device(device.id).unwrap().module_bay_count, 1);
    }

    #[test]
    fn test_create_module_resolves_module_placeholder() {
        let repo = MemoryRepository::new();
        let dt = device_type("C9400");
        repo.add_device_type(dt.clone(), Vec::new(), Vec::new());
        let mt = ModuleType {
            id: Uuid::new_v4(),
            model: "C9400-LC-48T".to_owned(),
            part_number: String::new(),
        };
        repo.add_module_type(
            mt.clone(),
            vec![InterfaceTemplate {
                name: "GigabitEthernet{chassis}/{module}/1".to_owned(),
                if_type: "1000base-t".to_owned(),
            }],
        );

        let device = Device {
            id: Uuid::new_v4(),
            name: "core1".to_owned(),
            serial: "BBB222".to_owned(),
            device_type: Some(dt.id),
            role: None,
            tenant: None,
            site: None,
            primary_ip4: None,
            tags: Vec::new(),
            module_bay_count: 0,
        };
        repo.create_device(&device).unwrap();

        let bay = ModuleBay {
            id: Uuid::new_v4(),
            device: device.id,
            name: "Slot 3".to_owned(),
            position: Some("3".to_owned()),
            description: String::new(),
        };
        repo.create_module_bay(&bay).unwrap();

        let module = Module {
            id: Uuid::new_v4(),
            device: device.id,
            module_bay: bay.id,
            module_type: mt.id,
            status: "active".to_owned(),
            serial: "MOD333".to_owned(),
            description: String::new(),
        };
        repo.create_module(&module).unwrap();

        let interfaces = repo.interfaces_for_device(device.id).unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].name, "GigabitEthernet{chassis}/3/1");
        assert_eq!(interfaces[0].module, Some(module.id));
    }

    #[test]
    fn test_prefix_containment_ordering() {
        let repo = MemoryRepository::new();
        let site = Site {
            id: Uuid::new_v4(),
            name: "mtl".to_owned(),
            facility: "MTL".to_owned(),
        };
        repo.add_site(site.clone());
        repo.add_prefix(Prefix {
            id: Uuid::new_v4(),
            prefix: "10.20.0.0/16".to_owned(),
            site: Some(site.id),
        });
        repo.add_prefix(Prefix {
            id: Uuid::new_v4(),
            prefix: "10.0.0.0/8".to_owned(),
            site: None,
        });

        let containing = repo.prefixes_containing("10.20.30.40").unwrap();
        assert_eq!(containing.len(), 2);
        assert_eq!(containing[0].prefix, "10.0.0.0/8");
        assert_eq!(containing[1].prefix, "10.20.0.0/16");
    }
}
