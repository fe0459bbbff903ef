// End-to-end engine scenarios against the in-memory repository, with a
// scripted controller source standing in for the Intent API.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use sdnsync_api::models::{
    CardRecord, ChassisSlot, DeviceRecord, InterfaceRecord, ModuleRecord, StackDetail,
    StackMember, VlanRecord,
};
use sdnsync_core::{
    CollectingReporter, Controller, ControllerKind, ControllerSource, CoreError, Device,
    DeviceType, HostnamePatterns, InventoryRepository, MemoryRepository, Role, Site, SyncEngine,
    SyncStatus,
};

// ── Scripted source ─────────────────────────────────────────────────

/// Controller source that replays canned responses. The device list is
/// shared behind a mutex so a test can change what the controller
/// reports between passes.
#[derive(Default)]
struct ScriptedSource {
    devices: Arc<Mutex<Vec<DeviceRecord>>>,
    interfaces: HashMap<String, Vec<InterfaceRecord>>,
    stacks: HashMap<String, StackDetail>,
}

#[async_trait]
impl ControllerSource for ScriptedSource {
    async fn list_devices(&self, _families: &[String]) -> Result<Vec<DeviceRecord>, CoreError> {
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn list_interfaces(&self, device_id: &str) -> Result<Vec<InterfaceRecord>, CoreError> {
        Ok(self.interfaces.get(device_id).cloned().unwrap_or_default())
    }

    async fn list_vlans(&self, _device_id: &str) -> Result<Vec<VlanRecord>, CoreError> {
        Ok(Vec::new())
    }

    async fn stack_detail(&self, device_id: &str) -> Result<Option<StackDetail>, CoreError> {
        Ok(self.stacks.get(device_id).cloned())
    }

    async fn chassis_slots(&self, _device_id: &str) -> Result<Vec<ChassisSlot>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_modules(&self, _device_id: &str) -> Result<Vec<ModuleRecord>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_linecards(&self, _device_id: &str) -> Result<Vec<CardRecord>, CoreError> {
        Ok(Vec::new())
    }

    async fn list_supervisor_cards(&self, _device_id: &str) -> Result<Vec<CardRecord>, CoreError> {
        Ok(Vec::new())
    }
}

// ── Builders ────────────────────────────────────────────────────────

fn record(
    id: &str,
    hostname: &str,
    serial: Option<&str>,
    management_ip: Option<&str>,
    platform: Option<&str>,
) -> DeviceRecord {
    DeviceRecord {
        id: id.to_owned(),
        instance_uuid: Some(id.to_owned()),
        hostname: Some(hostname.to_owned()),
        management_ip_address: management_ip.map(str::to_owned),
        serial_number: serial.map(str::to_owned),
        platform_id: platform.map(str::to_owned),
        type_name: Some("Cisco Catalyst 9300 Switch".to_owned()),
        family: Some("Switches and Hubs".to_owned()),
        series: None,
        software_version: None,
        software_type: None,
        role: Some("ACCESS".to_owned()),
        reachability_status: Some("Reachable".to_owned()),
        error_code: None,
        error_description: None,
        extra: serde_json::Map::new(),
    }
}

fn iface(name: &str, kind: &str, ipv4: Option<&str>, mask: Option<&str>) -> InterfaceRecord {
    InterfaceRecord {
        id: None,
        port_name: Some(name.to_owned()),
        interface_type: Some(kind.to_owned()),
        ipv4_address: ipv4.map(str::to_owned),
        ipv4_mask: mask.map(str::to_owned),
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

fn stack(device_id: &str, members: &[(&str, u32)]) -> StackDetail {
    StackDetail {
        device_id: Some(device_id.to_owned()),
        stack_switch_info: members
            .iter()
            .map(|(serial, number)| StackMember {
                serial_number: Some((*serial).to_owned()),
                stack_member_number: Some(*number),
                platform_id: None,
                role: None,
                state: Some("READY".to_owned()),
                extra: serde_json::Map::new(),
            })
            .collect(),
        extra: serde_json::Map::new(),
    }
}

fn controller(default_tenant: Option<Uuid>) -> Controller {
    Controller {
        id: Uuid::new_v4(),
        name: "lab".to_owned(),
        hostname: "dnac.lab.example.net".to_owned(),
        kind: ControllerKind::CatalystCenter,
        version: "2.3.7".to_owned(),
        device_families: Vec::new(),
        hostname_patterns: HostnamePatterns::default(),
        default_tenant,
        last_fetch: None,
        last_sync: None,
    }
}

/// Seed a fully-populated inventory device, returning it with the
/// tenant id it was assigned.
fn seeded_device(
    repo: &MemoryRepository,
    serial: &str,
    name: &str,
    device_type: &DeviceType,
) -> (Device, Uuid) {
    let tenant = Uuid::new_v4();
    let site = Site {
        id: Uuid::new_v4(),
        name: "lab-site".to_owned(),
        facility: "LAB".to_owned(),
    };
    let role = Role {
        id: Uuid::new_v4(),
        name: "access-switch".to_owned(),
        custom_fields: serde_json::Map::new(),
    };
    let device = Device {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        serial: serial.to_owned(),
        device_type: Some(device_type.id),
        role: Some(role.id),
        tenant: Some(tenant),
        site: Some(site.id),
        primary_ip4: None,
        tags: Vec::new(),
        module_bay_count: 0,
    };
    repo.add_site(site);
    repo.add_role(role);
    repo.save_device(&device).unwrap();
    (device, tenant)
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_stack_record_splits_into_ranked_units() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() = vec![record(
        "dev-1",
        "core-sw.lab.example.net",
        Some("AAA111,BBB222"),
        Some("10.20.30.40"),
        Some("C9300-24T,C9300-24T"),
    )];
    source
        .stacks
        .insert("dev-1".to_owned(), stack("dev-1", &[("AAA111", 1), ("BBB222", 2)]));
    source.interfaces.insert(
        "dev-1".to_owned(),
        vec![
            iface("GigabitEthernet1/0/1", "Physical", None, None),
            iface("GigabitEthernet2/0/1", "Physical", None, None),
        ],
    );

    let reporter = Arc::new(CollectingReporter::new());
    let engine = SyncEngine::new(source, repo).with_reporter(reporter.clone());

    let report = engine.fetch_and_score(ctrl.id).await.unwrap();
    assert_eq!(report.devices_fetched, 1);
    assert_eq!(report.units_split, 2);
    assert_eq!(report.prototypes_upserted, 2);

    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes.len(), 2);

    let first = &prototypes[0];
    assert_eq!(first.hostname, "core-sw-1");
    assert_eq!(first.serial, "AAA111");
    assert_eq!(first.stack_index, "1");
    assert_eq!(first.management_ip.as_deref(), Some("10.20.30.40"));
    assert!(first.raw.interfaces.contains_key("GigabitEthernet1/0/1"));
    assert!(!first.raw.interfaces.contains_key("GigabitEthernet2/0/1"));

    let second = &prototypes[1];
    assert_eq!(second.hostname, "core-sw-2");
    assert_eq!(second.serial, "BBB222");
    assert_eq!(second.stack_index, "2");
    assert_eq!(second.management_ip, None);
    assert!(second.raw.interfaces.contains_key("GigabitEthernet2/0/1"));
    assert!(!second.raw.interfaces.contains_key("GigabitEthernet1/0/1"));

    assert!(reporter.failures().is_empty());
}

#[tokio::test]
async fn test_repeated_identical_fetch_writes_no_changes() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() = vec![record(
        "dev-1",
        "core-sw.lab.example.net",
        Some("AAA111,BBB222"),
        Some("10.20.30.40"),
        Some("C9300-24T,C9300-24T"),
    )];
    source
        .stacks
        .insert("dev-1".to_owned(), stack("dev-1", &[("AAA111", 1), ("BBB222", 2)]));

    let engine = SyncEngine::new(source, repo).with_user("tester");

    engine.fetch_and_score(ctrl.id).await.unwrap();
    let after_first = engine.repository().changes().unwrap().len();
    assert!(after_first > 0);

    engine.fetch_and_score(ctrl.id).await.unwrap();
    let after_second = engine.repository().changes().unwrap().len();
    assert_eq!(after_second, after_first);
}

#[tokio::test]
async fn test_full_match_scores_ten() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let dt = DeviceType {
        id: Uuid::new_v4(),
        model: "C9300-24T".to_owned(),
        part_number: String::new(),
        manufacturer: "cisco".to_owned(),
    };
    repo.add_device_type(dt.clone(), Vec::new(), Vec::new());
    let (device, _) = seeded_device(&repo, "AAA111", "edge1", &dt);

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() = vec![record(
        "dev-2",
        "edge1.lab.example.net",
        Some("AAA111"),
        Some("10.0.0.5"),
        Some("C9300-24T"),
    )];

    let engine = SyncEngine::new(source, repo);
    engine.fetch_and_score(ctrl.id).await.unwrap();

    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes.len(), 1);
    assert_eq!(prototypes[0].score, 10);
    assert_eq!(prototypes[0].matching_device, Some(device.id));
}

#[tokio::test]
async fn test_unmatchable_record_scores_zero() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() =
        vec![record("dev-3", "mystery.lab.example.net", None, None, None)];

    let engine = SyncEngine::new(source, repo);
    engine.fetch_and_score(ctrl.id).await.unwrap();

    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes.len(), 1);
    assert_eq!(prototypes[0].score, 0);
    assert_eq!(prototypes[0].serial, "");
    assert_eq!(prototypes[0].hostname, "mystery");
    assert_eq!(prototypes[0].matching_device, None);
}

#[tokio::test]
async fn test_deletion_detection_and_resurrection() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let device = record("dev-4", "branch1.lab.example.net", Some("DDD444"), None, None);
    let source = ScriptedSource::default();
    let devices = Arc::clone(&source.devices);
    *devices.lock().unwrap() = vec![device.clone()];

    let engine = SyncEngine::new(source, repo);

    engine.fetch_and_score(ctrl.id).await.unwrap();
    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes[0].sync_status, SyncStatus::Discovered);

    // Controller stops reporting the device: tombstoned, not removed.
    devices.lock().unwrap().clear();
    let report = engine.fetch_and_score(ctrl.id).await.unwrap();
    assert_eq!(report.prototypes_deleted, 1);
    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes.len(), 1);
    assert_eq!(prototypes[0].sync_status, SyncStatus::Deleted);

    // Reported again: the tombstone is resurrected to discovered.
    *devices.lock().unwrap() = vec![device];
    let report = engine.fetch_and_score(ctrl.id).await.unwrap();
    assert_eq!(report.prototypes_deleted, 0);
    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    assert_eq!(prototypes[0].sync_status, SyncStatus::Discovered);
    assert_eq!(report.status_summary.discovered, 1);
    assert_eq!(report.status_summary.deleted, 0);
}

#[tokio::test]
async fn test_partial_fetch_skips_deletion_detection() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let source = ScriptedSource::default();
    let devices = Arc::clone(&source.devices);
    *devices.lock().unwrap() = vec![
        record("dev-5", "alpha.lab.example.net", Some("EEE555"), None, None),
        record("dev-6", "bravo.lab.example.net", Some("FFF666"), None, None),
    ];

    let engine = SyncEngine::new(source, repo);
    engine.fetch_and_score(ctrl.id).await.unwrap();

    let prototypes = engine.repository().prototypes_for_controller(ctrl.id).unwrap();
    let alpha = prototypes.iter().find(|p| p.hostname == "alpha").unwrap();
    let bravo_id = prototypes.iter().find(|p| p.hostname == "bravo").unwrap().id;

    // Import bravo with a preceding filtered fetch; alpha is not part
    // of that pass but must not be tombstoned by it.
    engine.import_selected(ctrl.id, &[bravo_id], true).await.unwrap();

    let refreshed = engine.repository().get_prototype(alpha.id).unwrap();
    assert_eq!(refreshed.sync_status, SyncStatus::Discovered);
}

#[tokio::test]
async fn test_import_rejects_incomplete_prototype() {
    let repo = MemoryRepository::new();
    let ctrl = controller(None);
    repo.save_controller(&ctrl).unwrap();

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() =
        vec![record("dev-7", "lonely.lab.example.net", Some("GGG777"), None, None)];

    let reporter = Arc::new(CollectingReporter::new());
    let engine = SyncEngine::new(source, repo).with_reporter(reporter.clone());

    engine.fetch_and_score(ctrl.id).await.unwrap();
    let prototype = engine
        .repository()
        .prototypes_for_controller(ctrl.id)
        .unwrap()
        .remove(0);

    let ok = engine.import_selected(ctrl.id, &[prototype.id], false).await.unwrap();
    assert!(!ok);

    let refreshed = engine.repository().get_prototype(prototype.id).unwrap();
    assert_eq!(refreshed.sync_status, SyncStatus::Discovered);
    assert!(reporter
        .failures()
        .iter()
        .any(|m| m == "Prototype lonely does not have required field role"));
    assert!(engine.repository().find_device_by_name("lonely").unwrap().is_none());
}

#[tokio::test]
async fn test_import_of_complete_prototype_reaches_imported() {
    let repo = MemoryRepository::new();

    let dt = DeviceType {
        id: Uuid::new_v4(),
        model: "C9300-24T".to_owned(),
        part_number: String::new(),
        manufacturer: "cisco".to_owned(),
    };
    repo.add_device_type(dt.clone(), Vec::new(), Vec::new());
    let (device, tenant) = seeded_device(&repo, "AAA111", "edge1", &dt);

    let ctrl = controller(Some(tenant));
    repo.save_controller(&ctrl).unwrap();

    let mut source = ScriptedSource::default();
    *source.devices.lock().unwrap() = vec![record(
        "dev-8",
        "edge1.lab.example.net",
        Some("AAA111"),
        Some("10.0.0.5"),
        Some("C9300-24T"),
    )];
    source.interfaces.insert(
        "dev-8".to_owned(),
        vec![
            iface("GigabitEthernet1/0/1", "Physical", None, None),
            iface("Vlan100", "Virtual", Some("10.0.0.5"), Some("255.255.255.0")),
        ],
    );

    let reporter = Arc::new(CollectingReporter::new());
    let engine = SyncEngine::new(source, repo).with_reporter(reporter.clone());

    engine.fetch_and_score(ctrl.id).await.unwrap();
    let prototype = engine
        .repository()
        .prototypes_for_controller(ctrl.id)
        .unwrap()
        .remove(0);
    assert_eq!(prototype.matching_device, Some(device.id));

    let ok = engine.import_selected(ctrl.id, &[prototype.id], false).await.unwrap();
    assert!(ok, "failures: {:?}", reporter.failures());

    let refreshed = engine.repository().get_prototype(prototype.id).unwrap();
    assert_eq!(refreshed.sync_status, SyncStatus::Imported);
    assert!(refreshed.tags.contains(&"Catalyst Center".to_owned()));

    let device = engine.repository().get_device(device.id).unwrap();
    assert_eq!(device.primary_ip4, refreshed.primary_ip4);
    assert!(device.tags.contains(&"Catalyst Center".to_owned()));

    let names: Vec<String> = engine
        .repository()
        .interfaces_for_device(device.id)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert!(names.contains(&"GigabitEthernet1/0/1".to_owned()));
    assert!(names.contains(&"Vlan100".to_owned()));

    let summary = engine.status_summary(ctrl.id).unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.discovered, 0);
}
