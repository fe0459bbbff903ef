// ── Device splitter ──
//
// A controller "device" record may stand for a whole stack or chassis:
// its serial and platform fields are then comma-separated lists, one
// entry per physical unit. The splitter explodes such records into one
// synthetic unit per serial, resolving each unit's rank from the stack
// or chassis enumeration, so the rest of the pipeline can treat every
// unit as an independent device.

use indexmap::IndexMap;

use sdnsync_api::models::DeviceRecord;

use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::model::Controller;
use crate::repository::InventoryRepository;
use crate::source::ControllerSource;

/// One physical unit carved out of a controller device record.
///
/// `device` is a copy of the parent record with per-unit fields
/// rewritten: serial and platform ID reduced to this unit's entry,
/// hostname suffixed with the rank, management IP cleared for every
/// unit but the first.
#[derive(Debug, Clone)]
pub(crate) struct SplitUnit {
    pub device: DeviceRecord,
    pub rank: u32,
    pub total_units: usize,
    pub is_multiple: bool,
    /// serial → unit rank for the whole stack/chassis.
    pub stack_info: IndexMap<String, u32>,
}

/// Controller-assigned identity of a device record.
///
/// Falls back to the record id, which the controller keeps equal to the
/// instance UUID.
pub(crate) fn instance_identity(record: &DeviceRecord) -> &str {
    record.instance_uuid.as_deref().unwrap_or(&record.id)
}

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Fetch the controller's device list and explode every stack or
    /// chassis record into per-unit records.
    ///
    /// `filter` restricts the result to the given instance UUIDs (used
    /// by the partial fetch that precedes a selective import). Records
    /// of the unsupported "nexus" platform line are skipped.
    pub(crate) async fn split_device_list(
        &self,
        controller: &Controller,
        filter: Option<&[String]>,
    ) -> Result<Vec<SplitUnit>, CoreError> {
        let records = self.source.list_devices(&controller.device_families).await?;

        let mut units = Vec::new();
        for record in records {
            if record
                .type_name
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains("nexus"))
            {
                continue;
            }
            if let Some(wanted) = filter {
                let identity = instance_identity(&record);
                if !wanted.iter().any(|id| id == identity) {
                    continue;
                }
            }

            let mut record = record;
            let base_hostname = record
                .hostname
                .as_deref()
                .unwrap_or_default()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_owned();
            record.hostname = Some(base_hostname.clone());

            let serials: Vec<String> = record
                .serial_number
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();

            if serials.is_empty() {
                self.split_without_serials(&record, &base_hostname, &mut units)
                    .await?;
            } else {
                self.split_by_serials(&record, &base_hostname, &serials, &mut units)
                    .await?;
            }
        }
        Ok(units)
    }

    /// One unit per serial, ranked by the stack/chassis enumeration.
    async fn split_by_serials(
        &self,
        record: &DeviceRecord,
        base_hostname: &str,
        serials: &[String],
        units: &mut Vec<SplitUnit>,
    ) -> Result<(), CoreError> {
        let is_multiple = serials.len() > 1;
        let stack_info = if is_multiple {
            self.unit_rank_index(&record.id).await?
        } else {
            IndexMap::from([(serials[0].clone(), 1)])
        };

        let platforms: Vec<String> = record
            .platform_id
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();

        for (index, serial) in serials.iter().enumerate() {
            let rank = match stack_info.get(serial) {
                Some(rank) => *rank,
                None => {
                    // Controller reported a serial the stack/chassis
                    // enumeration does not know; fall back to list order.
                    let fallback = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
                    self.reporter.log_warning(&format!(
                        "Serial {serial} of {base_hostname} missing from stack \
                         enumeration; assuming unit {fallback}"
                    ));
                    fallback
                }
            };

            let mut unit = record.clone();
            unit.serial_number = Some(serial.clone());
            unit.platform_id = platforms.get(index).or_else(|| platforms.last()).cloned();
            if rank > 1 {
                // Only the first unit keeps the chassis's management IP.
                unit.management_ip_address = None;
            }
            if is_multiple {
                unit.hostname = Some(format!("{base_hostname}-{rank}"));
            }

            units.push(SplitUnit {
                device: unit,
                rank,
                total_units: serials.len(),
                is_multiple,
                stack_info: stack_info.clone(),
            });
        }
        Ok(())
    }

    /// Units for a record with no serial at all: synthesize
    /// max(stack length, chassis length, 1) units with empty serials.
    async fn split_without_serials(
        &self,
        record: &DeviceRecord,
        base_hostname: &str,
        units: &mut Vec<SplitUnit>,
    ) -> Result<(), CoreError> {
        let stack_len = self
            .source
            .stack_detail(&record.id)
            .await?
            .map(|detail| detail.stack_switch_info.len())
            .unwrap_or(0);
        let chassis_len = self.source.chassis_slots(&record.id).await?.len();
        let count = stack_len.max(chassis_len).max(1);
        let is_multiple = count > 1;

        for index in 1..=count {
            let rank = u32::try_from(index).unwrap_or(u32::MAX);
            let mut unit = record.clone();
            unit.serial_number = None;
            if is_multiple {
                unit.hostname = Some(format!("{base_hostname}-{rank}"));
            }
            if rank > 1 {
                unit.management_ip_address = None;
            }
            units.push(SplitUnit {
                device: unit,
                rank,
                total_units: count,
                is_multiple,
                stack_info: IndexMap::new(),
            });
        }
        Ok(())
    }

    /// serial → unit rank, preferring the stack-member enumeration and
    /// falling back to chassis-slot names.
    async fn unit_rank_index(&self, record_id: &str) -> Result<IndexMap<String, u32>, CoreError> {
        let mut index = IndexMap::new();

        let stack = self.source.stack_detail(record_id).await?;
        let members = stack
            .map(|detail| detail.stack_switch_info)
            .unwrap_or_default();

        if members.is_empty() {
            for slot in self.source.chassis_slots(record_id).await? {
                let Some(serial) = slot.serial_number.as_deref().map(str::trim) else {
                    continue;
                };
                let digits: String = slot
                    .name
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                match digits.parse::<u32>() {
                    Ok(rank) => {
                        index.insert(serial.to_owned(), rank);
                    }
                    Err(_) => {
                        self.reporter.log_warning(&format!(
                            "Chassis slot {:?} of device {record_id} has no slot number; \
                             skipping it",
                            slot.name.as_deref().unwrap_or_default()
                        ));
                    }
                }
            }
        } else {
            for member in members {
                let Some(serial) = member.serial_number.as_deref().map(str::trim) else {
                    continue;
                };
                let Some(rank) = member.stack_member_number else {
                    self.reporter.log_warning(&format!(
                        "Stack member {serial} of device {record_id} has no member \
                         number; skipping it"
                    ));
                    continue;
                };
                index.insert(serial.to_owned(), rank);
            }
        }

        Ok(index)
    }
}
