// ── Module position resolver ──
//
// Controllers report modules with free-form names; the inventory seats
// them in bays named "Switch <s> Module <m>". This stage resolves each
// module's switch and slot number, preferring the authoritative
// line/supervisor card detail and falling back to parsing the module
// name. A module whose position resolves completely has its working
// name rewritten to the bay-name form.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use sdnsync_api::models::{CardRecord, DeviceRecord};

use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::ifname;
use crate::model::PositionedModule;
use crate::repository::InventoryRepository;
use crate::source::ControllerSource;

static SPA_SUBSLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SPA subslot (\d+)/([1-9]\d*)").expect("SPA subslot pattern is valid")
});

/// Positioned modules and card detail for one controller device id.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceHardware {
    /// Line/supervisor cards keyed by serial.
    pub cards: IndexMap<String, CardRecord>,
    /// All modules with a usable serial, positions resolved where possible.
    pub modules: Vec<PositionedModule>,
}

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Fetch a device's modules and cards and resolve their positions.
    ///
    /// Modules whose serial is too short to be real (placeholder values
    /// of one to three characters) are dropped. `is_multiple` and
    /// `total_units` come from the splitter: a single-unit device pins
    /// every unplaced module to switch 1, and a device whose unit count
    /// equals its module count is assumed to carry one module per unit
    /// in slot 1.
    pub(crate) async fn extract_module_positions(
        &self,
        record: &DeviceRecord,
        is_multiple: bool,
        total_units: usize,
    ) -> Result<DeviceHardware, CoreError> {
        let reported = self.source.list_modules(&record.id).await?;
        let linecards = self.source.list_linecards(&record.id).await?;
        let supervisors = self.source.list_supervisor_cards(&record.id).await?;

        let mut cards = IndexMap::new();
        for card in linecards.into_iter().chain(supervisors) {
            if let Some(serial) = card.serialno.clone() {
                cards.insert(serial, card);
            }
        }

        let with_serial: Vec<_> = reported
            .into_iter()
            .filter(|m| m.serial_number.as_deref().is_some_and(|s| s.len() > 3))
            .collect();
        let module_count = with_serial.len();

        let mut modules = Vec::with_capacity(module_count);
        for mut module in with_serial {
            let name = module.name.clone().unwrap_or_default();
            let serial = module.serial_number.as_deref().unwrap_or_default();

            let mut switch_number: Option<String> = None;
            let mut slot_number: Option<String> = None;

            if let Some(card) = cards.get(serial) {
                switch_number = Some(
                    card.switchno
                        .as_deref()
                        .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                        .unwrap_or("1")
                        .to_owned(),
                );
                if let Some(slot) = card
                    .slotno
                    .as_deref()
                    .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                {
                    slot_number = Some(slot.to_owned());
                } else if let Some(captures) = SPA_SUBSLOT_RE.captures(&name) {
                    switch_number = Some(captures[1].to_owned());
                    slot_number = Some(captures[2].to_owned());
                }
            } else {
                switch_number = if is_multiple {
                    ifname::extract_chassis_number(&name).map(|n| n.to_string())
                } else {
                    Some("1".to_owned())
                };
                slot_number = ifname::extract_slot_or_module_number(&name).map(|n| n.to_string());

                if switch_number.is_some() && slot_number.is_none() && total_units == module_count {
                    slot_number = Some("1".to_owned());
                }
            }

            if let (Some(switch), Some(slot)) = (&switch_number, &slot_number) {
                module.name = Some(format!("Switch {switch} Module {slot}"));
            }

            modules.push(PositionedModule {
                record: module,
                reported_name: name,
                switch_number,
                slot_number,
            });
        }

        Ok(DeviceHardware { cards, modules })
    }
}
