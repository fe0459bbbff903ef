// ── Validation gate ──
//
// Decides whether a prototype may carry the imported status. Validation
// is stack-wide: every sibling sharing the instance UUID is checked, and
// one failing unit fails the whole stack's current pass. The same gate
// runs twice per import attempt — once before inventory is touched and
// once, stricter, after bays and interfaces are written.
//
// Failure messages are deduplicated across the whole batch through the
// run context; a message raised once is not logged twice unless the
// engine was built with log_all_errors.

use uuid::Uuid;

use crate::context::RunContext;
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::ifname;
use crate::model::{Controller, Device, DevicePrototype};
use crate::repository::InventoryRepository;
use crate::source::ControllerSource;

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Stack-wide validation of one prototype.
    ///
    /// With `after_modules` the post-import checks also run: every
    /// existing interface and module bay of the matching device must be
    /// accounted for by the prototype's report. Returns whether the
    /// whole stack passed.
    pub(crate) fn validate_prototype(
        &self,
        controller: &Controller,
        prototype: &DevicePrototype,
        ctx: &mut RunContext,
        log_all_errors: bool,
        after_modules: bool,
    ) -> Result<bool, CoreError> {
        let mut ok = true;

        for sibling in self
            .repository
            .prototypes_by_instance(controller.id, &prototype.instance_uuid)?
        {
            if !self.validate_one(&sibling, ctx, log_all_errors, after_modules)? {
                ok = false;
            }
        }
        Ok(ok)
    }

    /// Logs a failure, suppressing repeats of a message already raised
    /// in this run.
    fn note_failure(&self, ctx: &mut RunContext, log_all_errors: bool, message: &str) {
        let first_sighting = ctx.note_message(message);
        if first_sighting || log_all_errors {
            self.reporter.log_failure(message);
        }
    }

    fn validate_one(
        &self,
        sibling: &DevicePrototype,
        ctx: &mut RunContext,
        log_all_errors: bool,
        after_modules: bool,
    ) -> Result<bool, CoreError> {
        let mut ok = true;

        // A related-but-not-matching device is an identity anomaly the
        // operator has to resolve; suggest the serial correction.
        if sibling.matching_device.is_none() {
            if let Some(related_id) = sibling.related_device {
                let related = self.repository.get_device(related_id)?;
                let current_serial = if related.serial.is_empty() {
                    "NONE".to_owned()
                } else {
                    related.serial.clone()
                };
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Verify if serial number {current_serial} should be changed for \
                         prototype serial {} in related device {}. It could then become \
                         matching device of prototype {}",
                        sibling.serial, related.name, sibling.hostname
                    ),
                );
                ok = false;
            }
        }

        let missing_fields = [
            ("hostname", sibling.hostname.is_empty()),
            ("role", sibling.role.is_none()),
            ("device_type", sibling.device_type.is_none()),
            ("tenant", sibling.tenant.is_none()),
            ("site", sibling.site.is_none()),
            ("serial", sibling.serial.is_empty()),
        ];
        for (field, missing) in missing_fields {
            if missing {
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Prototype {} does not have required field {field}",
                        sibling.hostname
                    ),
                );
                ok = false;
            }
        }

        let Some(device_id) = sibling.matching_device else {
            return Ok(ok);
        };
        let device = self.repository.get_device(device_id)?;

        let derived = self.derived_stack_position(device_id, sibling)?;
        if !derived.is_empty() && derived != sibling.stack_index {
            self.note_failure(
                ctx,
                log_all_errors,
                &format!(
                    "Prototype {} stack index does not match with device {} stack index",
                    sibling.hostname, device.name
                ),
            );
            ok = false;
        }

        if let (Some(device_ip), Some(prototype_ip)) = (device.primary_ip4, sibling.primary_ip4) {
            if device_ip != prototype_ip {
                let current = self.repository.get_ip(device_ip)?;
                let reported = self.repository.get_ip(prototype_ip)?;
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Prototype {} address {} does not match with device address {}",
                        sibling.hostname, reported.address, current.address
                    ),
                );
                ok = false;
            }
        }

        if after_modules {
            if !self.validate_interfaces_present(sibling, &device, ctx, log_all_errors)? {
                ok = false;
            }
            if !self.validate_bays_present(sibling, &device, ctx, log_all_errors)? {
                ok = false;
            }
        }

        Ok(ok)
    }

    /// Post-check: every existing interface must appear in the reported
    /// set, apart from virtual/LAG records already named there and the
    /// recognized management sub-interfaces.
    fn validate_interfaces_present(
        &self,
        sibling: &DevicePrototype,
        device: &Device,
        ctx: &mut RunContext,
        log_all_errors: bool,
    ) -> Result<bool, CoreError> {
        let mut ok = true;
        let reported_lower: Vec<String> = sibling
            .raw
            .interfaces
            .keys()
            .map(|name| name.to_lowercase())
            .collect();

        for interface in self.repository.interfaces_for_device(device.id)? {
            let type_lower = interface.if_type.to_lowercase();
            if (type_lower == "virtual" || type_lower == "lag")
                && reported_lower.contains(&interface.name.to_lowercase())
            {
                continue;
            }
            // Management sub-interfaces live outside the report.
            if interface.name.contains("0/0") || interface.name.contains(".100") {
                continue;
            }

            if !sibling.raw.interfaces.contains_key(&interface.name) {
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Device {} interface {} is not found in prototype {}",
                        device.name, interface.name, sibling.hostname
                    ),
                );
                ok = false;
            }

            if !ifname::is_valid_interface(&interface.name)
                && interface.module.is_none()
                && !self.is_device_type_template(&interface)?
            {
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Device {} interface {} doesnt belong to a module",
                        device.name, interface.name
                    ),
                );
                ok = false;
            }
        }
        Ok(ok)
    }

    /// Post-check: every existing module bay must appear in the
    /// reported bay set, case-insensitively.
    fn validate_bays_present(
        &self,
        sibling: &DevicePrototype,
        device: &Device,
        ctx: &mut RunContext,
        log_all_errors: bool,
    ) -> Result<bool, CoreError> {
        let mut ok = true;
        let reported_lower: Vec<String> = sibling
            .raw
            .modules
            .keys()
            .map(|name| name.to_lowercase())
            .collect();

        for bay in self.repository.module_bays_for_device(device.id)? {
            if !reported_lower.contains(&bay.name.to_lowercase()) {
                self.note_failure(
                    ctx,
                    log_all_errors,
                    &format!(
                        "Module bay {} doesnt belong to device {}",
                        bay.name, device.name
                    ),
                );
                ok = false;
            }
        }
        Ok(ok)
    }

    /// The stack position an inventory device implies, derived from its
    /// interface names. A single-unit prototype pins the device to
    /// position "1"; multi-unit stacks read the distinct leading unit
    /// numbers of slash-numbered interfaces.
    pub(crate) fn derived_stack_position(
        &self,
        device: Uuid,
        sibling: &DevicePrototype,
    ) -> Result<String, CoreError> {
        if sibling.stack_info.len() <= 1 {
            return Ok("1".to_owned());
        }
        let interfaces = self.repository.interfaces_for_device(device)?;
        Ok(ifname::stack_index_from_interfaces(
            interfaces.iter().map(|i| i.name.as_str()),
        ))
    }
}
