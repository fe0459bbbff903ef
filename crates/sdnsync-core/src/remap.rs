// ── Interface name reconciler ──
//
// The same physical port can be represented by two interface records
// under different spellings: one created from a device-type template
// (long form), one from an earlier import (short or mid form). After
// interfaces are written, this stage hunts for such pairs, decides
// which record survives, transplants the module reference when the
// loser carried it, and renames the survivor to the spelling the
// controller actually reported.

use uuid::Uuid;

use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::ifname;
use crate::model::{DevicePrototype, Interface};
use crate::repository::{ChangeAction, InventoryRepository};
use crate::source::ControllerSource;

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    /// Find and merge duplicate interface records on one device.
    ///
    /// Each interface participates in at most one pair: the first
    /// transform (canonical, abbreviated, intermediate) whose output
    /// names another record on the device wins. Merge precedence:
    /// a cabled record beats a module-only record (the module reference
    /// moves onto the cabled one), and the record carrying the
    /// controller-reported name beats the one that does not.
    pub(crate) fn remap_interfaces(
        &self,
        prototype: &DevicePrototype,
        device: Uuid,
    ) -> Result<(), CoreError> {
        // canonical spelling → the spelling the controller reported.
        let reported_by_canonical: Vec<(String, String)> = prototype
            .raw
            .interfaces
            .keys()
            .map(|name| (ifname::canonical_name(name), name.clone()))
            .collect();

        let interfaces = self.repository.interfaces_for_device(device)?;
        let mut processed: Vec<Uuid> = Vec::new();
        let mut pairs: Vec<(Interface, Interface)> = Vec::new();

        for interface in &interfaces {
            if processed.contains(&interface.id) {
                continue;
            }
            for variant in ifname::name_variants(&interface.name) {
                let matched = interfaces.iter().find(|other| {
                    other.id != interface.id
                        && !processed.contains(&other.id)
                        && other.name == variant
                });
                if let Some(other) = matched {
                    processed.push(interface.id);
                    processed.push(other.id);
                    pairs.push((interface.clone(), other.clone()));
                    break;
                }
            }
        }

        for (a, b) in pairs {
            if let Err(err) = self.merge_pair(prototype, &reported_by_canonical, &a, &b) {
                self.reporter.log_failure(&format!(
                    "Unable to merge duplicate interfaces {} and {} for prototype {} - {err}",
                    a.name, b.name, prototype.hostname
                ));
            }
        }
        Ok(())
    }

    /// Apply the first merge rule that fits; a pair is merged at most
    /// once.
    fn merge_pair(
        &self,
        prototype: &DevicePrototype,
        reported_by_canonical: &[(String, String)],
        a: &Interface,
        b: &Interface,
    ) -> Result<(), CoreError> {
        let a_reported = prototype.raw.interfaces.contains_key(&a.name);
        let b_reported = prototype.raw.interfaces.contains_key(&b.name);

        if a.cable.is_some() && a.module.is_none() && b.module.is_some() && b.cable.is_none() {
            return self.merge_duplicate(reported_by_canonical, a, b, true);
        }
        if a.module.is_some() && a.cable.is_none() && b.cable.is_some() && b.module.is_none() {
            return self.merge_duplicate(reported_by_canonical, b, a, true);
        }
        if a_reported && !b_reported {
            return self.merge_duplicate(reported_by_canonical, b, a, false);
        }
        if b_reported && !a_reported {
            return self.merge_duplicate(reported_by_canonical, a, b, false);
        }
        Ok(())
    }

    /// Delete `loser`, rename `winner` to the controller-reported
    /// spelling, optionally moving the loser's module reference onto
    /// the winner first.
    fn merge_duplicate(
        &self,
        reported_by_canonical: &[(String, String)],
        winner: &Interface,
        loser: &Interface,
        with_module: bool,
    ) -> Result<(), CoreError> {
        let canonical = ifname::canonical_name(&winner.name);
        let Some((_, reported_name)) = reported_by_canonical
            .iter()
            .find(|(c, _)| *c == canonical)
        else {
            // Neither spelling maps to a reported port; leave the pair.
            return Ok(());
        };

        let mut winner = winner.clone();
        if with_module {
            winner.module = loser.module;
        }
        winner.name = reported_name.clone();

        self.log_change(ChangeAction::Delete, "interface", loser.id, &loser.name)?;
        self.repository.delete_interface(loser.id)?;
        self.repository.save_interface(&winner)?;
        self.log_change(ChangeAction::Update, "interface", winner.id, &winner.name)?;
        Ok(())
    }
}
