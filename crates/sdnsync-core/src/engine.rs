// ── Reconciliation engine ──
//
// `SyncEngine` ties a controller source and an inventory repository
// together and exposes the entry points an external job runner calls.
// The pipeline stages live in sibling modules as further `impl` blocks:
// fetching/splitting in `split`, identity matching in `matching`,
// prototype persistence in `sync`, importing in `import`, duplicate
// interface cleanup in `remap`, and the state machine in `validate`.
//
// The engine assumes at most one concurrent run per controller; the
// job runner owns that mutual exclusion.

use std::sync::Arc;

use uuid::Uuid;

use crate::context::RunContext;
use crate::error::CoreError;
use crate::model::RunStamp;
use crate::report::{Reporter, RunReport, StatusSummary, TracingReporter};
use crate::repository::{ChangeAction, ChangeEntry, InventoryRepository};
use crate::source::ControllerSource;

/// Reconciliation engine for one controller source and one inventory.
pub struct SyncEngine<S, R> {
    pub(crate) source: S,
    pub(crate) repository: R,
    pub(crate) reporter: Arc<dyn Reporter>,
    /// Acting user for change-log attribution. No user, no entries.
    pub(crate) user: Option<String>,
    /// When false, repeated validation findings are deduplicated
    /// silently instead of being logged as failures each time.
    pub(crate) log_all_errors: bool,
}

impl<S, R> SyncEngine<S, R>
where
    S: ControllerSource,
    R: InventoryRepository,
{
    pub fn new(source: S, repository: R) -> Self {
        Self {
            source,
            repository,
            reporter: Arc::new(TracingReporter::new()),
            user: None,
            log_all_errors: false,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_log_all_errors(mut self, log_all_errors: bool) -> Self {
        self.log_all_errors = log_all_errors;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    // ── Entry points ────────────────────────────────────────────────

    /// Fetch every reported device, split stacks into units, match and
    /// score them against the inventory, upsert prototypes, and
    /// tombstone the ones the controller no longer reports.
    pub async fn fetch_and_score(&self, controller_id: Uuid) -> Result<RunReport, CoreError> {
        let controller = self.repository.get_controller(controller_id)?;
        let mut ctx = RunContext::new(&controller, self.reporter.as_ref());
        let mut report = RunReport::started(controller.id);

        let seen_keys = match self.fetch_pass(&controller, &mut ctx, None, &mut report).await {
            Ok(keys) => keys,
            Err(err) => {
                self.reporter.log_failure(&format!(
                    "Fetch from controller {} failed: {err}",
                    controller.name
                ));
                self.stamp_fetch(&controller, false)?;
                report.finish(false);
                return Err(err);
            }
        };

        report.prototypes_deleted = self.detect_deletions(&controller, &seen_keys)?;
        report.status_summary = self.status_summary(controller.id)?;
        report.finish(true);
        self.stamp_fetch(&controller, true)?;
        Ok(report)
    }

    /// Import the selected prototypes into the inventory.
    ///
    /// With `fetch_first`, the fetch pass runs first, restricted to the
    /// selected prototypes' instance UUIDs; deletion detection is
    /// skipped on such partial passes. Returns `false` when at least
    /// one failure was logged.
    pub async fn import_selected(
        &self,
        controller_id: Uuid,
        prototype_ids: &[Uuid],
        fetch_first: bool,
    ) -> Result<bool, CoreError> {
        let controller = self.repository.get_controller(controller_id)?;
        let mut ctx = RunContext::new(&controller, self.reporter.as_ref());

        let mut selected = self.resolve_selection(prototype_ids)?;
        if selected.is_empty() {
            self.reporter.log_failure("No item was selected");
            self.stamp_sync(&controller, false)?;
            return Ok(false);
        }

        if fetch_first {
            let filter: Vec<String> = selected.iter().map(|p| p.instance_uuid.clone()).collect();
            let mut partial = RunReport::started(controller.id);
            if let Err(err) = self
                .fetch_pass(&controller, &mut ctx, Some(&filter), &mut partial)
                .await
            {
                self.reporter.log_failure(&format!(
                    "Fetch from controller {} failed: {err}",
                    controller.name
                ));
                self.stamp_sync(&controller, false)?;
                return Err(err);
            }
            // Re-read: the fetch pass rewrote the selected prototypes.
            selected = self.resolve_selection(prototype_ids)?;
        }

        let success = self.import_pass(&controller, &mut ctx, &selected)?;
        self.stamp_sync(&controller, success)?;
        Ok(success)
    }

    /// Scheduled-job composition: full fetch, import of everything not
    /// tombstoned, then the interface-type sweep.
    pub async fn run_full(&self, controller_id: Uuid) -> Result<RunReport, CoreError> {
        let mut report = self.fetch_and_score(controller_id).await?;

        let importable: Vec<Uuid> = self
            .repository
            .prototypes_for_controller(controller_id)?
            .into_iter()
            .filter(|p| !p.sync_status.is_deleted())
            .map(|p| p.id)
            .collect();
        if !importable.is_empty() {
            self.import_selected(controller_id, &importable, false).await?;
        }

        self.find_missing_interface_types(controller_id)?;

        report.status_summary = self.status_summary(controller_id)?;
        Ok(report)
    }

    /// Prototype counts by lifecycle state for one controller.
    pub fn status_summary(&self, controller_id: Uuid) -> Result<StatusSummary, CoreError> {
        let mut summary = StatusSummary::default();
        for prototype in self.repository.prototypes_for_controller(controller_id)? {
            match prototype.sync_status {
                crate::model::SyncStatus::Discovered => summary.discovered += 1,
                crate::model::SyncStatus::Imported => summary.imported += 1,
                crate::model::SyncStatus::Deleted => summary.deleted += 1,
            }
        }
        Ok(summary)
    }

    // ── Shared helpers ──────────────────────────────────────────────

    /// Selected prototypes, skipping unknown ids and tombstones.
    fn resolve_selection(
        &self,
        prototype_ids: &[Uuid],
    ) -> Result<Vec<crate::model::DevicePrototype>, CoreError> {
        let mut selected = Vec::with_capacity(prototype_ids.len());
        for id in prototype_ids {
            match self.repository.get_prototype(*id) {
                Ok(p) if !p.sync_status.is_deleted() => selected.push(p),
                Ok(_) | Err(CoreError::PrototypeNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(selected)
    }

    /// Records a change-log entry when an acting user is set.
    pub(crate) fn log_change(
        &self,
        action: ChangeAction,
        object_type: &str,
        object_id: Uuid,
        label: &str,
    ) -> Result<(), CoreError> {
        if let Some(user) = &self.user {
            self.repository
                .record_change(ChangeEntry::new(action, object_type, object_id, label, user))?;
        }
        Ok(())
    }

    fn stamp_fetch(&self, controller: &crate::model::Controller, success: bool) -> Result<(), CoreError> {
        let mut controller = self.repository.get_controller(controller.id)?;
        controller.last_fetch = Some(RunStamp::now(success));
        self.repository.save_controller(&controller)
    }

    fn stamp_sync(&self, controller: &crate::model::Controller, success: bool) -> Result<(), CoreError> {
        let mut controller = self.repository.get_controller(controller.id)?;
        controller.last_sync = Some(RunStamp::now(success));
        self.repository.save_controller(&controller)
    }
}
