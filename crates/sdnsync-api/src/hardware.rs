// Hardware inventory endpoints
//
// Stack membership, chassis slots, modules, and line/supervisor cards.
// All are scoped per-device queries where 404 means "none reported".

use tracing::debug;

use crate::client::IntentClient;
use crate::error::Error;
use crate::models::{CardRecord, ChassisSlot, Envelope, ModuleRecord, StackDetail};

impl IntentClient {
    /// Get the stack membership detail of a device, if it is stacked.
    ///
    /// `GET /dna/intent/api/v1/network-device/{deviceId}/stack`
    pub async fn get_stack_detail(&self, device_id: &str) -> Result<Option<StackDetail>, Error> {
        debug!(device_id, "fetching stack detail");
        let result: Result<Envelope<StackDetail>, Error> = self
            .get(&format!("intent/api/v1/network-device/{device_id}/stack"))
            .await;

        match result {
            Ok(envelope) => Ok(envelope.response),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List the chassis slots of a modular device.
    ///
    /// `GET /dna/intent/api/v1/network-device/{deviceId}/chassis`
    pub async fn list_chassis_slots(&self, device_id: &str) -> Result<Vec<ChassisSlot>, Error> {
        debug!(device_id, "listing chassis slots");
        self.get_list_or_empty(
            &format!("intent/api/v1/network-device/{device_id}/chassis"),
            &[],
        )
        .await
    }

    /// List the modules reported for a device.
    ///
    /// `GET /dna/intent/api/v1/network-device/module?deviceId={id}`
    pub async fn list_modules(&self, device_id: &str) -> Result<Vec<ModuleRecord>, Error> {
        debug!(device_id, "listing modules");
        self.get_list_or_empty(
            "intent/api/v1/network-device/module",
            &[("deviceId", device_id.to_owned())],
        )
        .await
    }

    /// List the line cards of a device, with authoritative positions.
    ///
    /// `GET /dna/intent/api/v1/network-device/{deviceId}/line-card`
    pub async fn list_linecards(&self, device_id: &str) -> Result<Vec<CardRecord>, Error> {
        debug!(device_id, "listing line cards");
        self.get_list_or_empty(
            &format!("intent/api/v1/network-device/{device_id}/line-card"),
            &[],
        )
        .await
    }

    /// List the supervisor cards of a device.
    ///
    /// `GET /dna/intent/api/v1/network-device/{deviceId}/supervisor-card`
    pub async fn list_supervisor_cards(&self, device_id: &str) -> Result<Vec<CardRecord>, Error> {
        debug!(device_id, "listing supervisor cards");
        self.get_list_or_empty(
            &format!("intent/api/v1/network-device/{device_id}/supervisor-card"),
            &[],
        )
        .await
    }
}
