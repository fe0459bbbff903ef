// ── Controller source ──
//
// Seam between the engine and the controller transport. The engine
// only needs the read-side inventory surface, so the trait mirrors
// that subset of the Intent API and nothing else. Scoped "no data"
// answers are already mapped to empty lists by the implementation.

use async_trait::async_trait;
use sdnsync_api::IntentClient;
use sdnsync_api::models::{
    CardRecord, ChassisSlot, DeviceRecord, InterfaceRecord, ModuleRecord, StackDetail, VlanRecord,
};

use crate::error::CoreError;

/// Read access to one controller's device inventory.
#[async_trait]
pub trait ControllerSource: Send + Sync {
    /// Managed devices, one request series per family filter.
    async fn list_devices(&self, families: &[String]) -> Result<Vec<DeviceRecord>, CoreError>;

    async fn list_interfaces(&self, device_id: &str) -> Result<Vec<InterfaceRecord>, CoreError>;

    async fn list_vlans(&self, device_id: &str) -> Result<Vec<VlanRecord>, CoreError>;

    /// Stack membership detail, absent for non-stacked devices.
    async fn stack_detail(&self, device_id: &str) -> Result<Option<StackDetail>, CoreError>;

    async fn chassis_slots(&self, device_id: &str) -> Result<Vec<ChassisSlot>, CoreError>;

    async fn list_modules(&self, device_id: &str) -> Result<Vec<ModuleRecord>, CoreError>;

    async fn list_linecards(&self, device_id: &str) -> Result<Vec<CardRecord>, CoreError>;

    async fn list_supervisor_cards(&self, device_id: &str) -> Result<Vec<CardRecord>, CoreError>;
}

#[async_trait]
impl ControllerSource for IntentClient {
    async fn list_devices(&self, families: &[String]) -> Result<Vec<DeviceRecord>, CoreError> {
        Ok(IntentClient::list_devices(self, families).await?)
    }

    async fn list_interfaces(&self, device_id: &str) -> Result<Vec<InterfaceRecord>, CoreError> {
        Ok(IntentClient::list_interfaces(self, device_id).await?)
    }

    async fn list_vlans(&self, device_id: &str) -> Result<Vec<VlanRecord>, CoreError> {
        Ok(IntentClient::list_vlans(self, device_id).await?)
    }

    async fn stack_detail(&self, device_id: &str) -> Result<Option<StackDetail>, CoreError> {
        Ok(self.get_stack_detail(device_id).await?)
    }

    async fn chassis_slots(&self, device_id: &str) -> Result<Vec<ChassisSlot>, CoreError> {
        Ok(self.list_chassis_slots(device_id).await?)
    }

    async fn list_modules(&self, device_id: &str) -> Result<Vec<ModuleRecord>, CoreError> {
        Ok(IntentClient::list_modules(self, device_id).await?)
    }

    async fn list_linecards(&self, device_id: &str) -> Result<Vec<CardRecord>, CoreError> {
        Ok(IntentClient::list_linecards(self, device_id).await?)
    }

    async fn list_supervisor_cards(&self, device_id: &str) -> Result<Vec<CardRecord>, CoreError> {
        Ok(IntentClient::list_supervisor_cards(self, device_id).await?)
    }
}
