// Interface and VLAN endpoints
//
// Per-device interface listing (paginated) and VLAN listing. Both are
// scoped queries: a device with no data answers 404, which is mapped to
// an empty list here rather than surfaced as an error.

use tracing::debug;

use crate::client::{IntentClient, PAGE_SIZE};
use crate::error::Error;
use crate::models::{Envelope, InterfaceRecord, VlanRecord};

impl IntentClient {
    /// List one page of a device's interfaces.
    ///
    /// `GET /dna/intent/api/v1/interface/network-device/{deviceId}`
    pub async fn list_interfaces_page(
        &self,
        device_id: &str,
        offset: usize,
    ) -> Result<Vec<InterfaceRecord>, Error> {
        let envelope: Envelope<Vec<InterfaceRecord>> = match self
            .get_with_params(
                &format!("intent/api/v1/interface/network-device/{device_id}"),
                &[
                    ("offset", offset.to_string()),
                    ("limit", PAGE_SIZE.to_string()),
                ],
            )
            .await
        {
            Ok(envelope) => envelope,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(envelope.response.unwrap_or_default())
    }

    /// List all interfaces of a device across every page.
    pub async fn list_interfaces(&self, device_id: &str) -> Result<Vec<InterfaceRecord>, Error> {
        debug!(device_id, "listing device interfaces");
        self.fetch_all(|offset| self.list_interfaces_page(device_id, offset))
            .await
    }

    /// List the VLANs of a device (not paginated).
    ///
    /// `GET /dna/intent/api/v1/network-device/{id}/vlan`
    pub async fn list_vlans(&self, device_id: &str) -> Result<Vec<VlanRecord>, Error> {
        debug!(device_id, "listing device VLANs");
        self.get_list_or_empty(&format!("intent/api/v1/network-device/{device_id}/vlan"), &[])
            .await
    }
}
