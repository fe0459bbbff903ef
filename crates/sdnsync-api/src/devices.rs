// Network device endpoints
//
// Paginated device listing, optionally filtered by family. One record per
// managed device; stacks and chassis arrive as a single record with
// comma-separated serials.

use tracing::debug;

use crate::client::{IntentClient, PAGE_SIZE};
use crate::error::Error;
use crate::models::{DeviceRecord, Envelope};

impl IntentClient {
    /// List one page of managed devices.
    ///
    /// `GET /dna/intent/api/v1/network-device`
    ///
    /// Offsets are 1-based with a fixed page size of 500.
    pub async fn list_devices_page(
        &self,
        offset: usize,
        family: Option<&str>,
    ) -> Result<Vec<DeviceRecord>, Error> {
        let mut params: Vec<(&str, String)> = vec![
            ("offset", offset.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        if let Some(family) = family {
            params.push(("family", family.to_owned()));
        }

        let envelope: Envelope<Vec<DeviceRecord>> = self
            .get_with_params("intent/api/v1/network-device", &params)
            .await?;
        Ok(envelope.response.unwrap_or_default())
    }

    /// List all managed devices, one paginated request series per family.
    ///
    /// With an empty family list a single unfiltered series is issued.
    /// A transport or auth failure here is fatal to the whole fetch pass;
    /// it is not mapped to an empty list.
    pub async fn list_devices(&self, families: &[String]) -> Result<Vec<DeviceRecord>, Error> {
        debug!(?families, "listing managed devices");

        if families.is_empty() {
            return self
                .fetch_all(|offset| self.list_devices_page(offset, None))
                .await;
        }

        let mut all = Vec::new();
        for family in families {
            let batch = self
                .fetch_all(|offset| self.list_devices_page(offset, Some(family)))
                .await?;
            all.extend(batch);
        }
        Ok(all)
    }
}
