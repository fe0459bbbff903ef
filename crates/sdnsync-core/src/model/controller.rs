// ── Controller domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The product line of a managed controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ControllerKind {
    CatalystCenter,
}

impl ControllerKind {
    /// Human-readable label, used to tag imported devices and prototypes.
    pub fn label(self) -> &'static str {
        match self {
            Self::CatalystCenter => "Catalyst Center",
        }
    }

    /// The hardware vendor behind this controller line, lowercase.
    ///
    /// Role inference only considers roles populated by devices of this
    /// vendor.
    pub fn vendor(self) -> &'static str {
        match self {
            Self::CatalystCenter => "cisco",
        }
    }
}

/// Timestamp and outcome of the most recent engine pass of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    pub finished_at: DateTime<Utc>,
    pub success: bool,
}

impl RunStamp {
    pub fn now(success: bool) -> Self {
        Self {
            finished_at: Utc::now(),
            success,
        }
    }
}

/// Named regex patterns applied to the reported hostname when direct
/// matching fails. Capture group 1 of each pattern is the facility token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostnamePatterns {
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl HostnamePatterns {
    pub fn is_empty(&self) -> bool {
        self.site.is_none() && self.role.is_none()
    }
}

/// One managed controller instance, as configured by an operator.
///
/// Owns zero or more device prototypes. The engine treats every field as
/// read-only except the run bookkeeping stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub id: Uuid,
    pub name: String,
    /// Controller hostname, without scheme.
    pub hostname: String,
    pub kind: ControllerKind,
    /// Controller software release (selects the API revision).
    pub version: String,
    /// Device family allowlist applied to the fetch pass.
    #[serde(default)]
    pub device_families: Vec<String>,
    /// Hostname-parsing fallback for site/role inference.
    #[serde(default)]
    pub hostname_patterns: HostnamePatterns,
    /// Tenant assigned to new prototypes and created IPs.
    #[serde(default)]
    pub default_tenant: Option<Uuid>,

    // ── Run bookkeeping ──
    #[serde(default)]
    pub last_fetch: Option<RunStamp>,
    #[serde(default)]
    pub last_sync: Option<RunStamp>,
}
