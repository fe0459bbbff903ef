// ── Per-run working state ──
//
// One `RunContext` lives for the duration of a single engine entry
// point. It holds the compiled hostname patterns, the per-device
// interface and hardware caches (stack siblings share a controller
// device id, so each id is fetched once), deduplicated validation
// messages, and the template-type inference cache.

use std::collections::HashMap;

use regex::Regex;
use sdnsync_api::models::{InterfaceRecord, VlanRecord};

use crate::model::Controller;
use crate::positions::DeviceHardware;
use crate::report::Reporter;

pub(crate) struct RunContext {
    pub site_pattern: Option<Regex>,
    pub role_pattern: Option<Regex>,
    /// Controller device id -> interfaces, after pagination.
    pub interfaces: HashMap<String, Vec<InterfaceRecord>>,
    /// Controller device id -> VLANs.
    pub vlans: HashMap<String, Vec<VlanRecord>>,
    /// Controller device id -> positioned modules and card detail.
    pub hardware: HashMap<String, DeviceHardware>,
    /// Validation messages already raised in this run.
    pub messages: Vec<String>,
    /// Interface name -> inferred template type (memoized).
    pub template_types: HashMap<String, Option<String>>,
}

impl RunContext {
    /// Compiles the controller's hostname patterns. An invalid pattern
    /// is reported once and then treated as absent.
    pub fn new(controller: &Controller, reporter: &dyn Reporter) -> Self {
        Self {
            site_pattern: compile(controller.hostname_patterns.site.as_deref(), "site", reporter),
            role_pattern: compile(controller.hostname_patterns.role.as_deref(), "role", reporter),
            interfaces: HashMap::new(),
            vlans: HashMap::new(),
            hardware: HashMap::new(),
            messages: Vec::new(),
            template_types: HashMap::new(),
        }
    }

    /// Records a validation message; returns `true` on first sighting.
    pub fn note_message(&mut self, message: &str) -> bool {
        if self.messages.iter().any(|m| m == message) {
            return false;
        }
        self.messages.push(message.to_owned());
        true
    }
}

fn compile(pattern: Option<&str>, field: &str, reporter: &dyn Reporter) -> Option<Regex> {
    let pattern = pattern?;
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            reporter.log_warning(&format!(
                "Ignoring invalid hostname pattern for {field}: {err}"
            ));
            None
        }
    }
}
