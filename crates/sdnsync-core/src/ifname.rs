// ── Interface-name toolbox ──
//
// Catalyst gear surfaces the same port under several spellings
// (`Gi1/0/1`, `GigabitEthernet1/0/1`, `GigE1/0/1`). Everything that
// parses, transforms, or classifies those names lives here so the
// pipeline stages share one vocabulary.

use std::sync::LazyLock;

use regex::Regex;

/// Spelling variants for one port family.
struct NameForms {
    abbreviated: &'static str,
    canonical: &'static str,
    /// Mid-form the operating system prints for some families.
    intermediate: Option<&'static str>,
}

/// Catalyst port families the reconciler understands. Unknown
/// prefixes pass through every transform unchanged.
const NAME_FORMS: &[NameForms] = &[
    NameForms { abbreviated: "Eth", canonical: "Ethernet", intermediate: None },
    NameForms { abbreviated: "Fa", canonical: "FastEthernet", intermediate: Some("FastE") },
    NameForms { abbreviated: "Gi", canonical: "GigabitEthernet", intermediate: Some("GigE") },
    NameForms { abbreviated: "Tw", canonical: "TwoGigabitEthernet", intermediate: None },
    NameForms { abbreviated: "Fi", canonical: "FiveGigabitEthernet", intermediate: None },
    NameForms { abbreviated: "Te", canonical: "TenGigabitEthernet", intermediate: None },
    NameForms { abbreviated: "Twe", canonical: "TwentyFiveGigE", intermediate: None },
    NameForms { abbreviated: "Fo", canonical: "FortyGigabitEthernet", intermediate: Some("FortyGigE") },
    NameForms { abbreviated: "Hu", canonical: "HundredGigabitEthernet", intermediate: Some("HundredGigE") },
    NameForms {
        abbreviated: "TwoH",
        canonical: "TwoHundredGigabitEthernet",
        intermediate: Some("TwoHundredGigE"),
    },
    NameForms {
        abbreviated: "FoH",
        canonical: "FourHundredGigabitEthernet",
        intermediate: Some("FourHundredGigE"),
    },
    NameForms { abbreviated: "Ap", canonical: "AppGigabitEthernet", intermediate: None },
    NameForms { abbreviated: "Po", canonical: "Port-channel", intermediate: None },
    NameForms { abbreviated: "Lo", canonical: "Loopback", intermediate: None },
    NameForms { abbreviated: "Tu", canonical: "Tunnel", intermediate: None },
    NameForms { abbreviated: "Vl", canonical: "Vlan", intermediate: None },
];

/// Split a name into its alphabetic type prefix and the numbering tail.
fn split_name(name: &str) -> (&str, &str) {
    let end = name
        .find(|c: char| !c.is_ascii_alphabetic() && c != '-')
        .unwrap_or(name.len());
    name.split_at(end)
}

fn forms_for(prefix: &str) -> Option<&'static NameForms> {
    if prefix.is_empty() {
        return None;
    }
    NAME_FORMS.iter().find(|f| {
        f.abbreviated.eq_ignore_ascii_case(prefix)
            || f.canonical.eq_ignore_ascii_case(prefix)
            || f.intermediate.is_some_and(|i| i.eq_ignore_ascii_case(prefix))
    })
}

/// Expand any known spelling to the long form: `Gi1/0/1` →
/// `GigabitEthernet1/0/1`. Unknown prefixes come back unchanged.
pub fn canonical_name(name: &str) -> String {
    let (prefix, rest) = split_name(name);
    match forms_for(prefix) {
        Some(forms) => format!("{}{rest}", forms.canonical),
        None => name.to_owned(),
    }
}

/// Collapse any known spelling to the short form: `GigabitEthernet1/0/1`
/// → `Gi1/0/1`.
pub fn abbreviated_name(name: &str) -> String {
    let (prefix, rest) = split_name(name);
    match forms_for(prefix) {
        Some(forms) => format!("{}{rest}", forms.abbreviated),
        None => name.to_owned(),
    }
}

/// Rewrite a long-form name to the mid-form the OS prints:
/// `HundredGigabitEthernet1/1/1` → `HundredGigE1/1/1`. Only applies to
/// long-form input with a numbering tail; anything else is unchanged.
pub fn intermediate_name(name: &str) -> String {
    let (prefix, rest) = split_name(name);
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return name.to_owned();
    }
    let Some(forms) = NAME_FORMS
        .iter()
        .find(|f| f.canonical.eq_ignore_ascii_case(prefix))
    else {
        return name.to_owned();
    };
    match forms.intermediate {
        Some(intermediate) => format!("{intermediate}{rest}"),
        None => name.to_owned(),
    }
}

/// The three alternate spellings used when hunting for duplicate
/// interface records.
pub fn name_variants(name: &str) -> [String; 3] {
    [canonical_name(name), abbreviated_name(name), intermediate_name(name)]
}

/// Leading alphabetic type prefix of a name (`TenGigabitEthernet`,
/// `Port-channel`). Empty when the name starts with a digit.
pub fn interface_type_prefix(name: &str) -> &str {
    split_name(name).0
}

/// Name with digits, slashes, and hyphens removed. Used as the last
/// resort when hunting for a template with a similar name.
pub fn interface_base_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_ascii_digit() && *c != '/' && *c != '-')
        .collect()
}

static CHASSIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Switch|Chassis) (\d+)").expect("chassis pattern is valid"));

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Slot|Module) (\d+)").expect("slot pattern is valid"));

static SLOT_FROM_PORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\d+/(\d+)/\d+(?:/\d+)?").expect("port pattern is valid"));

static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/").expect("unit pattern is valid"));

static VALID_PORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D+(\d+)/(\d+)").expect("port validity pattern is valid"));

static STACK_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*(\d+)/").expect("stack index pattern is valid"));

/// Stack member number from a component name like `Switch 2 - Power
/// Supply A` or `Chassis 1`.
pub fn extract_chassis_number(name: &str) -> Option<u32> {
    let caps = CHASSIS_RE.captures(name)?;
    caps.get(2)?.as_str().parse().ok()
}

/// Slot/module number from a component name (`Slot 3`, `Module 1`),
/// falling back to the middle component of a port-style name such as
/// `Gi1/9/32`.
pub fn extract_slot_or_module_number(name: &str) -> Option<u32> {
    if let Some(caps) = SLOT_RE.captures(name) {
        return caps.get(2)?.as_str().parse().ok();
    }
    let caps = SLOT_FROM_PORT_RE.captures(name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// First number preceding a slash, i.e. the stack-unit component of a
/// port name (`TenGigabitEthernet2/1/4` → 2).
pub fn extract_unit_number(name: &str) -> Option<u32> {
    let caps = UNIT_RE.captures(name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Whether a reported name denotes a real front-panel port rather than
/// an internal or line-card-daughter interface.
///
/// Application hosting ports are always rejected. For `x/y`-numbered
/// names the first component must be 0, or failing that the second.
/// Names without that shape are accepted.
pub fn is_valid_interface(name: &str) -> bool {
    if name.to_lowercase().contains("appgigabitethernet") {
        return false;
    }
    let Some(caps) = VALID_PORT_RE.captures(name) else {
        return true;
    };
    let first = caps.get(1).map(|m| m.as_str());
    let second = caps.get(2).map(|m| m.as_str());
    if first.is_some_and(|n| n.parse::<u64>().ok() == Some(0)) {
        return true;
    }
    second.is_some_and(|n| n.parse::<u64>().ok() == Some(0))
}

/// Stack position string derived from a device's interface names.
///
/// Collects the distinct leading unit numbers of slash-numbered
/// interfaces, sorted numerically and comma-joined. More than four
/// distinct units collapses to `"1"`; a lone `"0"` entry survives but
/// is dropped when real unit numbers are present.
pub fn stack_index_from_interfaces<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut units: Vec<String> = Vec::new();
    for name in names {
        if let Some(caps) = STACK_INDEX_RE.captures(name) {
            if let Some(unit) = caps.get(1) {
                let unit = unit.as_str().to_owned();
                if !units.contains(&unit) {
                    units.push(unit);
                }
            }
        }
    }
    units.sort_by_key(|u| u.parse::<u64>().unwrap_or(0));

    if units.len() > 4 {
        return "1".to_owned();
    }
    if units.len() > 1 {
        units.retain(|u| u != "0");
    }
    units.join(",")
}

/// Trailing digit run of a module-bay name, as text. Empty when the
/// name does not end in digits.
pub fn extract_position(name: &str) -> String {
    let reversed: String = name
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect();
    reversed.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_canonical_expands_abbreviations() {
        assert_eq!(canonical_name("Gi1/0/1"), "GigabitEthernet1/0/1");
        assert_eq!(canonical_name("Te2/1/4"), "TenGigabitEthernet2/1/4");
        assert_eq!(canonical_name("HundredGigE1/1/1"), "HundredGigabitEthernet1/1/1");
        assert_eq!(canonical_name("Po10"), "Port-channel10");
        assert_eq!(canonical_name("mgmt0"), "mgmt0");
    }

    #[test]
    fn test_abbreviated_collapses_long_forms() {
        assert_eq!(abbreviated_name("GigabitEthernet1/0/1"), "Gi1/0/1");
        assert_eq!(abbreviated_name("TwentyFiveGigE1/0/1"), "Twe1/0/1");
        assert_eq!(abbreviated_name("HundredGigE1/1/1"), "Hu1/1/1");
        assert_eq!(abbreviated_name("Loopback0"), "Lo0");
        assert_eq!(abbreviated_name("Unknown5"), "Unknown5");
    }

    #[test]
    fn test_intermediate_only_rewrites_long_forms() {
        assert_eq!(intermediate_name("HundredGigabitEthernet1/1/1"), "HundredGigE1/1/1");
        assert_eq!(intermediate_name("GigabitEthernet1/0/1"), "GigE1/0/1");
        assert_eq!(intermediate_name("Gi1/0/1"), "Gi1/0/1");
        assert_eq!(intermediate_name("TenGigabitEthernet1/0/1"), "TenGigabitEthernet1/0/1");
        assert_eq!(intermediate_name("Loopback"), "Loopback");
    }

    #[test]
    fn test_interface_validity() {
        assert!(!is_valid_interface("AppGigabitEthernet1/0/1"));
        assert!(is_valid_interface("GigabitEthernet0/1"));
        assert!(is_valid_interface("TenGigabitEthernet1/0/3"));
        assert!(!is_valid_interface("TenGigabitEthernet2/1/4"));
        assert!(is_valid_interface("Vlan100"));
    }

    #[test]
    fn test_component_number_extraction() {
        assert_eq!(extract_chassis_number("Switch 2 - Power Supply A"), Some(2));
        assert_eq!(extract_chassis_number("chassis 3"), Some(3));
        assert_eq!(extract_chassis_number("Supervisor"), None);
        assert_eq!(extract_slot_or_module_number("Slot 3"), Some(3));
        assert_eq!(extract_slot_or_module_number("module 12"), Some(12));
        assert_eq!(extract_slot_or_module_number("Gi1/9/32"), Some(9));
        assert_eq!(extract_slot_or_module_number("Fan Tray"), None);
        assert_eq!(extract_unit_number("TenGigabitEthernet2/1/4"), Some(2));
        assert_eq!(extract_unit_number("Vlan100"), None);
    }

    #[test]
    fn test_stack_index_from_interfaces() {
        assert_eq!(
            stack_index_from_interfaces(["Gi1/0/1", "Gi1/0/2", "Gi2/0/1"]),
            "1,2"
        );
        assert_eq!(stack_index_from_interfaces(["Gi0/1", "Gi1/0/1"]), "1");
        assert_eq!(stack_index_from_interfaces(["Gi0/1"]), "0");
        assert_eq!(
            stack_index_from_interfaces(["Gi1/0/1", "Gi2/0/1", "Gi3/0/1", "Gi4/0/1", "Gi5/0/1"]),
            "1"
        );
        assert_eq!(stack_index_from_interfaces(["Vlan100"]), "");
    }

    #[test]
    fn test_extract_position() {
        assert_eq!(extract_position("Switch 1 Module 3"), "3");
        assert_eq!(extract_position("SPA bay 10"), "10");
        assert_eq!(extract_position("Uplink"), "");
    }

    #[test]
    fn test_base_name_strips_numbering() {
        assert_eq!(interface_base_name("TenGigabitEthernet1/0/3"), "TenGigabitEthernet");
        assert_eq!(interface_base_name("Port-channel10"), "Portchannel");
    }
}
