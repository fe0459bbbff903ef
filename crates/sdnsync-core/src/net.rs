// ── IPv4 helpers ──
//
// Controllers report dotted-quad netmasks; the inventory stores
// addresses in CIDR notation. Containment checks here back the
// site-from-prefix lookup during identity matching.

use std::net::Ipv4Addr;

/// Number of set bits in a dotted-quad netmask.
///
/// Counts all one bits, so a non-contiguous mask still yields a
/// length rather than an error. Returns `None` when the string is not
/// a parseable IPv4 address.
pub fn mask_to_cidr(mask: &str) -> Option<u8> {
    let mask: Ipv4Addr = mask.trim().parse().ok()?;
    #[allow(clippy::cast_possible_truncation)]
    Some(u32::from(mask).count_ones() as u8)
}

/// Join an address and a dotted-quad mask into `a.b.c.d/len` form.
pub fn with_prefix_len(address: &str, mask: &str) -> Option<String> {
    let addr: Ipv4Addr = address.trim().parse().ok()?;
    let len = mask_to_cidr(mask)?;
    Some(format!("{addr}/{len}"))
}

/// Strip a `/len` suffix, leaving the bare address.
pub fn strip_prefix_len(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}

/// Prefix length of a CIDR string such as `10.20.0.0/16`.
pub fn prefix_len(prefix: &str) -> Option<u8> {
    let (_, len) = prefix.split_once('/')?;
    let len: u8 = len.trim().parse().ok()?;
    (len <= 32).then_some(len)
}

/// Whether `address` falls inside the CIDR `prefix`.
///
/// The address may carry its own `/len` suffix; only the host part is
/// tested. Malformed input is treated as non-matching.
pub fn prefix_contains(prefix: &str, address: &str) -> bool {
    let Some((network, len)) = prefix.split_once('/') else {
        return false;
    };
    let Ok(network) = network.trim().parse::<Ipv4Addr>() else {
        return false;
    };
    let Ok(len) = len.trim().parse::<u8>() else {
        return false;
    };
    if len > 32 {
        return false;
    }
    let Ok(addr) = strip_prefix_len(address).trim().parse::<Ipv4Addr>() else {
        return false;
    };
    let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    u32::from(network) & mask == u32::from(addr) & mask
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_mask_to_cidr() {
        assert_eq!(mask_to_cidr("255.255.255.0"), Some(24));
        assert_eq!(mask_to_cidr("255.255.255.252"), Some(30));
        assert_eq!(mask_to_cidr("255.255.255.255"), Some(32));
        assert_eq!(mask_to_cidr("0.0.0.0"), Some(0));
        assert_eq!(mask_to_cidr("not-a-mask"), None);
    }

    #[test]
    fn test_with_prefix_len() {
        assert_eq!(
            with_prefix_len("10.20.30.40", "255.255.255.0").unwrap(),
            "10.20.30.40/24"
        );
        assert!(with_prefix_len("10.20.30.40", "bogus").is_none());
    }

    #[test]
    fn test_prefix_contains() {
        assert!(prefix_contains("10.20.0.0/16", "10.20.30.40"));
        assert!(prefix_contains("10.20.0.0/16", "10.20.30.40/32"));
        assert!(!prefix_contains("10.21.0.0/16", "10.20.30.40"));
        assert!(prefix_contains("0.0.0.0/0", "192.0.2.1"));
        assert!(!prefix_contains("10.20.0.0/40", "10.20.30.40"));
        assert!(!prefix_contains("garbage", "10.20.30.40"));
    }

    #[test]
    fn test_prefix_len() {
        assert_eq!(prefix_len("10.20.0.0/16"), Some(16));
        assert_eq!(prefix_len("10.20.0.0"), None);
        assert_eq!(prefix_len("10.20.0.0/48"), None);
    }
}
