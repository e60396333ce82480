//! Indicator range expansion.
//!
//! Feeds publish IP indicators either as single addresses or as inclusive
//! `start-end` ranges. Ranges are rewritten into the minimal set of CIDR
//! blocks covering them, one downstream event per block. Everything else
//! passes through untouched.

use ipnet::{Ipv4Subnets, Ipv6Subnets};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::warn;

/// Expand an indicator according to its feed type.
///
/// For `IPv4`/`IPv6` indicators of the form `start-end`:
/// - equal endpoints collapse to the single address;
/// - distinct endpoints expand to the minimal CIDR cover of the inclusive
///   range, ascending by block start.
///
/// Any other type, an indicator without exactly one `-`, or a range that
/// does not parse passes through unchanged as a single element.
pub fn expand(indicator: &str, indicator_type: &str) -> Vec<String> {
    match indicator_type {
        "IPv4" => expand_ipv4(indicator),
        "IPv6" => expand_ipv6(indicator),
        _ => vec![indicator.to_string()],
    }
}

/// Split `start-end`, requiring exactly one separator.
fn split_range(indicator: &str) -> Option<(&str, &str)> {
    if indicator.matches('-').count() != 1 {
        return None;
    }
    indicator.split_once('-')
}

fn expand_ipv4(indicator: &str) -> Vec<String> {
    let Some((start, end)) = split_range(indicator) else {
        return vec![indicator.to_string()];
    };
    let (Ok(start), Ok(end)) = (start.parse::<Ipv4Addr>(), end.parse::<Ipv4Addr>()) else {
        warn!(indicator, "unparsable IPv4 range, passing through");
        return vec![indicator.to_string()];
    };
    if start == end {
        return vec![start.to_string()];
    }
    if start > end {
        warn!(indicator, "reversed IPv4 range, passing through");
        return vec![indicator.to_string()];
    }
    Ipv4Subnets::new(start, end, 0)
        .map(|net| net.to_string())
        .collect()
}

fn expand_ipv6(indicator: &str) -> Vec<String> {
    let Some((start, end)) = split_range(indicator) else {
        return vec![indicator.to_string()];
    };
    let (Ok(start), Ok(end)) = (start.parse::<Ipv6Addr>(), end.parse::<Ipv6Addr>()) else {
        warn!(indicator, "unparsable IPv6 range, passing through");
        return vec![indicator.to_string()];
    };
    if start == end {
        return vec![start.to_string()];
    }
    if start > end {
        warn!(indicator, "reversed IPv6 range, passing through");
        return vec![indicator.to_string()];
    }
    Ipv6Subnets::new(start, end, 0)
        .map(|net| net.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_endpoints_collapse() {
        assert_eq!(expand("10.0.0.1-10.0.0.1", "IPv4"), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_aligned_range_single_block() {
        assert_eq!(expand("10.0.0.0-10.0.0.3", "IPv4"), vec!["10.0.0.0/30"]);
    }

    #[test]
    fn test_unaligned_range_multiple_blocks() {
        assert_eq!(
            expand("10.0.0.1-10.0.0.2", "IPv4"),
            vec!["10.0.0.1/32", "10.0.0.2/32"]
        );
    }

    #[test]
    fn test_blocks_ascend_by_start() {
        let blocks = expand("192.168.0.1-192.168.1.0", "IPv4");
        let starts: Vec<String> = blocks
            .iter()
            .map(|b| b.split('/').next().unwrap().to_string())
            .collect();
        let mut sorted = starts
            .iter()
            .map(|s| s.parse::<Ipv4Addr>().unwrap())
            .collect::<Vec<_>>();
        sorted.sort();
        assert_eq!(
            starts,
            sorted.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
        assert!(blocks.len() > 1);
    }

    #[test]
    fn test_non_ip_type_passes_through() {
        assert_eq!(expand("192.168.1.1", "domain"), vec!["192.168.1.1"]);
        assert_eq!(expand("example.com", "domain"), vec!["example.com"]);
    }

    #[test]
    fn test_single_address_passes_through() {
        assert_eq!(expand("10.0.0.1", "IPv4"), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_unparsable_range_passes_through() {
        assert_eq!(expand("10.0.0.1-banana", "IPv4"), vec!["10.0.0.1-banana"]);
    }

    #[test]
    fn test_multiple_separators_pass_through() {
        assert_eq!(expand("10.0.0.1-10.0.0.2-x", "IPv4"), vec!["10.0.0.1-10.0.0.2-x"]);
    }

    #[test]
    fn test_reversed_range_passes_through() {
        assert_eq!(expand("10.0.0.9-10.0.0.1", "IPv4"), vec!["10.0.0.9-10.0.0.1"]);
    }

    #[test]
    fn test_type_match_is_exact() {
        // Lower-cased type names are not IP families.
        assert_eq!(
            expand("10.0.0.0-10.0.0.3", "ipv4"),
            vec!["10.0.0.0-10.0.0.3"]
        );
    }

    #[test]
    fn test_ipv6_range() {
        assert_eq!(
            expand("2001:db8::-2001:db8::3", "IPv6"),
            vec!["2001:db8::/126"]
        );
        assert_eq!(expand("2001:db8::1-2001:db8::1", "IPv6"), vec!["2001:db8::1"]);
    }
}
