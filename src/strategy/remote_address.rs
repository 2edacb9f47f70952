use std::net::IpAddr;

use crate::{models::Parameters, Context};

use super::{list, Strategy};

/// Active when the remote address equals, or falls inside a subnet listed in, the
/// comma-separated `IPs` parameter. Malformed entries never match.
pub struct RemoteAddressStrategy;

impl Strategy for RemoteAddressStrategy {
    fn name(&self) -> &str {
        "remoteAddress"
    }

    fn is_enabled(&self, parameters: &Parameters, context: &Context) -> bool {
        let Some(remote_address) = context.remote_address.as_deref() else {
            return false;
        };
        list(parameters, "IPs")
            .any(|range| range == remote_address || in_subnet(range, remote_address).unwrap_or(false))
    }
}

/// Return whether `address` falls inside `range` (`ip` or `ip/prefix`), or `None` if either side
/// does not parse.
fn in_subnet(range: &str, address: &str) -> Option<bool> {
    let (network, prefix) = match range.split_once('/') {
        Some((network, prefix)) => (network, Some(prefix.parse::<u32>().ok()?)),
        None => (range, None),
    };
    let network: IpAddr = network.parse().ok()?;
    let address: IpAddr = address.parse().ok()?;

    match (network, address) {
        (IpAddr::V4(network), IpAddr::V4(address)) => {
            let prefix = prefix.unwrap_or(32);
            let mask = mask_u32(prefix)?;
            Some(u32::from(network) & mask == u32::from(address) & mask)
        }
        (IpAddr::V6(network), IpAddr::V6(address)) => {
            let prefix = prefix.unwrap_or(128);
            let mask = mask_u128(prefix)?;
            Some(u128::from(network) & mask == u128::from(address) & mask)
        }
        _ => Some(false),
    }
}

fn mask_u32(prefix: u32) -> Option<u32> {
    match prefix {
        0 => Some(0),
        1..=32 => Some(u32::MAX << (32 - prefix)),
        _ => None,
    }
}

fn mask_u128(prefix: u32) -> Option<u128> {
    match prefix {
        0 => Some(0),
        1..=128 => Some(u128::MAX << (128 - prefix)),
        _ => None,
    }
}
