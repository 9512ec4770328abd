//! Random host sampling from IPv4 networks

use ipnetwork::Ipv4Network;
use rand::{seq::index, Rng};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Usable host range of a network as inclusive `u32` bounds
///
/// Network and broadcast addresses are excluded for prefixes shorter than
/// /31; a /31 or /32 contributes every address it holds.
fn host_bounds(network: &Ipv4Network) -> (u32, u32) {
    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());
    if network.prefix() < 31 {
        (first + 1, last - 1)
    } else {
        (first, last)
    }
}

/// Number of hosts `sample_network` can draw from
pub fn host_count(network: &Ipv4Network) -> u64 {
    let (first, last) = host_bounds(network);
    u64::from(last - first) + 1
}

/// Pick up to `count` distinct hosts of `network`, in ascending order
///
/// Returns every host when the network is smaller than `count`.
pub fn sample_network<R: Rng + ?Sized>(network: &Ipv4Network, count: usize, rng: &mut R) -> Vec<Ipv4Addr> {
    let (first, last) = host_bounds(network);
    let available = host_count(network);

    if count as u64 >= available {
        return (first..=last).map(Ipv4Addr::from).collect();
    }

    // count < available <= 2^32, so both fit in usize on 64-bit targets
    let mut offsets: Vec<u32> = index::sample(rng, available as usize, count)
        .into_iter()
        .map(|offset| offset as u32)
        .collect();
    offsets.sort_unstable();

    offsets.into_iter().map(|offset| Ipv4Addr::from(first + offset)).collect()
}

/// Sample `per_range` hosts from every network
///
/// Addresses appearing in more than one network are kept once, at their
/// first position.
pub fn sample_addresses<R: Rng + ?Sized>(networks: &[Ipv4Network], per_range: usize, rng: &mut R) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::with_capacity(networks.len() * per_range);

    for network in networks {
        for host in sample_network(network, per_range, rng) {
            if seen.insert(host) {
                addresses.push(host.to_string());
            }
        }
    }

    addresses
}
