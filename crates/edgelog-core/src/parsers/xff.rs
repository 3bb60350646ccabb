//! `X-Forwarded-For` client selection.

use std::net::IpAddr;

/// Pick the best-effort client address for a request.
///
/// With an `X-Forwarded-For` list, the first public address wins; if every
/// entry is private, loopback or link-local, the first valid entry is used.
/// Without a usable list, `src` is returned unchanged.
pub fn pick_client_ip(src: Option<&str>, forwarded_for: Option<&str>) -> Option<String> {
    let ips: Vec<IpAddr> = forwarded_for
        .unwrap_or_default()
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect();

    ips.iter()
        .find(|ip| is_public(ip))
        .or_else(|| ips.first())
        .map(|ip| ip.to_string())
        .or_else(|| src.map(str::to_string))
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}
