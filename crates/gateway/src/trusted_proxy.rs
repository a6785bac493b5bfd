use std::net::IpAddr;

use ipnetwork::IpNetwork;

/// An IPv4/IPv6 CIDR block, parsed once at startup from the configured
/// trusted-proxy allowlist (spec.md §9's "trusted-proxy CIDRs").
#[derive(Clone, Copy, Debug)]
pub struct CidrBlock(IpNetwork);

impl CidrBlock {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<IpNetwork>().ok().map(Self)
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// Resolves the "real" client IP from `X-Forwarded-For`, but only when
/// the direct peer is itself a trusted proxy (spec.md §8's testable
/// property: an untrusted peer's forwarded header must never be
/// honored).
pub struct TrustedProxyResolver {
    trusted: Vec<CidrBlock>,
}

impl TrustedProxyResolver {
    pub fn new(trusted: Vec<CidrBlock>) -> Self {
        Self { trusted }
    }

    fn is_trusted(&self, peer: IpAddr) -> bool {
        self.trusted.iter().any(|block| block.contains(peer))
    }

    /// `forwarded_for` is the raw header value, left-to-right
    /// client-then-proxies per RFC 7239 convention; the leftmost entry is
    /// the original client.
    pub fn resolve(&self, peer: IpAddr, forwarded_for: Option<&str>) -> IpAddr {
        if !self.is_trusted(peer) {
            return peer;
        }
        match forwarded_for.and_then(|header| header.split(',').next()) {
            Some(first) => first.trim().parse().unwrap_or(peer),
            None => peer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_peer_forwarded_header_is_ignored() {
        let resolver = TrustedProxyResolver::new(vec![CidrBlock::parse("10.0.0.0/8").unwrap()]);
        let peer: IpAddr = "203.0.113.5".parse().unwrap();
        let resolved = resolver.resolve(peer, Some("198.51.100.1"));
        assert_eq!(resolved, peer);
    }

    #[test]
    fn trusted_peer_forwarded_header_is_honored() {
        let resolver = TrustedProxyResolver::new(vec![CidrBlock::parse("10.0.0.0/8").unwrap()]);
        let peer: IpAddr = "10.1.2.3".parse().unwrap();
        let resolved = resolver.resolve(peer, Some("198.51.100.1, 10.1.2.3"));
        assert_eq!(resolved, "198.51.100.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn missing_header_falls_back_to_peer() {
        let resolver = TrustedProxyResolver::new(vec![CidrBlock::parse("10.0.0.0/8").unwrap()]);
        let peer: IpAddr = "10.1.2.3".parse().unwrap();
        assert_eq!(resolver.resolve(peer, None), peer);
    }

    #[test]
    fn cidr_block_matches_expected_range() {
        let block = CidrBlock::parse("192.168.1.0/24").unwrap();
        assert!(block.contains("192.168.1.42".parse().unwrap()));
        assert!(!block.contains("192.168.2.1".parse().unwrap()));
    }

    #[test]
    fn ipv6_cidr_block_matches() {
        let block = CidrBlock::parse("2001:db8::/32").unwrap();
        assert!(block.contains("2001:db8::1".parse().unwrap()));
        assert!(!block.contains("2001:db9::1".parse().unwrap()));
    }
}
