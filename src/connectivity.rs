use log::warn;
use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use std::net::IpAddr;

/// Answers "is there an active network that can reach the internet" without
/// touching the network.
pub trait ConnectivityProbe: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Looks for a non-loopback interface that is up, running and holds a
/// routable address.
pub struct InterfaceProbe;

impl ConnectivityProbe for InterfaceProbe {
    fn is_connected(&self) -> bool {
        let addrs = match getifaddrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                warn!("getifaddrs failed ({:?})", e);
                return false;
            }
        };

        any_usable(addrs.map(|ifaddr| {
            let ip = ifaddr.address.and_then(|addr| {
                if let Some(v4) = addr.as_sockaddr_in() {
                    Some(IpAddr::V4(v4.ip()))
                } else {
                    addr.as_sockaddr_in6().map(|v6| IpAddr::V6(v6.ip()))
                }
            });
            (ifaddr.flags, ip)
        }))
    }
}

fn any_usable<I>(interfaces: I) -> bool
where
    I: IntoIterator<Item = (InterfaceFlags, Option<IpAddr>)>,
{
    interfaces
        .into_iter()
        .any(|(flags, ip)| ip.is_some_and(|ip| is_usable(flags, ip)))
}

fn is_usable(flags: InterfaceFlags, ip: IpAddr) -> bool {
    if flags.contains(InterfaceFlags::IFF_LOOPBACK)
        || !flags.contains(InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING)
    {
        return false;
    }

    match ip {
        IpAddr::V4(v4) => !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified(),
        IpAddr::V6(v6) => {
            // fe80::/10
            let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
            !v6.is_loopback() && !v6.is_unspecified() && !link_local
        }
    }
}

#[cfg(test)]
mod test {
    use super::{any_usable, is_usable};
    use nix::net::if_::InterfaceFlags;
    use std::net::IpAddr;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn running_interface_with_routable_address() {
        let flags = InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING;

        assert!(is_usable(flags, ip("192.168.1.20")));
        assert!(is_usable(flags, ip("2a01:4f8::1")));
    }

    #[test]
    fn rejects_down_loopback_and_link_local() {
        let up = InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING;

        assert!(!is_usable(InterfaceFlags::IFF_UP, ip("192.168.1.20")));
        assert!(!is_usable(up | InterfaceFlags::IFF_LOOPBACK, ip("127.0.0.1")));
        assert!(!is_usable(up, ip("169.254.10.1")));
        assert!(!is_usable(up, ip("fe80::1")));
    }

    #[test]
    fn interface_list() {
        let up = InterfaceFlags::IFF_UP | InterfaceFlags::IFF_RUNNING;
        let lo = up | InterfaceFlags::IFF_LOOPBACK;

        let offline = vec![
            (lo, Some(ip("127.0.0.1"))),
            (lo, Some(ip("::1"))),
            (up, None),
            (up, Some(ip("fe80::42"))),
            (InterfaceFlags::IFF_UP, Some(ip("10.0.0.7"))),
        ];
        let mut online = offline.clone();
        online.push((up, Some(ip("10.0.0.8"))));

        assert!(!any_usable(Vec::new()));
        assert!(!any_usable(offline));
        assert!(any_usable(online));
    }
}
