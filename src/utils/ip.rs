//! 客户端 IP 解析
//!
//! 转发头只有在连接来自可信代理时才采信：
//! - 配置了 `server.trusted_proxies`：对端必须命中其中一项（单 IP 或 CIDR）
//! - 未配置：对端为私有地址 / 回环地址时视为反向代理

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::trace;

/// 私有地址或本机地址
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            let head = v6.segments()[0];
            v6.is_loopback() || (head & 0xfe00) == 0xfc00 || (head & 0xffc0) == 0xfe80
        }
    }
}

/// `ip` 是否落在 `cidr`（如 `10.0.0.0/8`）内
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.trim().parse::<IpAddr>(), prefix.trim().parse::<u32>())
    else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 解析 `ip` 或 `ip:port`
fn parse_peer(peer: &str) -> Option<IpAddr> {
    peer.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| peer.parse::<IpAddr>())
        .ok()
}

pub fn is_trusted_proxy(peer: &IpAddr, trusted_proxies: &[String]) -> bool {
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(peer, proxy)
        } else {
            proxy.trim().parse::<IpAddr>().is_ok_and(|p| p == *peer)
        }
    })
}

/// X-Forwarded-For 第一跳，其次 X-Real-IP
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let first_hop = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    first_hop
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(String::from)
}

/// 根据对端地址和请求头得出客户端 IP
pub fn resolve_client_ip(
    peer: Option<&str>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer) = peer else {
        // 没有对端地址（例如测试请求）时只能依赖转发头
        return forwarded_ip(headers);
    };

    let Some(peer_ip) = parse_peer(peer) else {
        return Some(peer.to_string());
    };

    let trusted = if trusted_proxies.is_empty() {
        is_private_or_local(&peer_ip)
    } else {
        is_trusted_proxy(&peer_ip, trusted_proxies)
    };

    if trusted && let Some(ip) = forwarded_ip(headers) {
        trace!("Forwarded client IP {} via proxy {}", ip, peer_ip);
        return Some(ip);
    }
    Some(peer_ip.to_string())
}

/// 从 HttpRequest 提取客户端 IP
pub fn client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    let conn = req.connection_info();
    resolve_client_ip(conn.peer_addr(), req.headers(), trusted_proxies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn test_cidr_matching() {
        let ip: IpAddr = "172.20.3.4".parse().unwrap();
        assert!(ip_in_cidr(&ip, "172.16.0.0/12"));
        assert!(!ip_in_cidr(&ip, "172.32.0.0/12"));
        assert!(!ip_in_cidr(&ip, "172.16.0.0/40"));

        let v6: IpAddr = "2001:db8::7".parse().unwrap();
        assert!(ip_in_cidr(&v6, "2001:db8::/32"));
        assert!(!ip_in_cidr(&v6, "10.0.0.0/8"));
    }

    #[test]
    fn test_private_detection() {
        assert!(is_private_or_local(&"10.1.2.3".parse().unwrap()));
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd12::1".parse().unwrap()));
        assert!(!is_private_or_local(&"9.9.9.9".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_first_hop_then_real_ip() {
        let h = headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.2")]);
        assert_eq!(forwarded_ip(&h).as_deref(), Some("203.0.113.9"));

        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(forwarded_ip(&h).as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_public_peer_cannot_spoof() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4")]);
        assert_eq!(
            resolve_client_ip(Some("8.8.8.8:5555"), &h, &[]).as_deref(),
            Some("8.8.8.8")
        );
    }

    #[test]
    fn test_private_peer_is_auto_trusted() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4")]);
        assert_eq!(
            resolve_client_ip(Some("127.0.0.1:40000"), &h, &[]).as_deref(),
            Some("1.2.3.4")
        );
    }

    #[test]
    fn test_explicit_trusted_proxies_override_auto_detection() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4")]);
        let trusted = vec!["192.0.2.0/24".to_string()];

        assert_eq!(
            resolve_client_ip(Some("192.0.2.10"), &h, &trusted).as_deref(),
            Some("1.2.3.4")
        );
        // 私有地址但不在列表中
        assert_eq!(
            resolve_client_ip(Some("10.0.0.1"), &h, &trusted).as_deref(),
            Some("10.0.0.1")
        );
    }
}
