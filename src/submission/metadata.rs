use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;
use serde::Serialize;

/// Request context stored beside each submission for moderation.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetadata {
    pub ip: String,
    pub user_agent: String,
    pub referer: String,
}

impl RequestMetadata {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

pub fn extract(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> RequestMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .chars()
            .take(512)
            .collect::<String>()
    };

    RequestMetadata {
        ip: client_ip(headers, peer_addr, trusted_proxies).to_string(),
        user_agent: header("user-agent"),
        referer: header("referer"),
    }
}

/// Real client address. `X-Forwarded-For` is honoured only when the peer is a trusted proxy.
pub fn client_ip(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> IpAddr {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    if !trusted_proxies.iter().any(|net| net.contains(&peer)) {
        return peer;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| {
            // Walk from the right: the nearest hop that is not one of ours
            xff.rsplit(',')
                .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                .find(|ip| !trusted_proxies.iter().any(|net| net.contains(ip)))
        })
        .unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_header_ignored_from_untrusted_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        let peer: IpAddr = "10.0.0.9".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), &[]), peer);
    }

    #[test]
    fn forwarded_header_used_behind_trusted_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.2"));
        let proxies: Vec<IpNet> = vec!["10.0.0.0/8".parse().unwrap()];
        let ip = client_ip(&headers, Some("10.0.0.1".parse().unwrap()), &proxies);
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn metadata_captures_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
        let meta = extract(&headers, None, &[]);
        assert_eq!(meta.user_agent, "Mozilla/5.0");
        assert_eq!(meta.ip, "127.0.0.1");
        assert_eq!(meta.referer, "");
    }
}
