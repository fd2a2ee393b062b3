//! Table-driven prefix routing.

use std::collections::BTreeMap;

use util::config::AppConfig;

pub const API_PREFIX: &str = "/api/v1/";

/// Upstream chosen for a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub domain: &'a str,
    pub upstream: &'a str,
}

impl Route<'_> {
    /// Absolute upstream URL for the original path and query.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.upstream.trim_end_matches('/'), path_and_query)
    }
}

/// Domain → base URL of the backend owning it.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    upstreams: BTreeMap<String, String>,
}

impl RoutingTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            upstreams: entries
                .into_iter()
                .map(|(domain, url)| (domain.into(), url.into()))
                .collect(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(AppConfig::global().service_urls.clone())
    }

    pub fn domain_of(path: &str) -> Option<&str> {
        let rest = path.strip_prefix(API_PREFIX)?;
        let domain = rest.split('/').next()?;
        (!domain.is_empty()).then_some(domain)
    }

    pub fn resolve<'a>(&'a self, path: &'a str) -> Option<Route<'a>> {
        let domain = Self::domain_of(path)?;
        let upstream = self.upstreams.get(domain)?;
        Some(Route { domain, upstream })
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        RoutingTable::new([
            ("attendance", "http://attendance:8080/"),
            ("qr", "http://qr:8080"),
        ])
    }

    #[test]
    fn resolves_by_first_segment() {
        let table = table();
        let route = table.resolve("/api/v1/attendance/qr/scan").unwrap();
        assert_eq!(route.domain, "attendance");
        assert_eq!(
            route.url_for("/api/v1/attendance/qr/scan?x=1"),
            "http://attendance:8080/api/v1/attendance/qr/scan?x=1"
        );

        let route = table.resolve("/api/v1/qr").unwrap();
        assert_eq!(route.domain, "qr");
    }

    #[test]
    fn unknown_or_malformed_paths_do_not_resolve() {
        let table = table();
        assert!(table.resolve("/api/v1/payroll/run").is_none());
        assert!(table.resolve("/api/v1/").is_none());
        assert!(table.resolve("/api/v2/attendance").is_none());
        assert!(table.resolve("/attendance").is_none());
    }

    #[test]
    fn prefix_must_be_a_whole_segment() {
        assert_eq!(RoutingTable::domain_of("/api/v1/qrcodes/x"), Some("qrcodes"));
        assert!(table().resolve("/api/v1/qrcodes/x").is_none());
    }
}
