//! The fixed list of valuation sites.

use serde::{Deserialize, Serialize};

/// A supported real-estate valuation site.
///
/// The list is closed: site quirks live in selector and search-surface
/// tables keyed by this enum, not in per-site code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SiteId {
    #[serde(rename = "homes.co.nz")]
    Homes,
    #[serde(rename = "qv.co.nz")]
    Qv,
    #[serde(rename = "propertyvalue.co.nz")]
    PropertyValue,
    #[serde(rename = "realestate.co.nz")]
    RealEstate,
    #[serde(rename = "oneroof.co.nz")]
    OneRoof,
}

impl SiteId {
    pub const ALL: [SiteId; 5] = [
        SiteId::Homes,
        SiteId::Qv,
        SiteId::PropertyValue,
        SiteId::RealEstate,
        SiteId::OneRoof,
    ];

    /// Bare domain, used as the site's name in results and config.
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            SiteId::Homes => "homes.co.nz",
            SiteId::Qv => "qv.co.nz",
            SiteId::PropertyValue => "propertyvalue.co.nz",
            SiteId::RealEstate => "realestate.co.nz",
            SiteId::OneRoof => "oneroof.co.nz",
        }
    }

    /// Human-facing brand name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SiteId::Homes => "homes.co.nz",
            SiteId::Qv => "QV",
            SiteId::PropertyValue => "PropertyValue",
            SiteId::RealEstate => "realestate.co.nz",
            SiteId::OneRoof => "OneRoof",
        }
    }

    /// Whether the site publishes a midpoint estimate at all.
    ///
    /// `propertyvalue.co.nz` only shows a low/high range; its midpoint is
    /// imputed during aggregation.
    #[must_use]
    pub fn publishes_midpoint(self) -> bool {
        !matches!(self, SiteId::PropertyValue)
    }

    /// Looks a site up by its domain name (case-insensitive, optional `www.`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let name = name.strip_prefix("www.").unwrap_or(&name);
        Self::ALL.into_iter().find(|site| site.domain() == name)
    }

    /// Determines which site a URL belongs to by its host.
    ///
    /// Matches the bare domain and any subdomain of it, so
    /// `https://www.qv.co.nz/...` resolves to [`SiteId::Qv`].
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let host = url_host(url)?;
        Self::ALL.into_iter().find(|site| {
            let domain = site.domain();
            host == domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.domain())
    }
}

/// Lowercased host portion of an absolute URL, without port or credentials.
fn url_host(url: &str) -> Option<String> {
    let (_, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_distinct() {
        let names: std::collections::HashSet<&str> =
            SiteId::ALL.into_iter().map(SiteId::display_name).collect();
        assert_eq!(names.len(), SiteId::ALL.len());
        assert_eq!(SiteId::Qv.display_name(), "QV");
    }

    #[test]
    fn from_url_matches_www_subdomain() {
        assert_eq!(
            SiteId::from_url("https://www.qv.co.nz/property-search/123"),
            Some(SiteId::Qv)
        );
    }

    #[test]
    fn from_url_matches_bare_domain() {
        assert_eq!(
            SiteId::from_url("https://homes.co.nz/address/christchurch"),
            Some(SiteId::Homes)
        );
    }

    #[test]
    fn from_url_rejects_lookalike_host() {
        assert_eq!(SiteId::from_url("https://notqv.co.nz/x"), None);
        assert_eq!(SiteId::from_url("https://example.com/qv.co.nz"), None);
    }

    #[test]
    fn from_url_ignores_port_and_credentials() {
        assert_eq!(
            SiteId::from_url("http://user:pw@www.oneroof.co.nz:8443/property/1"),
            Some(SiteId::OneRoof)
        );
    }

    #[test]
    fn from_url_without_scheme_is_none() {
        assert_eq!(SiteId::from_url("www.qv.co.nz/property"), None);
    }

    #[test]
    fn from_name_accepts_www_and_case() {
        assert_eq!(SiteId::from_name("WWW.RealEstate.co.nz"), Some(SiteId::RealEstate));
        assert_eq!(SiteId::from_name("trademe.co.nz"), None);
    }

    #[test]
    fn only_propertyvalue_hides_midpoint() {
        let hidden: Vec<SiteId> = SiteId::ALL
            .into_iter()
            .filter(|s| !s.publishes_midpoint())
            .collect();
        assert_eq!(hidden, vec![SiteId::PropertyValue]);
    }

    #[test]
    fn serde_uses_domain_names() {
        let json = serde_json::to_string(&SiteId::OneRoof).unwrap();
        assert_eq!(json, "\"oneroof.co.nz\"");
    }
}
