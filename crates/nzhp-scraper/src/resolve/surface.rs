use nzhp_core::SiteId;

/// Where and how a site's address search is driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSurface {
    pub site: SiteId,
    /// Page hosting the search box.
    pub page_url: String,
    /// The address input on `page_url`.
    pub input_selector: String,
    /// Candidate property links in the results or autocomplete list.
    pub link_selector: String,
    /// Substring every property-page href contains.
    pub href_marker: String,
    /// Results URL with a `{query}` placeholder, for sessions that cannot
    /// type into inputs. `None` when the site only searches via script.
    pub query_url: Option<String>,
}

const ADDRESS_INPUT: &str = "input[type='search'], input[placeholder*='address' i]";

impl SearchSurface {
    /// The built-in surface for `site`.
    #[must_use]
    pub fn for_site(site: SiteId) -> Self {
        let (page_url, link_selector, href_marker) = match site {
            SiteId::Homes => ("https://homes.co.nz", "a[href*='/address/']", "/address/"),
            SiteId::Qv => ("https://www.qv.co.nz", "a[href*='/property/']", "/property/"),
            SiteId::PropertyValue => (
                "https://www.propertyvalue.co.nz",
                "a[href*='/property/']",
                "/property/",
            ),
            SiteId::RealEstate => (
                "https://www.realestate.co.nz",
                "a[href*='/property/']",
                "/property/",
            ),
            SiteId::OneRoof => (
                "https://www.oneroof.co.nz",
                "a[href*='/property/']",
                "/property/",
            ),
        };

        Self {
            site,
            page_url: page_url.to_string(),
            input_selector: ADDRESS_INPUT.to_string(),
            link_selector: link_selector.to_string(),
            href_marker: href_marker.to_string(),
            query_url: None,
        }
    }

    /// Same surface with a query-URL template.
    #[must_use]
    pub fn with_query_url(mut self, template: impl Into<String>) -> Self {
        self.query_url = Some(template.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_site_has_a_surface_on_its_own_domain() {
        for site in SiteId::ALL {
            let surface = SearchSurface::for_site(site);
            assert_eq!(SiteId::from_url(&surface.page_url), Some(site));
            assert!(surface.link_selector.contains(&surface.href_marker));
        }
    }

    #[test]
    fn query_template_is_opt_in() {
        let surface = SearchSurface::for_site(SiteId::OneRoof);
        assert!(surface.query_url.is_none());
        let surface = surface.with_query_url("https://www.oneroof.co.nz/search?q={query}");
        assert!(surface.query_url.unwrap().contains("{query}"));
    }
}
