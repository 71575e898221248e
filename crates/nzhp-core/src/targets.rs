use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sites::SiteId;
use crate::ConfigError;

static URL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("valid URL regex")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetUrls {
    #[serde(default)]
    pub house_price_estimates: Vec<String>,
}

/// Contents of the targets YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsFile {
    /// Street address to resolve on each of `sites`.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub urls: TargetUrls,
    /// Per-site search-results URL templates with a `{query}` placeholder,
    /// used to resolve `address` without an interactive session.
    #[serde(default)]
    pub search_urls: BTreeMap<String, String>,
}

/// A single unit of scraping work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A known property page. `site` is `None` when the host is unsupported.
    Url { site: Option<SiteId>, url: String },
    /// An address that must be resolved to a page on `site` first.
    Address { site: SiteId, address: String },
}

impl Target {
    /// Site name used in results; `"unknown"` for unsupported URLs.
    #[must_use]
    pub fn site_name(&self) -> &'static str {
        match self {
            Target::Url { site, .. } => site.map_or("unknown", SiteId::domain),
            Target::Address { site, .. } => site.domain(),
        }
    }
}

impl TargetsFile {
    /// Expands the file into scraping targets: explicit URLs first, then one
    /// address target per listed site that has no explicit URL.
    ///
    /// Assumes the file already passed validation; unknown site names are
    /// skipped.
    #[must_use]
    pub fn targets(&self) -> Vec<Target> {
        let mut out: Vec<Target> = self
            .urls
            .house_price_estimates
            .iter()
            .map(|url| Target::Url {
                site: SiteId::from_url(url),
                url: url.trim().to_string(),
            })
            .collect();

        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            for site in self.sites.iter().filter_map(|name| SiteId::from_name(name)) {
                let covered = out
                    .iter()
                    .any(|t| matches!(t, Target::Url { site: Some(s), .. } if *s == site));
                let duplicate = out
                    .iter()
                    .any(|t| matches!(t, Target::Address { site: s, .. } if *s == site));
                if !covered && !duplicate {
                    out.push(Target::Address {
                        site,
                        address: address.trim().to_string(),
                    });
                }
            }
        }

        out
    }

    /// `search_urls` keyed by site. Unknown site names are skipped.
    #[must_use]
    pub fn search_urls(&self) -> Vec<(SiteId, String)> {
        self.search_urls
            .iter()
            .filter_map(|(name, template)| {
                SiteId::from_name(name).map(|site| (site, template.trim().to_string()))
            })
            .collect()
    }
}

/// Load and validate the targets file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let targets_file: TargetsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::TargetsFileParse)?;

    validate_targets(&targets_file)?;

    Ok(targets_file)
}

fn validate_targets(targets_file: &TargetsFile) -> Result<(), ConfigError> {
    let urls = &targets_file.urls.house_price_estimates;
    let has_address = targets_file
        .address
        .as_deref()
        .is_some_and(|a| !a.trim().is_empty());

    if urls.is_empty() && !(has_address && !targets_file.sites.is_empty()) {
        return Err(ConfigError::Validation(
            "no targets: provide urls.house_price_estimates or an address with sites".to_string(),
        ));
    }

    if !targets_file.sites.is_empty() && !has_address {
        return Err(ConfigError::Validation(
            "sites are listed but no address is given to resolve".to_string(),
        ));
    }

    for name in &targets_file.sites {
        if SiteId::from_name(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "unknown site '{name}'; expected one of: {}",
                SiteId::ALL.map(SiteId::domain).join(", ")
            )));
        }
    }

    for url in urls {
        if !URL_SHAPE.is_match(url.trim()) {
            return Err(ConfigError::Validation(format!("invalid URL: '{url}'")));
        }
        if SiteId::from_url(url).is_none() {
            tracing::warn!(url = %url, "URL does not belong to a supported site");
        }
    }

    for (name, template) in &targets_file.search_urls {
        if SiteId::from_name(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "search_urls: unknown site '{name}'"
            )));
        }
        let template = template.trim();
        if !template.contains("{query}") || !URL_SHAPE.is_match(template) {
            return Err(ConfigError::Validation(format!(
                "search_urls: '{template}' for {name} must be a URL containing {{query}}"
            )));
        }
    }

    Ok(())
}
