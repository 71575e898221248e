//! `resolve` and `parse-address` commands.

use nzhp_core::{AppConfig, SiteId};
use nzhp_scraper::{
    normalize_address, parse_address, BrowserSession, HttpSession, PropertyResolver,
    ResolverSettings, SearchSurface,
};

/// Search one site for `address` and print the ranked candidates.
///
/// # Errors
///
/// Returns an error for an unsupported site name, or when the search
/// itself fails (a site without `query_url` cannot be searched over plain
/// HTTP).
pub(crate) async fn run_resolve(
    config: &AppConfig,
    site: &str,
    address: &str,
    query_url: Option<&str>,
) -> anyhow::Result<()> {
    let site_id =
        SiteId::from_name(site).ok_or_else(|| anyhow::anyhow!("unsupported site '{site}'"))?;
    let mut surface = SearchSurface::for_site(site_id);
    if let Some(template) = query_url {
        surface = surface.with_query_url(template);
    }

    let settings = ResolverSettings::from_config(config);
    let session = HttpSession::new(&config.user_agent, config.page_load_timeout())?;
    let candidates = PropertyResolver::with_surface(surface, &session, settings)
        .search_property(address)
        .await;
    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "error closing session");
    }
    let candidates = candidates?;

    let url = candidates
        .first()
        .filter(|c| c.confidence > settings.url_confidence_threshold)
        .map(|c| c.url.clone());
    if url.is_none() {
        tracing::warn!(site = site_id.domain(), address, "no confident match");
    }

    let report = serde_json::json!({
        "site": site_id.domain(),
        "site_name": site_id.display_name(),
        "address": address,
        "url": url,
        "candidates": candidates,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the normalized form and parsed components of `address`.
///
/// # Errors
///
/// Returns an error only if the output cannot be serialized.
pub(crate) fn run_parse_address(address: &str) -> anyhow::Result<()> {
    let normalized = normalize_address(address);
    let parsed = parse_address(&normalized);
    let report = serde_json::json!({
        "normalized": normalized,
        "parsed": parsed,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
