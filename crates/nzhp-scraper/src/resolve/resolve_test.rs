use super::*;
use crate::session::fake::FakeSession;

const BRIGHTON: &str = "66 Pacific Road, North New Brighton, Christchurch";

fn results_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, text)| format!(r#"<li><a href="{href}">{text}</a></li>"#))
        .collect();
    format!("<html><body><a href=\"/news/1\">News</a><ul>{items}</ul></body></html>")
}

fn resolver(session: &FakeSession) -> PropertyResolver<'_, FakeSession> {
    PropertyResolver::new(SiteId::OneRoof, session, ResolverSettings::default())
}

// ---------------------------------------------------------------------------
// search_queries
// ---------------------------------------------------------------------------

#[test]
fn query_ladder_drops_segments_then_abbreviates() {
    assert_eq!(
        search_queries(BRIGHTON),
        vec![
            BRIGHTON.to_string(),
            "66 Pacific Road, North New Brighton".to_string(),
            "66 Pacific Road".to_string(),
            "66 Pacific Rd".to_string(),
        ]
    );
}

#[test]
fn query_ladder_without_street_type() {
    assert_eq!(search_queries("1 Queen"), vec!["1 Queen".to_string()]);
    assert!(search_queries("").is_empty());
}

// ---------------------------------------------------------------------------
// search_property
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exact_match_ranks_first_with_full_confidence() {
    let page = results_page(&[
        ("/property/gisborne/66-pacific-road/def", "66 Pacific Road, Gisborne"),
        (
            "/property/christchurch/66-pacific-road/abc",
            "66 Pacific Road, North New Brighton, Christchurch<br>House, 3 bedrooms",
        ),
    ]);
    let session = FakeSession::new().with_search(BRIGHTON, &page);

    let results = resolver(&session).search_property(BRIGHTON).await.unwrap();

    assert_eq!(results.len(), 2);
    let best = &results[0];
    assert_eq!(
        best.url,
        "https://www.oneroof.co.nz/property/christchurch/66-pacific-road/abc"
    );
    assert_eq!(best.address, BRIGHTON);
    assert!((best.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(best.site, "oneroof.co.nz");
    assert!(best.extra_info.as_ref().unwrap().location_match);

    let flagged = &results[1];
    assert!(flagged.confidence.abs() < f64::EPSILON);
    assert!(!flagged.extra_info.as_ref().unwrap().location_match);
}

#[tokio::test]
async fn broadens_query_until_candidates_appear() {
    let page = results_page(&[(
        "/property/christchurch/66-pacific-road/abc",
        "66 Pacific Road, North New Brighton, Christchurch",
    )]);
    let session = FakeSession::new().with_search("66 Pacific Road", &page);

    let results = resolver(&session).search_property(BRIGHTON).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        session.recorded_queries(),
        vec![
            BRIGHTON.to_string(),
            "66 Pacific Road, North New Brighton".to_string(),
            "66 Pacific Road".to_string(),
        ]
    );
}

#[tokio::test]
async fn falls_back_to_abbreviated_street_type() {
    let page = results_page(&[(
        "/property/christchurch/66-pacific-road/abc",
        "66 Pacific Rd, North New Brighton, Christchurch",
    )]);
    let session = FakeSession::new().with_search("66 Pacific Rd", &page);

    let results = resolver(&session).search_property(BRIGHTON).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(session.recorded_queries().len(), 4);
}

#[tokio::test]
async fn abbreviated_input_is_expanded_before_searching() {
    let session = FakeSession::new();
    resolver(&session)
        .search_property("66  Pacific Rd, North New Brighton")
        .await
        .unwrap();
    assert_eq!(
        session.recorded_queries().first().map(String::as_str),
        Some("66 Pacific Road, North New Brighton")
    );
}

#[tokio::test]
async fn nothing_found_is_empty_not_error() {
    let session = FakeSession::new();
    let results = resolver(&session).search_property(BRIGHTON).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn duplicate_links_are_collapsed() {
    let page = results_page(&[
        ("/property/christchurch/66-pacific-road/abc", BRIGHTON),
        ("/property/christchurch/66-pacific-road/abc", BRIGHTON),
    ]);
    let session = FakeSession::new().with_search(BRIGHTON, &page);
    let results = resolver(&session).search_property(BRIGHTON).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn matching_unit_wins_over_dom_order() {
    let target = "2/677 Worcester Street, Linwood, Christchurch";
    let page = results_page(&[
        ("/property/christchurch/linwood/5-677-worcester-street/x", "5/677 Worcester Street, Linwood, Christchurch"),
        ("/property/christchurch/linwood/2-677-worcester-street/y", "2/677 Worcester Street, Linwood, Christchurch"),
    ]);
    let session = FakeSession::new().with_search(target, &page);

    let results = resolver(&session).search_property(target).await.unwrap();

    assert!(results[0].url.ends_with("/2-677-worcester-street/y"));
    assert!(results[0].extra_info.as_ref().unwrap().score > results[1].extra_info.as_ref().unwrap().score);
}

#[tokio::test]
async fn session_failure_propagates() {
    let session = FakeSession::new();
    session.close().await.unwrap();
    let err = resolver(&session).search_property(BRIGHTON).await.unwrap_err();
    assert!(matches!(err, SessionError::Closed));
}

// ---------------------------------------------------------------------------
// get_property_url
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confident_match_returns_url() {
    let page = results_page(&[("/property/christchurch/66-pacific-road/abc", BRIGHTON)]);
    let session = FakeSession::new().with_search(BRIGHTON, &page);
    let url = resolver(&session).get_property_url(BRIGHTON).await.unwrap();
    assert_eq!(
        url.as_deref(),
        Some("https://www.oneroof.co.nz/property/christchurch/66-pacific-road/abc")
    );
}

#[tokio::test]
async fn weak_match_is_unresolved() {
    // Two of seven words overlap: confidence 2/7 stays under 0.5.
    let page = results_page(&[("/property/christchurch/66-pacific-road/abc", "66 Pacific Road")]);
    let session = FakeSession::new().with_search(BRIGHTON, &page);
    let url = resolver(&session).get_property_url(BRIGHTON).await.unwrap();
    assert_eq!(url, None);
}

#[tokio::test]
async fn threshold_is_configurable() {
    let page = results_page(&[("/property/christchurch/66-pacific-road/abc", "66 Pacific Road")]);
    let session = FakeSession::new().with_search(BRIGHTON, &page);
    let settings = ResolverSettings {
        url_confidence_threshold: 0.2,
        ..ResolverSettings::default()
    };
    let url = PropertyResolver::new(SiteId::OneRoof, &session, settings)
        .get_property_url(BRIGHTON)
        .await
        .unwrap();
    assert!(url.is_some());
}

#[test]
fn unknown_site_name_has_no_resolver() {
    let session = FakeSession::new();
    assert!(
        PropertyResolver::for_site_name("example.com", &session, ResolverSettings::default())
            .is_none()
    );
    let resolver =
        PropertyResolver::for_site_name("www.OneRoof.co.nz", &session, ResolverSettings::default())
            .unwrap();
    assert_eq!(resolver.site(), SiteId::OneRoof);
}
