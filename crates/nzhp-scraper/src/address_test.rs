use super::*;

// -----------------------------------------------------------------------
// parse_address
// -----------------------------------------------------------------------

#[test]
fn parse_full_address_with_slash_unit() {
    let parsed = parse_address("2/677 Worcester Street, Linwood, Christchurch");
    assert_eq!(parsed.unit, "2");
    assert_eq!(parsed.street_number, "677");
    assert_eq!(parsed.street_name, "Worcester");
    assert_eq!(parsed.street_type, "street");
    assert_eq!(parsed.suburb, "Linwood");
    assert_eq!(parsed.city, "Christchurch");
}

#[test]
fn parse_street_number_and_name() {
    let cases = [
        ("123 Example Street", "123", "Example"),
        ("45A Main Road", "45A", "Main"),
        ("7 Queen Avenue", "7", "Queen"),
        ("1 Short St", "1", "Short"),
    ];
    for (address, number, name) in cases {
        let parsed = parse_address(address);
        assert_eq!(parsed.street_number, number, "{address}");
        assert_eq!(parsed.street_name, name, "{address}");
    }
}

#[test]
fn parse_unit_forms() {
    let cases = [
        ("3/14 Example Street", "3"),
        ("1A/100 Main Road", "1A"),
        ("Unit 5, 100 Main Road", "5"),
        ("Flat 2A, 50 Queen St", "2A"),
        ("Apt 12, 200 High Street", "12"),
        ("Apartment 12, 200 High Street", "12"),
    ];
    for (address, unit) in cases {
        assert_eq!(parse_address(address).unit, unit, "{address}");
    }
}

#[test]
fn parse_prefix_unit_keeps_street() {
    let parsed = parse_address("Flat 2A, 50 Queen St, Ponsonby");
    assert_eq!(parsed.street_number, "50");
    assert_eq!(parsed.street_name, "Queen");
    assert_eq!(parsed.street_type, "street");
    assert_eq!(parsed.suburb, "Ponsonby");
}

#[test]
fn parse_expands_street_type_abbreviations() {
    let cases = [
        ("7 Queen Ave", "avenue"),
        ("10 King Dr", "drive"),
        ("50 Park Place", "place"),
        ("30 Ocean Crescent", "crescent"),
        ("5 Hill Tce", "terrace"),
        ("9 Bay Rd.", "road"),
    ];
    for (address, street_type) in cases {
        assert_eq!(parse_address(address).street_type, street_type, "{address}");
    }
}

#[test]
fn parse_multi_word_suburb() {
    let parsed = parse_address("21 Onslow Road, Lake Hayes, Queenstown");
    assert_eq!(parsed.street_type, "road");
    assert_eq!(parsed.suburb, "Lake Hayes");
    assert_eq!(parsed.city, "Queenstown");
}

#[test]
fn parse_collapses_whitespace_and_preserves_raw() {
    let raw = "  123   Example  Street ,  Ponsonby ";
    let parsed = parse_address(raw);
    assert_eq!(parsed.street_name, "Example");
    assert_eq!(parsed.suburb, "Ponsonby");
    assert_eq!(parsed.raw, raw);
}

#[test]
fn parse_empty_and_blank_addresses() {
    for raw in ["", "   "] {
        let parsed = parse_address(raw);
        assert_eq!(parsed.street_number, "");
        assert_eq!(parsed.street_name, "");
        assert_eq!(parsed.raw, raw);
    }
}

#[test]
fn parse_without_street_type_keeps_whole_name() {
    let parsed = parse_address("12 The Strand");
    assert_eq!(parsed.street_number, "12");
    assert_eq!(parsed.street_name, "The Strand");
    assert_eq!(parsed.street_type, "");
}

// -----------------------------------------------------------------------
// normalize_address / abbreviate_street_type
// -----------------------------------------------------------------------

#[test]
fn normalize_expands_abbreviations() {
    let cases = [
        ("123 Example St", "123 Example Street"),
        ("45 Main Rd", "45 Main Road"),
        ("7 Queen Ave", "7 Queen Avenue"),
        ("10 King Dr", "10 King Drive"),
        ("50 Park Pl", "50 Park Place"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize_address(input), expected);
    }
}

#[test]
fn normalize_keeps_comma_structure() {
    assert_eq!(
        normalize_address("123 Example St, Ponsonby, Auckland"),
        "123 Example Street, Ponsonby, Auckland"
    );
}

#[test]
fn normalize_trims_and_collapses() {
    assert_eq!(normalize_address("  123   Example   Street  "), "123 Example Street");
    assert_eq!(normalize_address(""), "");
}

#[test]
fn normalize_leaves_full_street_type_alone() {
    assert_eq!(normalize_address("123 example street"), "123 example street");
}

#[test]
fn abbreviate_street_type_shortens_full_form() {
    assert_eq!(
        abbreviate_street_type("66 Pacific Road").as_deref(),
        Some("66 Pacific Rd")
    );
    assert_eq!(abbreviate_street_type("66 Pacific Rd"), None);
    assert_eq!(abbreviate_street_type("3 Kent Mews"), None);
}

// -----------------------------------------------------------------------
// ParsedAddress
// -----------------------------------------------------------------------

#[test]
fn search_string_includes_unit_and_suburb() {
    let parsed = ParsedAddress {
        street_number: "14".into(),
        street_name: "Example".into(),
        street_type: "street".into(),
        unit: "3".into(),
        suburb: "Ponsonby".into(),
        ..ParsedAddress::default()
    };
    assert_eq!(parsed.to_search_string(), "3/14 Example street, Ponsonby");
}

#[test]
fn search_string_without_optional_parts() {
    let parsed = ParsedAddress {
        street_number: "123".into(),
        street_name: "Example".into(),
        street_type: "street".into(),
        ..ParsedAddress::default()
    };
    assert_eq!(parsed.to_search_string(), "123 Example street");
}

#[test]
fn slug_is_lowercase_and_hyphenated() {
    let parsed = ParsedAddress {
        street_number: "123".into(),
        street_name: "Example".into(),
        street_type: "street".into(),
        ..ParsedAddress::default()
    };
    assert_eq!(parsed.to_slug(), "123-example-street");
}

#[test]
fn slug_drops_special_characters() {
    let parsed = ParsedAddress {
        street_number: "4B".into(),
        street_name: "O'Neill's".into(),
        ..ParsedAddress::default()
    };
    let slug = parsed.to_slug();
    assert_eq!(slug, "4b-o-neill-s");
    assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
}

// -----------------------------------------------------------------------
// street type table
// -----------------------------------------------------------------------

#[test]
fn every_abbreviation_maps_back_to_its_full_form() {
    for (full, abbrevs) in STREET_TYPES {
        assert_eq!(canonical_street_type(full), Some(*full));
        for abbr in *abbrevs {
            assert_eq!(canonical_street_type(abbr), Some(*full), "{abbr}");
        }
    }
}

#[test]
fn abbreviation_lookup_is_bidirectional() {
    assert_eq!(street_type_abbreviation("street"), Some("st"));
    assert_eq!(street_type_abbreviation("Rd"), Some("rd"));
    assert_eq!(street_type_abbreviation("mews"), None);
    assert_eq!(street_type_abbreviation("strand"), None);
}
