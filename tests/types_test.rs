use booking_intake::*;

// --- MessageId ---

#[test]
fn test_message_id_new() {
    let id = MessageId::new("18c2f0a9d3e4b5c6");
    assert_eq!(id.as_str(), "18c2f0a9d3e4b5c6");
}

#[test]
fn test_message_id_display() {
    let id = MessageId::new("18c2f");
    assert_eq!(id.to_string(), "18c2f");
}

#[test]
fn test_message_id_equality() {
    let a = MessageId::new("same");
    let b = MessageId::new("same");
    assert_eq!(a, b);
}

// --- GuestName ---

#[test]
fn test_guest_name_with_honorific() {
    let name = GuestName::parse("Mw. Els Jansen").unwrap();
    assert_eq!(name.first, "Els");
    assert_eq!(name.last.as_deref(), Some("Jansen"));
}

#[test]
fn test_guest_name_keeps_infix_with_surname() {
    let name = GuestName::parse("Dhr. Jan de Vries").unwrap();
    assert_eq!(name.first, "Jan");
    assert_eq!(name.last.as_deref(), Some("de Vries"));
}

#[test]
fn test_guest_name_honorific_case_insensitive() {
    let name = GuestName::parse("MEVR. Anna van den Berg").unwrap();
    assert_eq!(name.first, "Anna");
    assert_eq!(name.last.as_deref(), Some("van den Berg"));
}

#[test]
fn test_guest_name_without_honorific() {
    let name = GuestName::parse("Els Jansen").unwrap();
    assert_eq!(name.first, "Els");
    assert_eq!(name.last.as_deref(), Some("Jansen"));
}

#[test]
fn test_guest_name_single() {
    let name = GuestName::parse("Els").unwrap();
    assert_eq!(name.first, "Els");
    assert!(name.last.is_none());
}

#[test]
fn test_guest_name_whitespace() {
    let name = GuestName::parse("  Els   Jansen  ").unwrap();
    assert_eq!(name.to_string(), "Els Jansen");
}

#[test]
fn test_guest_name_empty() {
    assert!(GuestName::parse("").is_none());
    assert!(GuestName::parse("Mw.").is_none());
}

// --- CountryCode ---

#[test]
fn test_country_from_token() {
    assert_eq!(CountryCode::from_token("nl"), Some(CountryCode::Netherlands));
    assert_eq!(CountryCode::from_token(" DE "), Some(CountryCode::Germany));
    assert_eq!(CountryCode::from_token("uk"), Some(CountryCode::UnitedKingdom));
    assert_eq!(CountryCode::from_token("Be"), Some(CountryCode::Belgium));
    assert_eq!(CountryCode::from_token("fr"), None);
    assert_eq!(CountryCode::from_token("Other"), None);
}

#[test]
fn test_country_from_name() {
    let cases = [
        ("Nederland", CountryCode::Netherlands),
        ("Holland", CountryCode::Netherlands),
        ("Duitsland", CountryCode::Germany),
        ("Deutschland", CountryCode::Germany),
        ("Verenigd Koninkrijk", CountryCode::UnitedKingdom),
        ("GB", CountryCode::UnitedKingdom),
        ("België", CountryCode::Belgium),
        ("belgie", CountryCode::Belgium),
        ("NL", CountryCode::Netherlands),
    ];
    for (name, expected) in cases {
        assert_eq!(CountryCode::from_name(name), Some(expected), "{name}");
    }
    assert_eq!(CountryCode::from_name("Frankrijk"), None);
}

#[test]
fn test_country_scan_order() {
    let codes: Vec<&str> = CountryCode::SCAN_ORDER.iter().map(|c| c.as_str()).collect();
    assert_eq!(codes, ["NL", "DE", "UK", "BE"]);
}

#[test]
fn test_country_serializes_as_code() {
    assert_eq!(
        serde_json::to_value(CountryCode::UnitedKingdom).unwrap(),
        "UK"
    );
    assert_eq!(serde_json::to_value(CountryCode::Other).unwrap(), "Other");
    assert_eq!(CountryCode::default(), CountryCode::Other);
}

// --- Field ---

#[test]
fn test_field_serializes_sentinel() {
    let found: Field<String> = Field::Found("Zutphen".to_string());
    let missing: Field<String> = Field::NotFound;

    assert_eq!(serde_json::to_value(&found).unwrap(), "Zutphen");
    assert_eq!(serde_json::to_value(&missing).unwrap(), "Not found");
}

#[test]
fn test_field_conversions() {
    assert_eq!(Field::from(Some(3)), Field::Found(3));
    assert_eq!(Field::<u32>::from(None), Field::NotFound);
    assert_eq!(Field::Found(2).map(|n| n * 2).into_option(), Some(4));
    assert_eq!(Field::<u32>::default(), Field::NotFound);
}

#[test]
fn test_field_display_or_sentinel() {
    assert_eq!(Field::Found("Els").display_or_sentinel(), "Els");
    assert_eq!(Field::<&str>::NotFound.display_or_sentinel(), NOT_FOUND);
}

// --- Price ---

#[test]
fn test_price_display() {
    assert_eq!(Price::from_cents(73_500).to_string(), "735.00");
    assert_eq!(Price::from_cents(7).to_string(), "0.07");
    assert_eq!(Price::from_cents(110_550).to_string(), "1105.50");
}

#[test]
fn test_price_serializes_as_number() {
    assert_eq!(
        serde_json::to_value(Price::from_cents(73_500)).unwrap(),
        serde_json::json!(735.0)
    );
}

// --- GuestCounts / LayoutVariant ---

#[test]
fn test_guest_counts_total() {
    let guests = GuestCounts {
        adults: 2,
        children: 2,
        infants: 1,
    };
    assert_eq!(guests.total(), 5);
    assert_eq!(GuestCounts::default().total(), 0);
}

#[test]
fn test_layout_variant_display() {
    assert_eq!(LayoutVariant::KeywordAnchored.to_string(), "keyword-anchored");
    assert_eq!(LayoutVariant::BookingForm.to_string(), "booking-form");
    assert_eq!(
        serde_json::to_value(LayoutVariant::BookingForm).unwrap(),
        "booking_form"
    );
}

#[test]
fn test_guest_counts_total_saturates() {
    let guests = GuestCounts {
        adults: u32::MAX,
        children: 1,
        infants: 0,
    };
    assert_eq!(guests.total(), u32::MAX);
}
