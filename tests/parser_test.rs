use booking_intake::*;
use chrono::NaiveDate;

const KEYWORD: &str = include_str!("fixtures/keyword_anchored.txt");
const KEYWORD_WEEK: &str = include_str!("fixtures/keyword_anchored_week.txt");
const FORM: &str = include_str!("fixtures/booking_form.txt");

fn date(y: i32, m: u32, d: u32) -> Field<NaiveDate> {
    Field::Found(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn text(s: &str) -> Field<String> {
    Field::Found(s.to_string())
}

fn assert_core_fields_found(record: &BookingRecord) {
    assert!(record.first_name.is_found(), "first name");
    assert!(record.last_name.is_found(), "last name");
    assert!(record.email.is_found(), "email");
    assert!(record.phone.is_found(), "phone");
    assert!(record.arrival.is_found(), "arrival");
    assert!(record.departure.is_found(), "departure");
    assert!(record.total_price > Price::ZERO, "price");
}

#[test]
fn test_keyword_anchored_sample() {
    let record = extract_booking(KEYWORD).unwrap();

    assert_eq!(record.layout, LayoutVariant::KeywordAnchored);
    assert_eq!(record.first_name, text("Els"));
    assert_eq!(record.last_name, text("Jansen"));
    assert_eq!(record.email, text("info@op-schiermonnikoog.nl"));
    assert_eq!(record.phone, text("0612345678"));
    assert_eq!(record.street_address, text("Rembrandtstraat 15"));
    assert_eq!(record.postal_code, text("7204 BW"));
    assert_eq!(record.city, text("Zutphen"));
    assert_eq!(record.country_code, CountryCode::Netherlands);
    assert_eq!(
        record.guests,
        GuestCounts {
            adults: 2,
            children: 2,
            infants: 1
        }
    );
    assert_eq!(
        record.guest_message,
        text(
            "test aanvraag\nHier volgt nog meer informatie van de gast.\nBedankt en vriendelijke groeten."
        )
    );
    assert_eq!(record.arrival, date(2024, 11, 15));
    assert_eq!(record.departure, date(2024, 11, 18));
    assert_eq!(record.total_price, Price::from_cents(73_500));
    assert_eq!(record.booking_reference, Field::NotFound);
    assert_eq!(record.nights(), Some(3));
}

#[test]
fn test_keyword_anchored_variant_spacing_and_thousands() {
    let record = extract_booking(KEYWORD_WEEK).unwrap();

    assert_core_fields_found(&record);
    assert_eq!(record.first_name, text("Jan"));
    assert_eq!(record.last_name, text("de Vries"));
    assert_eq!(record.street_address, text("Lindenallee 4a"));
    assert_eq!(record.city, text("Hamburg"));
    assert_eq!(record.country_code, CountryCode::Germany);
    assert_eq!(record.phone, text("+49 40 123456"));
    assert_eq!(record.guests.adults, 4);
    assert_eq!(record.guests.children, 0);
    assert_eq!(record.guests.infants, 0);
    assert_eq!(record.guest_message, text("Wij komen met de fiets."));
    assert_eq!(record.total_price, Price::from_cents(142_500));
}

#[test]
fn test_booking_form_sample() {
    let record = extract_booking(FORM).unwrap();

    assert_core_fields_found(&record);
    assert_eq!(record.layout, LayoutVariant::BookingForm);
    assert_eq!(record.booking_reference, text("BA-2024-0193"));
    assert_eq!(record.first_name, text("Anna"));
    assert_eq!(record.last_name, text("van den Berg"));
    assert_eq!(record.street_address, text("Keizersgracht 112"));
    assert_eq!(record.postal_code, text("1015 CW"));
    assert_eq!(record.city, text("Amsterdam"));
    assert_eq!(record.country_code, CountryCode::Netherlands);
    assert_eq!(record.email, text("anna.vandenberg@example.nl"));
    assert_eq!(record.phone, text("06-12345678"));
    assert_eq!(record.guests.total(), 3);
    assert_eq!(
        record.guest_message,
        text("Wij komen graag met de kerst.\nIs een kinderbedje beschikbaar?")
    );
    assert_eq!(record.arrival, date(2024, 12, 20));
    assert_eq!(record.departure, date(2024, 12, 27));
    assert_eq!(record.total_price, Price::from_cents(110_550));
}

#[test]
fn test_crlf_body_parses_like_lf() {
    let crlf = KEYWORD.replace('\n', "\r\n");
    assert_eq!(
        extract_booking(&crlf).unwrap(),
        extract_booking(KEYWORD).unwrap()
    );
}

#[test]
fn test_extraction_is_idempotent() {
    for body in [KEYWORD, KEYWORD_WEEK, FORM] {
        assert_eq!(parse_booking(body), parse_booking(body));
    }
}

#[test]
fn test_periode_scenario() {
    let body = "DIT IS EEN RESERVERING\nPeriode: vrijdag 15-11-2024 tot maandag 18-11-2024\n";
    let record = extract_booking(body).unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["arrival"], "2024-11-15");
    assert_eq!(json["departure"], "2024-11-18");
}

#[test]
fn test_price_scenario() {
    let body = "DIT IS EEN RESERVERING\nReguliere prijs (4d3n) is Euro 735.00\n";
    let record = extract_booking(body).unwrap();

    assert_eq!(record.total_price.to_string(), "735.00");
}

#[test]
fn test_missing_guest_lines_default_to_zero() {
    let body = KEYWORD
        .lines()
        .filter(|line| {
            !line.starts_with("Personen")
                && !line.starts_with("Kinderen")
                && !line.starts_with("Babies")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let record = extract_booking(&body).unwrap();
    assert_eq!(record.guests, GuestCounts::default());
    assert!(record.email.is_found());
}

#[test]
fn test_unrecognized_layout_yields_no_record() {
    let body = "Hallo,\n\nKunnen we in maart komen?\nPeriode: vrijdag 15-11-2024 tot maandag 18-11-2024\n";

    assert!(parse_booking(body).is_none());
    let err = extract_booking(body).unwrap_err();
    assert!(matches!(
        err,
        IntakeError::Extraction {
            reason: ExtractionFailure::UnrecognizedLayout
        }
    ));
}

#[test]
fn test_empty_body_is_an_error() {
    let err = extract_booking("  \n\t\n").unwrap_err();
    assert!(matches!(
        err,
        IntakeError::Extraction {
            reason: ExtractionFailure::EmptyBody
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Extraction);
}

#[test]
fn test_marker_only_body_fills_sentinels() {
    let record = extract_booking("DIT IS EEN RESERVERING\n").unwrap();

    assert_eq!(record.first_name, Field::NotFound);
    assert_eq!(record.arrival, Field::NotFound);
    assert_eq!(record.country_code, CountryCode::Other);
    assert_eq!(record.total_price, Price::ZERO);
    assert_eq!(record.missing_fields().len(), 10);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["email"], NOT_FOUND);
    assert_eq!(json["guest_message"], NOT_FOUND);
    assert_eq!(json["country_code"], "Other");
}

#[test]
fn test_inverted_period_is_flagged_not_fixed() {
    let body = "DIT IS EEN RESERVERING\nPeriode: maandag 18-11-2024 tot vrijdag 15-11-2024\n";
    let record = extract_booking(body).unwrap();

    assert!(!record.has_consistent_period());
    assert_eq!(record.arrival, date(2024, 11, 18));
}

#[test]
fn test_sample_periods_are_consistent() {
    for body in [KEYWORD, KEYWORD_WEEK, FORM] {
        assert!(extract_booking(body).unwrap().has_consistent_period());
    }
}

#[test]
fn test_with_source_keeps_fields() {
    let record = extract_booking(KEYWORD).unwrap();
    let tagged = record.clone().with_source(MessageId::new("18c2f"));

    assert_eq!(tagged.source, Some(MessageId::new("18c2f")));
    assert_eq!(tagged.email, record.email);
}

// --- Layouts and rules ---

#[test]
fn test_detect_layout() {
    assert_eq!(detect_layout(KEYWORD), Some(LayoutVariant::KeywordAnchored));
    assert_eq!(detect_layout(KEYWORD_WEEK), Some(LayoutVariant::KeywordAnchored));
    assert_eq!(detect_layout(FORM), Some(LayoutVariant::BookingForm));
    assert_eq!(detect_layout("Beste verhuurder,\nIs het huis vrij?"), None);
}

#[test]
fn test_rule_set_runs_independently_of_detection() {
    let rules = rule_set(LayoutVariant::BookingForm).unwrap();
    assert_eq!(rules.variant(), LayoutVariant::BookingForm);
    assert!(rules.rules().iter().any(|rule| rule.label() == "Boekingsnummer"));

    let raw = rules.extract(FORM);
    assert_eq!(raw.layout(), LayoutVariant::BookingForm);
    assert_eq!(raw.get(FieldName::BookingReference), Some("BA-2024-0193"));
    assert_eq!(raw.get(FieldName::Arrival), Some("20-12-2024"));
    assert_eq!(raw.get(FieldName::TotalPrice), Some("1.105,50"));
}

#[test]
fn test_raw_fields_keep_body_text() {
    let raw = extract_fields(KEYWORD).unwrap();

    assert_eq!(raw.get(FieldName::Country), Some("NL"));
    assert_eq!(raw.get(FieldName::Departure), Some("18-11-2024"));
    assert_eq!(raw.get(FieldName::BookingReference), None);
    assert!(raw.iter().all(|(_, value)| !value.trim().is_empty()));
}

#[test]
fn test_street_after_blank_line_below_booker() {
    let body = "DIT IS EEN RESERVERING\n\
                Boeker:                            Mw. Els Jansen\n\
                \n\
                \x20                                  Rembrandtstraat 15\n\
                \x20                                  7204 BW Zutphen\n";
    let record = extract_booking(body).unwrap();

    assert_eq!(record.street_address, text("Rembrandtstraat 15"));
    assert_eq!(record.postal_code, text("7204 BW"));
}

#[test]
fn test_street_with_spaced_house_number_suffix() {
    let body = "DIT IS EEN RESERVERING\n\
                Boeker: Mw. Els Jansen\n\
                \x20   Rembrandtstraat 15 A\n\
                \x20   7204 BW Zutphen\n";
    let record = extract_booking(body).unwrap();

    assert_eq!(record.street_address, text("Rembrandtstraat 15 A"));
    assert_eq!(record.city, text("Zutphen"));
}

#[test]
fn test_street_not_taken_from_postal_line() {
    let body = "DIT IS EEN RESERVERING\nBoeker: Mw. Els Jansen\n\n7204 BW Zutphen\n";
    let record = extract_booking(body).unwrap();

    assert_eq!(record.street_address, Field::NotFound);
    assert_eq!(record.postal_code, text("7204 BW"));
}

#[test]
fn test_huge_guest_count_does_not_overflow_total() {
    let body = "DIT IS EEN RESERVERING\n\
                Personen (12 en ouder): 4294967295\n\
                Kinderen (4-12 jaar): 1\n";
    let record = extract_booking(body).unwrap();

    assert_eq!(record.guests.adults, u32::MAX);
    assert_eq!(record.guests.total(), u32::MAX);
}
