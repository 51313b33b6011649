// Unit tests for the date range filter input

use super::*;

#[test]
fn test_date_range_parse() {
    let range = DateRange::parse("2024-12-10 10:00", "2024-12-15 16:15").unwrap();
    assert_eq!(range.from_input(), "2024-12-10 10:00");
    assert_eq!(range.to_input(), "2024-12-15 16:15");
    assert_eq!(range.to_string(), "2024-12-10 10:00 to 2024-12-15 16:15");

    // Surrounding whitespace is tolerated
    let range = DateRange::parse(" 2024-01-01 00:00 ", "2024-01-01 00:00").unwrap();
    assert_eq!(range.from, range.to);
}

#[test]
fn test_date_range_rejects_bad_input() {
    assert!(DateRange::parse("2024-12-10", "2024-12-15 16:15").is_err());
    assert!(DateRange::parse("10/12/2024 10:00", "2024-12-15 16:15").is_err());
    assert!(DateRange::parse("2024-13-01 10:00", "2024-12-15 16:15").is_err());

    let err = DateRange::parse("2024-12-15 16:15", "2024-12-10 10:00").unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("starts after it ends"));
}
