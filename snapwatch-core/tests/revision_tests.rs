//! Marker-stripping revision parser: accepted and rejected shapes.

use rstest::rstest;
use snapwatch_core::{parse_revision, CoreError, Revision};

#[rstest]
#[case("x42", 42)]
#[case("x1", 1)]
#[case("x0", 0)]
#[case("x007", 7)]
#[case("#1234567", 1_234_567)]
#[case("x18446744073709551615", u64::MAX)]
fn marker_followed_by_digits_parses(#[case] raw: &str, #[case] expected: u64) {
    assert_eq!(parse_revision(raw).expect("parse"), Revision(expected));
}

#[rstest]
#[case("")]
#[case("x")]
#[case("xabc")]
#[case("x4 2")]
#[case("x+5")]
#[case("x-5")]
#[case("x42 ")]
#[case("xx42")]
fn malformed_digit_sections_are_rejected(#[case] raw: &str) {
    let err = parse_revision(raw).unwrap_err();
    assert!(matches!(err, CoreError::MalformedRevision { .. }), "got: {err}");
    assert!(
        err.to_string().contains("malformed revision"),
        "message should name the failure, got: {err}"
    );
}

#[test]
fn parsed_revisions_order_numerically_not_lexically() {
    let nine = parse_revision("x9").expect("parse");
    let ten = parse_revision("x10").expect("parse");
    assert!(nine < ten);
    assert_eq!(nine.next(), ten);
}
