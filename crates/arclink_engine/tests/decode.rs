use arclink_engine::decode_page;
use pretty_assertions::assert_eq;

#[test]
fn bom_wins_over_header() {
    let bytes = b"\xEF\xBB\xBFcaf\xC3\xA9";
    assert_eq!(decode_page(bytes, Some("text/html; charset=iso-8859-1")), "café");
}

#[test]
fn header_charset_is_used() {
    assert_eq!(decode_page(b"caf\xE9", Some("text/html; charset=\"ISO-8859-1\"")), "café");
}

#[test]
fn plain_ascii_without_hints() {
    assert_eq!(decode_page(b"<a href=\"/x\">x</a>", None), "<a href=\"/x\">x</a>");
}
