//! Text cleanup for notification titles and bodies.
//!
//! Chat payloads arrive with JSON-style unicode escapes, HTML entities the
//! notification daemon refuses to render, and anchors carrying arbitrary
//! attributes. [`sanitize`] turns them into something `notify-send` displays
//! verbatim.

use std::sync::OnceLock;

use regex::Regex;

/// Character used to delimit the body on the notifier command line.
pub const BODY_DELIMITER: char = '\'';

/// Character used to delimit the title on the notifier command line.
pub const TITLE_DELIMITER: char = '"';

/// Literal escape sequences and their display form.
const ESCAPES: [(&str, &str); 5] = [
    ("\\u003E", ">"),
    ("\\u003C", "<"),
    ("\\u0026", "&"),
    ("\\\"", "\""),
    ("&hellip;", "..."),
];

fn anchor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The href value is assumed to contain no whitespace.
    RE.get_or_init(|| Regex::new(r"<a[^>]+(href=[^(\s|>)]+)[^>]*>").expect("regex is valid"))
}

/// Produce a display-safe notification body from a raw chat message.
///
/// Steps, in order:
/// 1. drop every [`BODY_DELIMITER`];
/// 2. decode the escapes in `ESCAPES` until none remain;
/// 3. reduce each `<a ...>` tag to `<a href=...>`.
///
/// Never fails and is idempotent: `sanitize(&sanitize(s)) == sanitize(s)`.
pub fn sanitize(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| *c != BODY_DELIMITER).collect();
    let decoded = decode_escapes(stripped);
    anchor_regex().replace_all(&decoded, "<a $1>").into_owned()
}

/// Remove [`TITLE_DELIMITER`] from an author or room name.
pub fn strip_title_quotes(text: &str) -> String {
    text.chars().filter(|c| *c != TITLE_DELIMITER).collect()
}

/// Replace escape sequences until a fixed point is reached.
///
/// A single pass is not enough: `\u0026hellip;` decodes to `&hellip;`, and a
/// backslash in front of `\"` survives as a fresh `\"`. Every replacement
/// shortens the string, so the loop terminates.
fn decode_escapes(mut text: String) -> String {
    loop {
        let mut changed = false;
        for (from, to) in ESCAPES {
            if text.contains(from) {
                text = text.replace(from, to);
                changed = true;
            }
        }
        if !changed {
            return text;
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_fragment() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("\\u003E"),
            Just("\\u003C"),
            Just("\\u0026"),
            Just("\\\""),
            Just("\\"),
            Just("u003E"),
            Just("&hellip;"),
            Just("&"),
            Just("'"),
            Just("\""),
            Just("<a "),
            Just("href="),
            Just("class=x "),
            Just(">"),
            Just(" "),
            Just("text"),
        ]
    }

    /// Bodies built from escape and anchor fragments, which is where a
    /// single decoding pass would leave work for a second call.
    fn arb_body() -> impl Strategy<Value = String> {
        proptest::collection::vec(arb_fragment(), 0..24).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(body in arb_body()) {
            let once = sanitize(&body);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn sanitize_is_idempotent_on_any_text(body in ".{0,64}") {
            let once = sanitize(&body);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn sanitized_body_never_contains_delimiter(body in arb_body()) {
            prop_assert!(!sanitize(&body).contains(BODY_DELIMITER));
        }
    }
}
