// tests/extract_properties.rs
//
// Synthetic property checks for the markup reducer. Inputs are generated from
// small building blocks (titles, noise blocks, filler) and combined exhaustively.

use auto_news_ingest::ingest::extract::{
    extract, extract_title, reduce_html, MAX_TEXT_CHARS, MIN_CONTENT_CHARS, UNTITLED,
};

const TITLES: &[&str] = &[
    "BYD unveils Seal 06",
    "  Tesla Q3 deliveries beat estimates  ",
    "小米 SU7 交付量创新高",
    "Li Auto &amp; NIO: price war",
];

const NOISE: &[(&str, &str)] = &[
    ("<script>var SECRETSCRIPT = 1;</script>", "SECRETSCRIPT"),
    (
        "<SCRIPT type=\"text/javascript\">\nwindow.TRACKERTOKEN='x'\n</SCRIPT>",
        "TRACKERTOKEN",
    ),
    ("<style>.HIDDENSTYLE { color: red }</style>", "HIDDENSTYLE"),
    ("<style media=\"print\">\nbody{STYLETOKEN:1}\n</Style>", "STYLETOKEN"),
];

const BODIES: &[&str] = &[
    "<p>The automaker said deliveries rose sharply in the third quarter.</p>",
    "<div><span>short</span></div>",
    "plain text without any tags at all, long enough to be considered content",
    "<p>unterminated <b>bold <i>markup",
];

fn page(title: Option<&str>, noise: &str, body: &str) -> String {
    let head = title
        .map(|t| format!("<head><title>{t}</title></head>"))
        .unwrap_or_default();
    format!("<html>{head}<body>{noise}{body}{noise}</body></html>")
}

#[test]
fn title_is_returned_trimmed_when_present() {
    for t in TITLES {
        for (noise, _) in NOISE {
            for body in BODIES {
                let out = reduce_html(&page(Some(t), noise, body));
                assert_eq!(out.title, t.trim(), "page with title {t:?}");
            }
        }
    }
}

#[test]
fn placeholder_when_title_missing() {
    for (noise, _) in NOISE {
        for body in BODIES {
            assert_eq!(reduce_html(&page(None, noise, body)).title, UNTITLED);
        }
    }
    assert_eq!(extract_title(""), UNTITLED);
    assert_eq!(extract_title("<title>unterminated"), UNTITLED);
}

#[test]
fn script_and_style_tokens_never_leak() {
    for t in TITLES {
        for (noise, token) in NOISE {
            for body in BODIES {
                let out = reduce_html(&page(Some(t), noise, body));
                assert!(
                    !out.text.contains(token),
                    "token {token} leaked into {:?}",
                    out.text
                );
            }
        }
    }
}

#[test]
fn text_never_exceeds_limit() {
    let sizes = [0usize, 10, 4_999, 5_000, 5_001, 20_000];
    for n in sizes {
        let ascii = format!("<p>{}</p>", "a".repeat(n));
        let wide = format!("<p>{}</p>", "电".repeat(n));
        let tagged = "<b>x</b> ".repeat(n);
        for input in [ascii, wide, tagged] {
            let out = reduce_html(&input);
            assert!(out.text.chars().count() <= MAX_TEXT_CHARS, "n={n}");
        }
    }
}

#[test]
fn malformed_markup_degrades_without_panicking() {
    let inputs = [
        "<",
        ">",
        "<<<>>>",
        "<script>",
        "</script><script",
        "<!-- never closed",
        "<title></title></title><title>",
        "<svg><svg></svg>",
        "\u{0}\u{1}<p>\u{feff}</p>",
    ];
    for i in inputs {
        let out = reduce_html(i);
        assert!(out.text.chars().count() <= MAX_TEXT_CHARS);
    }
}

#[test]
fn extract_enforces_minimum_content() {
    let short = page(Some("t"), "", "<p>too short</p>");
    assert!(extract(&short).is_err());

    let long = page(Some("t"), "", &format!("<p>{}</p>", "word ".repeat(20)));
    let out = extract(&long).expect("long page passes");
    assert!(out.text.chars().count() >= MIN_CONTENT_CHARS);
}

#[test]
fn paragraph_breaks_survive_as_single_blank_lines() {
    let separators = ["", "\n", "\n\n\n\n", "\n \t \n\n", "<br>\n<br>"];
    for sep in separators {
        for (noise, _) in NOISE {
            let html = format!(
                "<p>First paragraph about deliveries.</p>{sep}{noise}<p>Second paragraph about prices.</p>"
            );
            let text = reduce_html(&html).text;
            assert_eq!(
                text, "First paragraph about deliveries.\n\nSecond paragraph about prices.",
                "separator {sep:?} with noise {noise:?}"
            );
        }
    }
}
