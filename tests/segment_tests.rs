//! Integration tests for reply segmentation and sender attribution.

use replysplit::parser::segment::Attribution;
use replysplit::parser::{extract_replies, segment, Diagnostic};

/// Bodies exercising every marker kind, dropped segments and inheritance.
const BODIES: &[&str] = &[
    "Hello,\nThanks.\n\nFrom: Jane Doe <jane@example.com>\nSent: Monday\n\nSee attached.",
    "Hi\n\nOn Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:\n> original text\n> more",
    "-----Original Message-----\nFrom someone",
    "Please call me\nabout the permit\n-----Original Message-----\nWe got your note\nand will follow up",
    "a\nb\nFrom: x@y.com\n-----Original Message-----\nc\nd\nOn Fri, 3/1/24, Ann <ann@z.org> wrote:\ne\nf",
    "Line one\r\nLine two\r\nFROM: Office <office@council.gov>\r\nNoted\r\n",
    "Only one line",
    "",
    "   \n\n  ",
];

// ─── Test 1: Body with no markers ───────────────────────────────────

#[test]
fn test_no_marker_body_is_one_chunk() {
    let chunks = extract_replies("\n  Water leak\nin the basement \n\n", "r@nyc.gov");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].sender, "r@nyc.gov");
    assert_eq!(chunks[0].text, "Water leak\nin the basement");
    assert_eq!(chunks[0].order, 0);

    assert!(extract_replies("Water leak", "r@nyc.gov").is_empty());
}

// ─── Test 2: First chunk always belongs to the fallback sender ──────

#[test]
fn test_first_chunk_sender_is_fallback() {
    for body in BODIES {
        let seg = segment(body, "fallback@nyc.gov");
        if let Some(first) = seg.chunks.first() {
            assert_eq!(first.chunk.sender, "fallback@nyc.gov", "body: {body:?}");
            assert_eq!(first.attribution, Attribution::Fallback);
        }
    }
}

// ─── Test 3: Later senders are never empty ──────────────────────────

#[test]
fn test_later_senders_not_empty() {
    for body in BODIES {
        for chunk in extract_replies(body, "fallback@nyc.gov").iter().skip(1) {
            assert!(!chunk.sender.trim().is_empty(), "body: {body:?}");
        }
    }
}

// ─── Test 4: Re-segmenting the joined chunks keeps the boundaries ───

#[test]
fn test_resegmenting_keeps_boundaries() {
    for body in BODIES {
        let first = extract_replies(body, "fallback@nyc.gov");
        let joined = first
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let second = extract_replies(&joined, "fallback@nyc.gov");
        assert_eq!(first, second, "body: {body:?}");
    }
}

// ─── Test 5: Order is strictly increasing ───────────────────────────

#[test]
fn test_order_strictly_increasing() {
    for body in BODIES {
        let chunks = extract_replies(body, "fallback@nyc.gov");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i, "body: {body:?}");
        }
    }
}

// ─── Test 6: Explicit From: header ──────────────────────────────────

#[test]
fn test_from_header_scenario() {
    let chunks = extract_replies(BODIES[0], "recipient@nyc.gov");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].sender, "recipient@nyc.gov");
    assert_eq!(chunks[0].text, "Hello,\nThanks.");
    assert_eq!(chunks[1].sender, "Jane Doe <jane@example.com>");
    assert_eq!(
        chunks[1].text,
        "From: Jane Doe <jane@example.com>\nSent: Monday\n\nSee attached."
    );
}

// ─── Test 7: Inline quote introduction ──────────────────────────────

#[test]
fn test_quote_intro_scenario() {
    let body = "Hi there\nsee below\n\nOn Mon, Jan 1, 2024 at 9:00 AM John Smith <john@x.com> wrote:\n> original text\n> more";
    let chunks = extract_replies(body, "r@nyc.gov");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].sender, "r@nyc.gov");
    assert_eq!(chunks[1].sender, "John Smith <john@x.com>");

    // A one-line greeting is too short to keep, so the quote comes first.
    let chunks = extract_replies(BODIES[1], "r@nyc.gov");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].sender, "r@nyc.gov");
}

// ─── Test 8: Separator with a single line of content ────────────────

#[test]
fn test_short_separator_segment_dropped() {
    let seg = segment(BODIES[2], "r@nyc.gov");
    assert!(seg.chunks.is_empty());
    assert_eq!(
        seg.diagnostics,
        vec![Diagnostic::DroppedSegment {
            line: 1,
            content_lines: 1
        }]
    );
}

// ─── Test 9: Unattributed chunk inherits the previous sender ────────

#[test]
fn test_inherits_previous_sender() {
    let body = "Any news?\nThanks\nFrom: Jane Doe <jane@example.com>\nWe are looking\ninto it\n-----Original Message-----\nForwarding this\nfor context";
    let seg = segment(body, "r@nyc.gov");
    assert_eq!(seg.chunks.len(), 3);
    assert_eq!(seg.chunks[2].chunk.sender, "Jane Doe <jane@example.com>");
    assert_eq!(seg.chunks[2].attribution, Attribution::Inherited);
    assert!(seg.diagnostics.contains(&Diagnostic::InheritedSender {
        order: 2,
        sender: "Jane Doe <jane@example.com>".to_string(),
    }));
}

// ─── Test 10: Mixed markers and dropped fragments ───────────────────

#[test]
fn test_mixed_markers() {
    let seg = segment(BODIES[4], "me@nyc.gov");
    let senders: Vec<&str> = seg.chunks.iter().map(|c| c.chunk.sender.as_str()).collect();
    assert_eq!(senders, vec!["me@nyc.gov", "me@nyc.gov", "Ann <ann@z.org>"]);
    assert!(seg
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DroppedSegment { line: 3, .. })));
}
