//! End-to-end extraction tests: content-op streams in, reading-ordered text
//! and position records out.

mod common;

use std::sync::Arc;

use lectern_core::{
    extract_page, BuiltinFont, ContentOp, ExtractError, ExtractParams, FontCache, Form, Operand,
    PageOutcome,
};

use common::{int, name, op, real, string, text_object, TestFont, TestResources, MEDIA};

fn courier_resources() -> Arc<TestResources> {
    Arc::new(TestResources::new().with_font("F1", BuiltinFont::courier()))
}

fn extract(ops: &[ContentOp]) -> PageOutcome {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = ExtractParams::default();
    extract_page(ops, courier_resources(), MEDIA, &params, None)
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn single_line_of_courier() {
    let ops = text_object("F1", 24.0, 0.0, 100.0, b"Hello");
    let out = extract(&ops);
    let page = &out.page;

    assert_eq!(page.text(), "Hello\n\n");
    assert_eq!(out.num_chars, 5);
    assert_eq!(out.num_misses, 0);
    assert!(out.error.is_none());

    let glyphs: Vec<_> = page.marks().iter().filter(|m| !m.meta).collect();
    assert_eq!(glyphs.len(), 5);
    for (i, mark) in glyphs.iter().enumerate() {
        assert_eq!(mark.offset, i);
        assert!((mark.bbox.1 - 100.0).abs() < 0.5);
        let expected_x = 14.4 * i as f64;
        assert!((mark.bbox.0 - expected_x).abs() < 0.5);
    }
    // Monotonically increasing along the reading axis.
    assert!(glyphs.windows(2).all(|w| w[0].bbox.0 < w[1].bbox.0));
}

#[test]
fn two_lines_separated_by_leading() {
    let ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(12.0)]),
        op("Td", vec![real(10.0), real(200.0)]),
        op("Tj", vec![string(b"Line one")]),
        op("Td", vec![real(0.0), real(-14.0)]),
        op("Tj", vec![string(b"Line two")]),
        op("ET", vec![]),
    ];
    let out = extract(&ops);
    assert_eq!(out.page.text(), "Line one\nLine two\n\n");
}

#[test]
fn trailing_superscript_follows_its_word() {
    // "Paragraph" in 12pt with a small "2" raised just after it. The seed
    // search must start the line from "Paragraph", not the superscript,
    // and the superscript joins the line in reading order.
    let mut ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(8.0)]),
        op("Td", vec![real(116.0), real(304.0)]),
        op("Tj", vec![string(b"2")]),
        op("ET", vec![]),
    ];
    ops.extend(text_object("F1", 12.0, 50.0, 300.0, b"Paragraph"));
    let out = extract(&ops);
    assert_eq!(out.page.text(), "Paragraph 2\n\n");
}

#[test]
fn diacritic_combines_with_base_character() {
    let ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(12.0)]),
        op("Td", vec![real(10.0), real(100.0)]),
        op("Tj", vec![string(b"e")]),
        op("Td", vec![real(2.0), real(4.0)]),
        op("Tj", vec![string(&[0xB4])]), // acute accent
        op("ET", vec![]),
    ];
    let out = extract(&ops);
    let page = &out.page;

    assert_eq!(page.text(), "\u{00E9}\n\n");
    let glyphs: Vec<_> = page.marks().iter().filter(|m| !m.meta).collect();
    assert_eq!(glyphs.len(), 1);
    assert_eq!(glyphs[0].text, "\u{00E9}");
    // The record's box covers both the base and the accent.
    let bbox = glyphs[0].bbox;
    assert!((bbox.0 - 10.0).abs() < 0.5);
    assert!((bbox.1 - 100.0).abs() < 0.5);
    assert!((bbox.2 - 19.2).abs() < 0.5);
    assert!((bbox.3 - 116.0).abs() < 0.5);
    // The byte offset after the record steps by the UTF-8 length.
    let next = page
        .marks()
        .iter()
        .find(|m| m.offset > 0)
        .expect("terminator record");
    assert_eq!(next.offset, "\u{00E9}".len());
}

#[test]
fn four_cells_become_a_two_by_two_table() {
    let params = ExtractParams {
        min_table_paras: 4,
        ..ExtractParams::default()
    };
    let mut ops = Vec::new();
    ops.extend(text_object("F1", 8.0, 0.0, 205.0, b"c00"));
    ops.extend(text_object("F1", 8.0, 50.0, 205.0, b"c10"));
    ops.extend(text_object("F1", 8.0, 0.0, 185.0, b"c01"));
    ops.extend(text_object("F1", 8.0, 50.0, 185.0, b"c11"));

    let out = extract_page(&ops, courier_resources(), MEDIA, &params, None);
    let page = &out.page;

    assert_eq!(page.text(), "c00 c10\nc01 c11\n\n");
    assert_eq!(page.tables().len(), 1);
    let table = &page.tables()[0];
    assert_eq!((table.w, table.h), (2, 2));
    assert_eq!(table.cell(0, 0).unwrap().text, "c00");
    assert_eq!(table.cell(1, 0).unwrap().text, "c10");
    assert_eq!(table.cell(0, 1).unwrap().text, "c01");
    assert_eq!(table.cell(1, 1).unwrap().text, "c11");

    // Each cell's record range renders its text.
    let records = page.marks().as_slice();
    for cell in &table.cells {
        let joined: String = records[cell.marks.clone()]
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(joined, cell.text);
    }
}

#[test]
fn two_columns_read_before_the_footer() {
    let mut ops = Vec::new();
    ops.extend(text_object("F1", 12.0, 50.0, 688.0, b"leftone"));
    ops.extend(text_object("F1", 12.0, 50.0, 674.0, b"lefttwo"));
    ops.extend(text_object("F1", 12.0, 300.0, 688.0, b"rightone"));
    ops.extend(text_object("F1", 12.0, 300.0, 674.0, b"righttwo"));
    // One wide run spanning both columns' x-extent.
    ops.extend(text_object("F1", 12.0, 50.0, 112.0, &[b'f'; 62]));

    let out = extract(&ops);
    let text = out.page.text();

    let left = text.find("leftone").expect("left column present");
    let right = text.find("rightone").expect("right column present");
    let footer = text.find("ffff").expect("footer present");
    assert!(left < right);
    assert!(right < footer);
    // The columns keep their internal line order.
    assert!(text.find("lefttwo").unwrap() < right);
}

// ============================================================================
// Boundary behaviors
// ============================================================================

#[test]
fn empty_content_stream() {
    let out = extract(&[]);
    assert_eq!(out.page.text(), "");
    assert!(out.page.marks().is_empty());
    assert!(out.error.is_none());
}

#[test]
fn whitespace_only_strings_yield_empty_text() {
    let ops = text_object("F1", 12.0, 10.0, 100.0, b"   ");
    let out = extract(&ops);
    assert_eq!(out.page.text(), "");
    assert!(out.page.marks().is_empty());
    assert_eq!(out.num_chars, 3);
}

#[test]
fn zero_advance_glyph_keeps_a_degenerate_record() {
    let resources =
        Arc::new(TestResources::new().with_font("F1", TestFont::new("Zero", 0.0)));
    let params = ExtractParams::default();
    let ops = text_object("F1", 12.0, 30.0, 100.0, b"a");
    let out = extract_page(&ops, resources, MEDIA, &params, None);

    let glyphs: Vec<_> = out.page.marks().iter().filter(|m| !m.meta).collect();
    assert_eq!(glyphs.len(), 1);
    assert_eq!(glyphs[0].bbox.0, glyphs[0].bbox.2);
    assert_eq!(out.page.text(), "a\n\n");
}

#[test]
fn range_offset_of_empty_range_is_ok() {
    let ops = text_object("F1", 12.0, 10.0, 100.0, b"abc");
    let out = extract(&ops);
    assert!(out.page.marks().range_offset(0, 0).unwrap().is_empty());
    assert!(matches!(
        out.page.marks().range_offset(2, 1),
        Err(ExtractError::OutOfRange { .. })
    ));
}

#[test]
fn self_referential_form_overflows() {
    let form = Form {
        ops: vec![op("Do", vec![name("Fm0")])],
        resources: None,
    };
    let resources = Arc::new(
        TestResources::new()
            .with_font("F1", BuiltinFont::courier())
            .with_form("Fm0", form),
    );
    let params = ExtractParams::default();
    let ops = vec![op("Do", vec![name("Fm0")])];
    let out = extract_page(&ops, resources, MEDIA, &params, None);
    assert_eq!(out.error, Some(ExtractError::FormOverflow));
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn records_concatenate_to_the_view_text() {
    let mut ops = Vec::new();
    ops.extend(text_object("F1", 12.0, 10.0, 700.0, b"alpha beta"));
    ops.extend(text_object("F1", 12.0, 10.0, 686.0, b"gamma"));
    ops.extend(text_object("F1", 12.0, 10.0, 100.0, b"footer"));
    let out = extract(&ops);
    let page = &out.page;

    let concatenated: String = page.marks().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(concatenated, page.text());

    // Every record's text occurs at its offset.
    for mark in page.marks().iter() {
        assert_eq!(
            &page.text()[mark.offset..mark.offset + mark.text.len()],
            mark.text
        );
    }

    // Offsets are sorted and non-overlapping.
    let marks = page.marks().as_slice();
    for pair in marks.windows(2) {
        assert!(pair[0].offset + pair[0].text.len() <= pair[1].offset);
    }

    // Non-meta records intersect the media box.
    for mark in marks.iter().filter(|m| !m.meta) {
        assert!(mark.bbox.0 <= MEDIA.2 && mark.bbox.2 >= MEDIA.0);
        assert!(mark.bbox.1 <= MEDIA.3 && mark.bbox.3 >= MEDIA.1);
    }

    // A range's bounding box sits inside the page's.
    let page_box = page.marks().bbox().expect("page has glyphs");
    let range = page.marks().range_offset(0, 5).unwrap();
    let range_box = lectern_core::TextMarkArray::bbox_of(range).expect("range has glyphs");
    assert!(range_box.0 >= page_box.0 && range_box.2 <= page_box.2);
    assert!(range_box.1 >= page_box.1 && range_box.3 <= page_box.3);
}

#[test]
fn ligature_expands_to_multiple_runes_in_one_record() {
    let font = TestFont::new("Liga", 600.0).with_mapping(0x01, "fi", 1200.0);
    let resources = Arc::new(TestResources::new().with_font("F1", font));
    let params = ExtractParams::default();
    let ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(10.0)]),
        op("Td", vec![real(10.0), real(100.0)]),
        op("Tj", vec![string(&[0x01, b'n'])]),
        op("ET", vec![]),
    ];
    let out = extract_page(&ops, resources, MEDIA, &params, None);
    let page = &out.page;

    assert_eq!(page.text(), "fin\n\n");
    let glyphs: Vec<_> = page.marks().iter().filter(|m| !m.meta).collect();
    assert_eq!(glyphs.len(), 2);
    assert_eq!(glyphs[0].text, "fi");
    assert_eq!(glyphs[0].offset, 0);
    // The following record starts after the ligature's two bytes.
    assert_eq!(glyphs[1].offset, 2);
}

#[test]
fn unmapped_charcodes_are_counted_as_misses() {
    let resources =
        Arc::new(TestResources::new().with_font("F1", TestFont::new("Partial", 600.0)));
    let params = ExtractParams::default();
    let ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(12.0)]),
        op("Td", vec![real(10.0), real(100.0)]),
        op("Tj", vec![string(&[b'a', 0x01])]),
        op("ET", vec![]),
    ];
    let out = extract_page(&ops, resources, MEDIA, &params, None);
    assert_eq!(out.num_chars, 2);
    assert_eq!(out.num_misses, 1);
    assert!(out.page.text().contains('\u{FFFD}'));
}

#[test]
fn form_xobjects_render_into_the_page() {
    let form = Form {
        ops: text_object("F1", 12.0, 10.0, 100.0, b"inner"),
        resources: None,
    };
    let resources = Arc::new(
        TestResources::new()
            .with_font("F1", BuiltinFont::courier())
            .with_form("Fm0", form),
    );
    let params = ExtractParams::default();
    let ops = vec![op("Do", vec![name("Fm0")])];
    let out = extract_page(&ops, resources, MEDIA, &params, None);
    assert_eq!(out.page.text(), "inner\n\n");
    assert!(out.error.is_none());
    // Glyph statistics accumulate across the nested stream.
    assert_eq!(out.num_chars, 5);
}

#[test]
fn rotated_text_flows_through_its_own_orientation_bucket() {
    // Quarter-turned text: marks land in the 90-degree bucket and still
    // reach the output alongside the upright text.
    let mut ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(12.0)]),
        op(
            "Tm",
            vec![
                int(0),
                int(1),
                int(-1),
                int(0),
                real(500.0),
                real(300.0),
            ],
        ),
        op("Tj", vec![string(b"up")]),
        op("ET", vec![]),
    ];
    ops.extend(text_object("F1", 12.0, 50.0, 700.0, b"flat"));
    let out = extract(&ops);
    let text = out.page.text();
    assert!(text.contains("flat"));
    assert!(text.contains('u') && text.contains('p'));
    let rotated: Vec<_> = out
        .page
        .raw_marks()
        .iter()
        .filter(|m| m.orientation() == 90)
        .collect();
    assert_eq!(rotated.len(), 2);
}

#[test]
fn font_cache_is_populated_during_extraction() {
    let mut cache = FontCache::new();
    let ops = text_object("F1", 12.0, 10.0, 100.0, b"cached");
    let params = ExtractParams::default();
    let out = extract_page(&ops, courier_resources(), MEDIA, &params, Some(&mut cache));
    assert_eq!(out.page.text(), "cached\n\n");
    assert_eq!(cache.len(), 1);
    assert!(cache.get("F1").is_some());
}

#[test]
fn tj_array_positions_split_words() {
    // A TJ adjustment wide enough to read as a word gap.
    let ops = vec![
        op("BT", vec![]),
        op("Tf", vec![name("F1"), real(10.0)]),
        op("Td", vec![real(10.0), real(100.0)]),
        op(
            "TJ",
            vec![Operand::Array(vec![
                string(b"ab"),
                int(-700), // 7pt gap
                string(b"cd"),
            ])],
        ),
        op("ET", vec![]),
    ];
    let out = extract(&ops);
    assert_eq!(out.page.text(), "ab cd\n\n");
}
