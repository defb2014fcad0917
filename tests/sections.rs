//! Section model behavior over a document's paragraph sequence.

use docxcraft::{Document, Orientation, PageNumberFormat, Paragraph, Section};

/// Document with paragraphs P1..P6 and no section breaks.
fn six_paragraphs() -> (Document, Vec<Paragraph>) {
    let mut doc = Document::new();
    let paragraphs = (1..=6)
        .map(|i| doc.append_paragraph_with_text(&format!("P{}", i)))
        .collect();
    (doc, paragraphs)
}

fn walk(doc: &Document) -> Vec<Section> {
    let mut out = Vec::new();
    let mut section = doc.first_section();
    while section.is_valid(doc) {
        out.push(section);
        section = section.next(doc);
    }
    out
}

#[test]
fn test_split_into_three_sections() {
    let (mut doc, p) = six_paragraphs();
    let whole = doc.first_section();
    whole.split(&mut doc, p[1]);
    doc.section_of(p[2]).split(&mut doc, p[3]);

    let first = doc.first_section();
    assert_eq!(first.last_paragraph(&doc), p[1]);
    let second = first.next(&doc);
    assert_eq!(second.last_paragraph(&doc), p[3]);
    let third = second.next(&doc);
    assert_eq!(third.last_paragraph(&doc), p[5]);
    assert_eq!(third, doc.last_section());
    assert!(!third.next(&doc).is_valid(&doc));
}

#[test]
fn test_sections_partition_paragraphs() {
    let (mut doc, p) = six_paragraphs();
    p[0].insert_section_break(&mut doc);
    p[3].insert_section_break(&mut doc);

    let visited: Vec<Paragraph> = walk(&doc)
        .iter()
        .flat_map(|s| s.paragraphs(&doc))
        .collect();
    assert_eq!(visited, doc.paragraphs());

    for para in &p {
        let containing = walk(&doc)
            .iter()
            .filter(|s| s.paragraphs(&doc).contains(para))
            .count();
        assert_eq!(containing, 1);
    }
}

#[test]
fn test_prev_walks_back_to_first() {
    let (mut doc, p) = six_paragraphs();
    p[1].insert_section_break(&mut doc);
    p[3].insert_section_break(&mut doc);

    let last = doc.last_section();
    let middle = last.prev(&doc);
    assert_eq!(middle.first_paragraph(&doc), p[2]);
    let first = middle.prev(&doc);
    assert_eq!(first, doc.first_section());
    assert!(!first.prev(&doc).is_valid(&doc));
}

#[test]
fn test_split_then_merge_restores_layout() {
    let (mut doc, p) = six_paragraphs();
    let section = doc.first_section();
    section.set_margins(&mut doc, 720, 720, 1080, 1080);
    let before = section.properties(&doc);

    let earlier = section.split(&mut doc, p[2]);
    assert_eq!(doc.sections().len(), 2);
    assert_eq!(earlier.properties(&doc), before);

    let fused = earlier.merge(&mut doc);
    assert_eq!(doc.sections().len(), 1);
    assert_eq!(fused.paragraphs(&doc), p);
    assert_eq!(fused.properties(&doc), before);
}

#[test]
fn test_split_outside_section_is_rejected() {
    let (mut doc, p) = six_paragraphs();
    p[2].insert_section_break(&mut doc);
    let first = doc.first_section();

    let result = first.split(&mut doc, p[4]);
    assert!(!result.is_valid(&doc));
    assert_eq!(doc.sections().len(), 2);
}

#[test]
fn test_sections_keep_independent_layout() {
    let (mut doc, p) = six_paragraphs();
    let first = p[2].insert_section_break(&mut doc);
    let last = doc.last_section();
    last.set_orientation(&mut doc, Orientation::Landscape);
    last.set_page_number(&mut doc, PageNumberFormat::LowerRoman, Some(3));

    let first = doc.section_of(first.first_paragraph(&doc));
    assert_eq!(first.orientation(&doc), Some(Orientation::Portrait));
    assert_eq!(last.orientation(&doc), Some(Orientation::Landscape));
    assert_eq!(
        last.page_number(&doc),
        Some((PageNumberFormat::LowerRoman, Some(3)))
    );
    assert_eq!(first.page_number(&doc), None);
}

#[test]
fn test_paragraph_edits_invalidate_sections() {
    let (mut doc, p) = six_paragraphs();
    p[2].insert_section_break(&mut doc);
    let first = doc.first_section();
    assert!(first.is_valid(&doc));

    assert!(doc.remove_paragraph(p[2]));
    assert!(!first.is_valid(&doc));
    assert!(first.paragraphs(&doc).is_empty());
    assert_eq!(doc.sections().len(), 1);
}

#[test]
fn test_split_invalidates_spanning_view() {
    let (mut doc, p) = six_paragraphs();
    let whole = doc.first_section();
    let earlier = p[1].insert_section_break(&mut doc);

    assert!(earlier.is_valid(&doc));
    assert!(!whole.is_valid(&doc));
    assert!(whole.paragraphs(&doc).is_empty());
    assert!(!whole.next(&doc).is_valid(&doc));
    assert!(!whole.split(&mut doc, p[4]).is_valid(&doc));
    assert_eq!(doc.sections().len(), 2);
    assert_eq!(walk(&doc)[1].paragraphs(&doc), p[2..].to_vec());
}

#[test]
fn test_insert_before_start_invalidates_view() {
    let (mut doc, p) = six_paragraphs();
    let first = doc.first_section();
    let added = doc.insert_paragraph_before(p[0]);

    assert!(!first.is_valid(&doc));
    assert!(!first.first_paragraph(&doc).is_valid(&doc));
    let fresh = doc.first_section();
    assert_eq!(fresh.first_paragraph(&doc), added);
    assert_eq!(fresh.paragraphs(&doc).len(), 7);
}

#[test]
fn test_cell_paragraphs_have_no_section() {
    let mut doc = Document::new();
    doc.append_paragraph_with_text("before");
    let table = doc.append_table(2, 2);
    doc.append_paragraph_with_text("after");

    let inner = table.cell(&doc, 0, 0).first_paragraph(&doc);
    assert!(inner.is_valid(&doc));
    assert!(!inner.section(&doc).is_valid(&doc));
    assert_eq!(doc.sections().len(), 1);
    assert_eq!(doc.first_section().paragraphs(&doc).len(), 2);
}
