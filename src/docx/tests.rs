use super::props::{PPR_ORDER, RPR_ORDER};
use super::*;

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml"><w:body><w:p w14:paraId="1A2B3C4D"><w:pPr><w:pStyle w:val="Caption"/><w:jc w:val="right"/><w:rPr><w:b/></w:rPr></w:pPr><w:bookmarkStart w:id="0" w:name="t5"/><w:r><w:rPr><w:b/><w:sz w:val="24"/></w:rPr><w:t>Таблица 5</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p><w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid><w:gridCol w:w="2000"/><w:gridCol w:w="2000"/><w:gridCol w:w="2000"/></w:tblGrid><w:tr><w:trPr><w:tblHeader/></w:trPr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>Room&amp;number</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t xml:space="preserve">Area </w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:rPr><w:i/></w:rPr><w:t>#</w:t></w:r><w:r><w:t>tail</w:t></w:r></w:p><w:p><w:r><w:t>second</w:t></w:r></w:p></w:tc><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:br w:type="page"/></w:r></w:p><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#;

fn sample() -> Document {
    parse_document_xml(SAMPLE).expect("sample parses")
}

#[test]
fn parse_builds_blocks_and_keeps_unknown_xml() {
    let doc = sample();
    assert_eq!(doc.body.len(), 4);
    assert!(matches!(doc.body[0], Block::Paragraph(_)));
    assert!(matches!(doc.body[1], Block::Table(_)));
    assert!(matches!(&doc.body[3], Block::Raw(raw) if raw.name == "w:sectPr"));

    let caption = doc.body[0].as_paragraph().expect("caption");
    assert_eq!(caption.text(), "Таблица 5");
    assert_eq!(caption.style(), Some("Caption"));
    assert!(caption.content.iter().any(|inline| matches!(inline, Inline::Raw(raw) if raw.name == "w:bookmarkStart")));
    assert!(caption.attrs.iter().any(|(name, value)| name == "w14:paraId" && value == "1A2B3C4D"));
}

#[test]
fn cell_text_joins_paragraphs_and_reads_tabs() {
    let doc = sample();
    let table = doc.table(1).expect("table");
    assert_eq!(table.rows[0].cells[0].text(), "Room&number");
    assert_eq!(table.rows[0].cells[1].text(), "Area ");
    assert_eq!(table.rows[1].cells[0].text(), "#tail\nsecond");
    assert_eq!(table.rows[1].cells[1].text(), "A\tB");
}

#[test]
fn grid_access_follows_grid_span() {
    let doc = sample();
    let header = &doc.table(1).expect("table").rows[0];
    assert_eq!(header.cell_index_at_grid(0), Some(0));
    assert_eq!(header.cell_index_at_grid(1), Some(0));
    assert_eq!(header.cell_index_at_grid(2), Some(1));
    assert_eq!(header.cell_index_at_grid(3), None);
    assert_eq!(header.grid_texts().len(), 3);
    assert_eq!(header.grid_index_of(1), Some(2));
    assert!(header.is_header());
}

#[test]
fn vmerge_state_reads_and_writes() {
    let mut doc = sample();
    let table = doc.table_mut(1).expect("table");
    assert_eq!(table.rows[1].cells[0].vmerge(), VMerge::Start);
    assert_eq!(table.rows[1].cells[1].vmerge(), VMerge::Continue);
    assert_eq!(table.rows[1].cells[2].vmerge(), VMerge::None);

    table.rows[1].cells[2].set_vmerge(VMerge::Continue);
    assert_eq!(table.rows[1].cells[2].props.val("vMerge"), Some("continue"));
    table.rows[1].cells[0].set_vmerge(VMerge::None);
    assert_eq!(table.rows[1].cells[0].vmerge(), VMerge::None);
}

#[test]
fn set_text_preserving_style_keeps_first_run_formatting() {
    let mut doc = sample();
    let cell = &mut doc.table_mut(1).expect("table").rows[1].cells[0];
    cell.set_text("101", true);

    assert_eq!(cell.text(), "101");
    let paragraphs: Vec<&Paragraph> = cell.paragraphs().collect();
    assert_eq!(paragraphs.len(), 1);
    let runs: Vec<&Run> = paragraphs[0].runs().collect();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].props.has("i"));
    assert_eq!(cell.vmerge(), VMerge::Start);
}

#[test]
fn set_text_without_style_replaces_paragraph() {
    let mut cell = Cell::with_text("old");
    if let Some(Block::Paragraph(paragraph)) = cell.blocks.first_mut() {
        paragraph.set_alignment(Alignment::Center);
    }
    cell.set_text("new", false);
    let paragraph = cell.paragraphs().next().expect("paragraph");
    assert_eq!(paragraph.text(), "new");
    assert_eq!(paragraph.alignment(), None);
}

#[test]
fn set_lines_writes_one_paragraph_per_line() {
    let mut cell = Cell::with_text("template");
    cell.set_lines(&["•\tone", "•\ttwo"]);
    assert_eq!(cell.text(), "•\tone\n•\ttwo");
    assert_eq!(cell.paragraphs().count(), 2);

    cell.set_lines::<&str>(&[]);
    assert_eq!(cell.text(), "");
    assert_eq!(cell.paragraphs().count(), 1);
}

#[test]
fn row_operations_report_absent_positions() {
    let mut table = Table::from_rows(vec![Row::from_texts(&["a"]), Row::from_texts(&["b"])]);
    assert!(table.row(5).is_none());
    assert!(table.remove_row(5).is_none());
    assert_eq!(table.insert_row_after(7, Row::from_texts(&["x"])), None);

    let clone = table.clone_row(0).expect("row 0");
    assert_eq!(table.insert_row_after(0, clone), Some(1));
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[1].text(), "a");

    let removed = table.truncate_rows(1);
    assert_eq!(removed.len(), 2);
    assert_eq!(table.append_row(Row::from_texts(&["c"])), 1);
}

#[test]
fn property_bag_inserts_in_schema_order() {
    let mut paragraph = Paragraph::with_text("caption");
    paragraph.set_alignment(Alignment::Right);
    paragraph.set_style("Caption");
    paragraph.set_keep_with_next();
    let names: Vec<&str> = paragraph.props.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["pStyle", "keepNext", "jc"]);

    let mut run = Run::new("x");
    run.set_size_pt(12.0);
    run.set_bold(true);
    run.set_font("Times New Roman");
    let names: Vec<&str> = run.props.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["rFonts", "b", "bCs", "sz", "szCs"]);
    assert_eq!(run.props.val("sz"), Some("24"));
    assert_eq!(run.font(), Some("Times New Roman"));

    assert!(PPR_ORDER.contains(&"keepNext"));
    assert!(RPR_ORDER.contains(&"rFonts"));
}

#[test]
fn write_then_parse_preserves_structure() {
    let doc = sample();
    let xml = write_document_xml(&doc);
    assert!(xml.contains("<w:bookmarkStart w:id=\"0\" w:name=\"t5\"/>"));
    assert!(xml.contains("<w:t xml:space=\"preserve\">Area </w:t>"));
    assert!(xml.contains("Room&amp;number"));
    assert!(xml.contains("<w:br w:type=\"page\"/>"));
    assert!(xml.contains("w14:paraId=\"1A2B3C4D\""));

    let reparsed = parse_document_xml(&xml).expect("reparse");
    assert_eq!(reparsed.body, doc.body);
}

#[test]
fn page_break_paragraph_is_detected() {
    let doc = sample();
    let paragraph = doc.body[2].as_paragraph().expect("break paragraph");
    assert!(paragraph.has_page_break());
    assert!(!paragraph.is_blank());
    assert!(Paragraph::page_break().has_page_break());
}

#[test]
fn parse_rejects_foreign_root() {
    let err = parse_document_xml("<root/>").expect_err("not a document");
    assert!(err.to_string().contains("w:document"));
}

#[test]
fn package_round_trip_keeps_other_parts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("out.docx");

    let mut package = DocxPackage::from_document(sample());
    package.save(&path).expect("save");

    let mut reopened = DocxPackage::open(&path).expect("open");
    assert_eq!(reopened.document.body, package.document.body);
    assert!(reopened.part_names().contains(&"_rels/.rels"));

    reopened.document.body.remove(2);
    reopened.save(&path).expect("resave");
    let again = DocxPackage::open(&path).expect("open again");
    assert_eq!(again.document.body.len(), 3);

    package.document.body.clear();
    assert_eq!(package.source(), None);
}

#[test]
fn scoped_docx_is_removed_on_drop() {
    let path = {
        let scoped = ScopedDocx::new().expect("scoped temp");
        DocxPackage::from_document(sample())
            .save(scoped.path())
            .expect("save into scoped file");
        assert!(scoped.path().exists());
        scoped.path().to_path_buf()
    };
    assert!(!path.exists());
}

#[test]
fn document_block_helpers() {
    let mut doc = sample();
    assert_eq!(doc.table_count(), 1);
    assert_eq!(doc.table_ordinal(1), Some(0));
    assert_eq!(doc.table_ordinal(0), None);
    assert_eq!(doc.table_index_by_ordinal(0), Some(1));

    let last = doc
        .insert_blocks_after(1, vec![Block::Paragraph(Paragraph::new()), Block::Paragraph(Paragraph::new())])
        .expect("insert");
    assert_eq!(last, 3);
    assert_eq!(doc.body.len(), 6);
    assert!(doc.insert_blocks_after(99, Vec::new()).is_none());
}
