use super::props::{PropertyBag, PropertyNode};
use super::tree::{Block, BreakKind, Cell, Document, Inline, Paragraph, Row, Run, RunItem, Table};

pub fn write_document_xml(document: &Document) -> String {
    let mut out = String::with_capacity(document.shell.head.len() + 64 * 1024);
    out.push_str(&document.shell.head);
    out.push_str("<w:body>");
    for block in &document.body {
        write_block(&mut out, block);
    }
    out.push_str("</w:body>");
    out.push_str(&document.shell.tail);
    out
}

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn write_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
}

fn write_node(out: &mut String, node: &PropertyNode) {
    if let Some(raw) = &node.raw {
        out.push_str(raw);
        return;
    }
    out.push_str("<w:");
    out.push_str(&node.name);
    write_attrs(out, &node.attrs);
    out.push_str("/>");
}

fn write_props(out: &mut String, tag: &str, props: &PropertyBag) {
    if props.is_empty() {
        return;
    }
    out.push_str("<w:");
    out.push_str(tag);
    out.push('>');
    for node in props.iter() {
        write_node(out, node);
    }
    out.push_str("</w:");
    out.push_str(tag);
    out.push('>');
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph(paragraph) => write_paragraph(out, paragraph),
        Block::Table(table) => write_table(out, table),
        Block::Raw(raw) => out.push_str(&raw.xml),
    }
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<w:p");
    write_attrs(out, &paragraph.attrs);
    out.push('>');
    write_props(out, "pPr", &paragraph.props);
    for inline in &paragraph.content {
        match inline {
            Inline::Run(run) => write_run(out, run),
            Inline::Raw(raw) => out.push_str(&raw.xml),
        }
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");
    write_props(out, "rPr", &run.props);
    for item in &run.content {
        match item {
            RunItem::Text(text) => {
                if text.starts_with(char::is_whitespace)
                    || text.ends_with(char::is_whitespace)
                    || text.contains("  ")
                {
                    out.push_str("<w:t xml:space=\"preserve\">");
                } else {
                    out.push_str("<w:t>");
                }
                out.push_str(&escape_text(text));
                out.push_str("</w:t>");
            }
            RunItem::Tab => out.push_str("<w:tab/>"),
            RunItem::Break(BreakKind::Line) => out.push_str("<w:br/>"),
            RunItem::Break(BreakKind::Page) => out.push_str("<w:br w:type=\"page\"/>"),
            RunItem::Break(BreakKind::Column) => out.push_str("<w:br w:type=\"column\"/>"),
            RunItem::Raw(raw) => out.push_str(&raw.xml),
        }
    }
    out.push_str("</w:r>");
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str("<w:tbl>");
    write_props(out, "tblPr", &table.props);
    if let Some(grid) = &table.grid {
        out.push_str(&grid.xml);
    }
    for row in &table.rows {
        write_row(out, row);
    }
    for raw in &table.trailing {
        out.push_str(&raw.xml);
    }
    out.push_str("</w:tbl>");
}

fn write_row(out: &mut String, row: &Row) {
    out.push_str("<w:tr");
    write_attrs(out, &row.attrs);
    out.push('>');
    for raw in &row.prefix {
        out.push_str(&raw.xml);
    }
    write_props(out, "trPr", &row.props);
    for cell in &row.cells {
        write_cell(out, cell);
    }
    for raw in &row.suffix {
        out.push_str(&raw.xml);
    }
    out.push_str("</w:tr>");
}

fn write_cell(out: &mut String, cell: &Cell) {
    out.push_str("<w:tc>");
    write_props(out, "tcPr", &cell.props);
    for block in &cell.blocks {
        write_block(out, block);
    }
    // A cell must end with a paragraph.
    if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
        out.push_str("<w:p/>");
    }
    out.push_str("</w:tc>");
}
