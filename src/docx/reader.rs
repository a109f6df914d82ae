use roxmltree::Node;

use super::props::{PropertyBag, PropertyNode};
use super::tree::{
    Block, BreakKind, Cell, Document, Inline, Paragraph, RawXml, Row, Run, RunItem, Shell, Table,
    WML_NS,
};
use crate::error::{EngineError, EngineResult};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub fn parse_document_xml(xml: &str) -> EngineResult<Document> {
    let parsed = roxmltree::Document::parse(xml)
        .map_err(|err| EngineError::structural(format!("document.xml is not well-formed: {err}")))?;

    let root = parsed.root_element();
    if !is_wml(root, "document") {
        return Err(EngineError::structural("root element is not w:document"));
    }
    if root.lookup_prefix(WML_NS) != Some("w") {
        return Err(EngineError::structural(
            "wordprocessingml namespace is not bound to the w prefix",
        ));
    }

    let body = root
        .children()
        .find(|node| is_wml(*node, "body"))
        .ok_or_else(|| EngineError::structural("document has no w:body"))?;

    let range = body.range();
    let shell = Shell {
        head: xml[..range.start].to_string(),
        tail: xml[range.end..].to_string(),
    };

    let blocks = body
        .children()
        .filter(Node::is_element)
        .map(|node| read_block(xml, node))
        .collect();

    Ok(Document {
        shell,
        body: blocks,
    })
}

fn is_wml(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(WML_NS)
        && node.tag_name().name() == name
}

fn qualified_name(node: Node) -> String {
    let local = node.tag_name().name();
    match node
        .tag_name()
        .namespace()
        .and_then(|namespace| node.lookup_prefix(namespace))
    {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn read_attrs(node: Node) -> Vec<(String, String)> {
    node.attributes()
        .map(|attr| {
            let name = match attr.namespace() {
                Some(XML_NS) => format!("xml:{}", attr.name()),
                Some(namespace) => match node.lookup_prefix(namespace) {
                    Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", attr.name()),
                    _ => attr.name().to_string(),
                },
                None => attr.name().to_string(),
            };
            (name, attr.value().to_string())
        })
        .collect()
}

fn raw(xml: &str, node: Node) -> RawXml {
    let text = node
        .descendants()
        .filter(|item| is_wml(*item, "t"))
        .filter_map(|item| item.text())
        .collect::<String>();

    RawXml {
        name: qualified_name(node),
        xml: xml[node.range()].to_string(),
        text,
    }
}

fn read_props(xml: &str, node: Node) -> PropertyBag {
    let nodes = node
        .children()
        .filter(Node::is_element)
        .map(|child| {
            let in_wml = child.tag_name().namespace() == Some(WML_NS);
            let nested = child.children().any(|item| item.is_element());
            PropertyNode {
                name: if in_wml {
                    child.tag_name().name().to_string()
                } else {
                    qualified_name(child)
                },
                attrs: read_attrs(child),
                raw: (nested || !in_wml).then(|| xml[child.range()].to_string()),
            }
        })
        .collect();
    PropertyBag::from_nodes(nodes)
}

fn read_block(xml: &str, node: Node) -> Block {
    if is_wml(node, "p") {
        Block::Paragraph(read_paragraph(xml, node))
    } else if is_wml(node, "tbl") {
        Block::Table(read_table(xml, node))
    } else {
        Block::Raw(raw(xml, node))
    }
}

fn read_paragraph(xml: &str, node: Node) -> Paragraph {
    let mut paragraph = Paragraph {
        attrs: read_attrs(node),
        ..Paragraph::default()
    };

    for child in node.children().filter(Node::is_element) {
        if is_wml(child, "pPr") {
            paragraph.props = read_props(xml, child);
        } else if is_wml(child, "r") {
            paragraph.content.push(Inline::Run(read_run(xml, child)));
        } else {
            paragraph.content.push(Inline::Raw(raw(xml, child)));
        }
    }
    paragraph
}

fn read_run(xml: &str, node: Node) -> Run {
    let mut run = Run::default();
    for child in node.children().filter(Node::is_element) {
        if is_wml(child, "rPr") {
            run.props = read_props(xml, child);
        } else if is_wml(child, "t") {
            run.content
                .push(RunItem::Text(child.text().unwrap_or_default().to_string()));
        } else if is_wml(child, "tab") {
            run.content.push(RunItem::Tab);
        } else if is_wml(child, "br") {
            let kind = match child.attribute((WML_NS, "type")) {
                Some("page") => BreakKind::Page,
                Some("column") => BreakKind::Column,
                _ => BreakKind::Line,
            };
            run.content.push(RunItem::Break(kind));
        } else if is_wml(child, "cr") {
            run.content.push(RunItem::Break(BreakKind::Line));
        } else {
            run.content.push(RunItem::Raw(raw(xml, child)));
        }
    }
    run
}

fn read_table(xml: &str, node: Node) -> Table {
    let mut table = Table::default();
    for child in node.children().filter(Node::is_element) {
        if is_wml(child, "tblPr") {
            table.props = read_props(xml, child);
        } else if is_wml(child, "tblGrid") {
            table.grid = Some(raw(xml, child));
        } else if is_wml(child, "tr") {
            table.rows.push(read_row(xml, child));
        } else {
            table.trailing.push(raw(xml, child));
        }
    }
    table
}

fn read_row(xml: &str, node: Node) -> Row {
    let mut row = Row {
        attrs: read_attrs(node),
        ..Row::default()
    };
    for child in node.children().filter(Node::is_element) {
        if is_wml(child, "tblPrEx") {
            row.prefix.push(raw(xml, child));
        } else if is_wml(child, "trPr") {
            row.props = read_props(xml, child);
        } else if is_wml(child, "tc") {
            row.cells.push(read_cell(xml, child));
        } else {
            row.suffix.push(raw(xml, child));
        }
    }
    row
}

fn read_cell(xml: &str, node: Node) -> Cell {
    let mut cell = Cell::default();
    for child in node.children().filter(Node::is_element) {
        if is_wml(child, "tcPr") {
            cell.props = read_props(xml, child);
        } else {
            cell.blocks.push(read_block(xml, child));
        }
    }
    cell
}
