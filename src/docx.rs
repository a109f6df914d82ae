mod body;
mod package;
mod props;
mod reader;
mod table;
mod tree;
mod writer;

#[cfg(test)]
mod tests;

pub use package::{DocxPackage, ScopedDocx};
pub use props::{PropertyBag, PropertyNode};
pub use reader::parse_document_xml;
pub use tree::{
    Alignment, Block, BreakKind, Cell, Document, Inline, Paragraph, RawXml, Row, Run, RunItem,
    Table, VMerge,
};
pub use writer::write_document_xml;
