use serde::{Deserialize, Serialize};

use super::props::{PPR_ORDER, PropertyBag, PropertyNode, RPR_ORDER};

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, PartialEq)]
pub struct RawXml {
    pub name: String,
    pub xml: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Raw(RawXml),
}

impl Block {
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(paragraph) => paragraph.text(),
            Block::Table(table) => table.text(),
            Block::Raw(raw) => raw.text.clone(),
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Line,
    Page,
    Column,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunItem {
    Text(String),
    Tab,
    Break(BreakKind),
    Raw(RawXml),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub props: PropertyBag,
    pub content: Vec<RunItem>,
}

impl Run {
    pub fn new(text: &str) -> Self {
        let mut run = Self::default();
        run.set_text(text);
        run
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunItem::Text(text) => out.push_str(text),
                RunItem::Tab => out.push('\t'),
                RunItem::Break(BreakKind::Line) => out.push('\n'),
                RunItem::Break(_) => {}
                RunItem::Raw(raw) => out.push_str(&raw.text),
            }
        }
        out
    }

    pub fn has_page_break(&self) -> bool {
        self.content
            .iter()
            .any(|item| matches!(item, RunItem::Break(BreakKind::Page)))
    }

    // Replaces text-bearing content; drawings and field codes go with it.
    pub fn set_text(&mut self, text: &str) {
        self.content.clear();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.content.push(RunItem::Break(BreakKind::Line));
            }
            for (part_index, part) in line.split('\t').enumerate() {
                if part_index > 0 {
                    self.content.push(RunItem::Tab);
                }
                if !part.is_empty() {
                    self.content.push(RunItem::Text(part.to_string()));
                }
            }
        }
    }

    pub fn set_bold(&mut self, bold: bool) {
        if bold {
            self.props.set(PropertyNode::flag("b"), RPR_ORDER);
            self.props.set(PropertyNode::flag("bCs"), RPR_ORDER);
        } else {
            self.props.remove("b");
            self.props.remove("bCs");
        }
    }

    pub fn is_bold(&self) -> bool {
        self.props.get("b").is_some_and(PropertyNode::is_on)
    }

    pub fn set_font(&mut self, face: &str) {
        self.props.set(
            PropertyNode::with_attrs(
                "rFonts",
                &[
                    ("w:ascii", face),
                    ("w:hAnsi", face),
                    ("w:cs", face),
                    ("w:eastAsia", face),
                ],
            ),
            RPR_ORDER,
        );
    }

    pub fn font(&self) -> Option<&str> {
        self.props.get("rFonts").and_then(|node| node.attr("w:ascii"))
    }

    pub fn set_size_pt(&mut self, size_pt: f32) {
        let half_points = ((size_pt * 2.0).round() as i64).to_string();
        self.props
            .set(PropertyNode::with_val("sz", &half_points), RPR_ORDER);
        self.props
            .set(PropertyNode::with_val("szCs", &half_points), RPR_ORDER);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Raw(RawXml),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub attrs: Vec<(String, String)>,
    pub props: PropertyBag,
    pub content: Vec<Inline>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let mut paragraph = Self::new();
        paragraph.content.push(Inline::Run(Run::new(text)));
        paragraph
    }

    pub fn page_break() -> Self {
        let mut run = Run::default();
        run.content.push(RunItem::Break(BreakKind::Page));
        Self {
            content: vec![Inline::Run(run)],
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            match inline {
                Inline::Run(run) => out.push_str(&run.text()),
                Inline::Raw(raw) => out.push_str(&raw.text),
            }
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty() && !self.has_page_break()
    }

    pub fn has_page_break(&self) -> bool {
        self.runs().any(Run::has_page_break)
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Raw(_) => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Raw(_) => None,
        })
    }

    pub fn style(&self) -> Option<&str> {
        self.props.val("pStyle")
    }

    pub fn set_style(&mut self, style: &str) {
        self.props
            .set(PropertyNode::with_val("pStyle", style), PPR_ORDER);
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.props
            .set(PropertyNode::with_val("jc", alignment.as_jc()), PPR_ORDER);
    }

    pub fn alignment(&self) -> Option<&str> {
        self.props.val("jc")
    }

    pub fn set_keep_with_next(&mut self) {
        self.props.set(PropertyNode::flag("keepNext"), PPR_ORDER);
    }

    pub fn set_spacing_pt(&mut self, before_pt: f32, after_pt: f32) {
        let before = ((before_pt * 20.0).round() as i64).to_string();
        let after = ((after_pt * 20.0).round() as i64).to_string();
        self.props.set(
            PropertyNode::with_attrs("spacing", &[("w:before", &before), ("w:after", &after)]),
            PPR_ORDER,
        );
    }

    // Keeps the first run's formatting; drops the remaining runs.
    pub fn set_text_keep_style(&mut self, text: &str) {
        let mut seen_run = false;
        self.content.retain_mut(|inline| match inline {
            Inline::Run(run) if !seen_run => {
                seen_run = true;
                run.set_text(text);
                true
            }
            Inline::Run(_) => false,
            Inline::Raw(raw) => raw.text.is_empty(),
        });
        if !seen_run {
            self.content.push(Inline::Run(Run::new(text)));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    None,
    Start,
    Continue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub props: PropertyBag,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub attrs: Vec<(String, String)>,
    pub prefix: Vec<RawXml>,
    pub props: PropertyBag,
    pub cells: Vec<Cell>,
    pub suffix: Vec<RawXml>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub props: PropertyBag,
    pub grid: Option<RawXml>,
    pub rows: Vec<Row>,
    pub trailing: Vec<RawXml>,
}

impl Table {
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(Row::text)
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Shell {
    pub head: String,
    pub tail: String,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            head: format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{WML_NS}\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">"
            ),
            tail: "</w:document>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub(crate) shell: Shell,
    pub body: Vec<Block>,
}
