use super::props::{PropertyNode, TBLPR_ORDER, TCPR_ORDER, TRPR_ORDER};
use super::tree::{Alignment, Block, Cell, Paragraph, Row, Table, VMerge};

impl Cell {
    pub fn with_text(text: &str) -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::with_text(text))],
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<String>>()
            .join("\n")
            .replace(['\u{00A0}', '\u{202F}'], " ")
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        })
    }

    fn template_paragraph(&self) -> Option<Paragraph> {
        self.paragraphs().next().cloned()
    }

    pub fn set_text(&mut self, text: &str, preserve_style: bool) {
        let paragraph = match self.template_paragraph() {
            Some(mut paragraph) if preserve_style => {
                paragraph.set_text_keep_style(text);
                paragraph
            }
            _ => Paragraph::with_text(text),
        };
        self.blocks = vec![Block::Paragraph(paragraph)];
    }

    pub fn set_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        let template = self.template_paragraph().unwrap_or_default();
        if lines.is_empty() {
            let mut paragraph = template;
            paragraph.set_text_keep_style("");
            self.blocks = vec![Block::Paragraph(paragraph)];
            return;
        }

        self.blocks = lines
            .iter()
            .map(|line| {
                let mut paragraph = template.clone();
                paragraph.set_text_keep_style(line.as_ref());
                Block::Paragraph(paragraph)
            })
            .collect();
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        for paragraph in self.paragraphs_mut() {
            paragraph.set_alignment(alignment);
        }
    }

    pub fn set_bold(&mut self, bold: bool) {
        for paragraph in self.paragraphs_mut() {
            for run in paragraph.runs_mut() {
                run.set_bold(bold);
            }
        }
    }

    pub fn vmerge(&self) -> VMerge {
        match self.props.get("vMerge") {
            None => VMerge::None,
            Some(node) if node.val() == Some("restart") => VMerge::Start,
            Some(_) => VMerge::Continue,
        }
    }

    pub fn set_vmerge(&mut self, state: VMerge) {
        match state {
            VMerge::None => {
                self.props.remove("vMerge");
            }
            VMerge::Start => self
                .props
                .set(PropertyNode::with_val("vMerge", "restart"), TCPR_ORDER),
            VMerge::Continue => self
                .props
                .set(PropertyNode::with_val("vMerge", "continue"), TCPR_ORDER),
        }
    }

    pub fn grid_span(&self) -> usize {
        self.props
            .val("gridSpan")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|span| *span > 0)
            .unwrap_or(1)
    }

    pub fn set_grid_span(&mut self, span: usize) {
        if span > 1 {
            self.props
                .set(PropertyNode::with_val("gridSpan", &span.to_string()), TCPR_ORDER);
        } else {
            self.props.remove("gridSpan");
        }
    }

    pub fn set_vertical_center(&mut self) {
        self.props
            .set(PropertyNode::with_val("vAlign", "center"), TCPR_ORDER);
    }
}

impl Row {
    pub fn from_texts(texts: &[&str]) -> Self {
        Self {
            cells: texts.iter().map(|text| Cell::with_text(text)).collect(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(Cell::text)
            .collect::<Vec<String>>()
            .join(" ")
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    fn grid_before(&self) -> usize {
        self.props
            .val("gridBefore")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0)
    }

    pub fn cell_index_at_grid(&self, column: usize) -> Option<usize> {
        let mut start = self.grid_before();
        for (index, cell) in self.cells.iter().enumerate() {
            let end = start + cell.grid_span();
            if column >= start && column < end {
                return Some(index);
            }
            start = end;
        }
        None
    }

    pub fn grid_index_of(&self, cell_index: usize) -> Option<usize> {
        if cell_index >= self.cells.len() {
            return None;
        }
        let spans: usize = self.cells[..cell_index].iter().map(Cell::grid_span).sum();
        Some(self.grid_before() + spans)
    }

    pub fn cell_at_grid(&self, column: usize) -> Option<&Cell> {
        self.cell_index_at_grid(column)
            .and_then(|index| self.cells.get(index))
    }

    pub fn cell_at_grid_mut(&mut self, column: usize) -> Option<&mut Cell> {
        let index = self.cell_index_at_grid(column)?;
        self.cells.get_mut(index)
    }

    // One entry per grid column; spanned cells repeat.
    pub fn grid_texts(&self) -> Vec<String> {
        let mut texts = vec![String::new(); self.grid_before()];
        for cell in &self.cells {
            let text = cell.text();
            for _ in 0..cell.grid_span() {
                texts.push(text.clone());
            }
        }
        texts
    }

    pub fn is_header(&self) -> bool {
        self.props.get("tblHeader").is_some_and(PropertyNode::is_on)
    }

    pub fn set_header(&mut self, header: bool) {
        if header {
            self.props
                .set(PropertyNode::flag("tblHeader"), TRPR_ORDER);
        } else {
            self.props.remove("tblHeader");
        }
    }
}

impl Table {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn clone_row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).cloned()
    }

    pub fn append_row(&mut self, row: Row) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    pub fn insert_row_after(&mut self, anchor: usize, row: Row) -> Option<usize> {
        if anchor >= self.rows.len() {
            return None;
        }
        self.rows.insert(anchor + 1, row);
        Some(anchor + 1)
    }

    pub fn truncate_rows(&mut self, from: usize) -> Vec<Row> {
        if from >= self.rows.len() {
            return Vec::new();
        }
        self.rows.split_off(from)
    }

    pub fn mark_header_rows(&mut self, count: usize) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.set_header(index < count);
        }
    }

    pub fn set_fixed_layout(&mut self) {
        self.props.set(
            PropertyNode::with_attrs("tblLayout", &[("w:type", "fixed")]),
            TBLPR_ORDER,
        );
    }

    pub fn is_fixed_layout(&self) -> bool {
        self.props
            .get("tblLayout")
            .and_then(|node| node.attr("w:type"))
            == Some("fixed")
    }

    pub fn set_style(&mut self, style: &str) {
        self.props
            .set(PropertyNode::with_val("tblStyle", style), TBLPR_ORDER);
    }

    // Same table properties and grid, no rows.
    pub fn empty_like(&self) -> Table {
        Table {
            props: self.props.clone(),
            grid: self.grid.clone(),
            rows: Vec::new(),
            trailing: Vec::new(),
        }
    }

    // Rows wrapped in content controls or custom XML are not addressable.
    pub fn has_wrapped_rows(&self) -> bool {
        self.trailing.iter().any(|raw| raw.xml.contains("<w:tr"))
    }

    pub fn grid_width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.grid_texts().len())
            .max()
            .unwrap_or(0)
    }
}
