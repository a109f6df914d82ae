use super::tree::{Block, Document, Paragraph, Table};

impl Document {
    pub fn from_blocks(body: Vec<Block>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.body.get(index)
    }

    pub fn tables(&self) -> impl Iterator<Item = (usize, &Table)> {
        self.body
            .iter()
            .enumerate()
            .filter_map(|(index, block)| block.as_table().map(|table| (index, table)))
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = (usize, &Paragraph)> {
        self.body
            .iter()
            .enumerate()
            .filter_map(|(index, block)| block.as_paragraph().map(|paragraph| (index, paragraph)))
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.body.get(index).and_then(Block::as_table)
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        self.body.get_mut(index).and_then(Block::as_table_mut)
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    pub fn table_ordinal(&self, index: usize) -> Option<usize> {
        self.table(index)?;
        Some(self.body[..index].iter().filter(|block| block.as_table().is_some()).count())
    }

    pub fn table_index_by_ordinal(&self, ordinal: usize) -> Option<usize> {
        self.tables().nth(ordinal).map(|(index, _)| index)
    }

    // Returns the body index of the last inserted block.
    pub fn insert_blocks_after(&mut self, index: usize, blocks: Vec<Block>) -> Option<usize> {
        if index >= self.body.len() {
            return None;
        }
        let count = blocks.len();
        let at = index + 1;
        self.body.splice(at..at, blocks);
        Some(index + count)
    }

    pub fn insert_blocks_at(&mut self, index: usize, blocks: Vec<Block>) -> Option<usize> {
        if index > self.body.len() {
            return None;
        }
        let count = blocks.len();
        self.body.splice(index..index, blocks);
        Some(index + count)
    }

    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index < self.body.len() {
            Some(self.body.remove(index))
        } else {
            None
        }
    }

    pub fn text(&self) -> String {
        self.body
            .iter()
            .map(Block::text)
            .collect::<Vec<String>>()
            .join("\n")
    }
}
