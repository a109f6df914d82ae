use tracing::{debug, info, warn};

use crate::config::{EngineConfig, SplitProfile};
use crate::docx::{Block, Document, Inline, Paragraph, Row, Run, Table};
use crate::error::{EngineError, EngineResult};
use crate::text::normalize;

use super::locator::{caption_above, locate_numbered_table};
use super::pagination::{PaginationOracle, TableLayout, measure_breaks};
use super::vmerge::align_cut_to_blocks;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    Split { fragments: usize, cut_rows: Vec<usize> },
    AlreadySplit,
    NotNeeded,
    Aborted { reason: String },
}

impl SplitOutcome {
    pub fn describe(&self) -> String {
        match self {
            SplitOutcome::Split {
                fragments,
                cut_rows,
            } => format!("split into {fragments} fragments at rows {cut_rows:?}"),
            SplitOutcome::AlreadySplit => "already split".to_string(),
            SplitOutcome::NotNeeded => "fits on its page".to_string(),
            SplitOutcome::Aborted { reason } => format!("aborted: {reason}"),
        }
    }
}

#[derive(Debug)]
enum SplitState {
    CheckIdempotency,
    Measure,
    LocateSplit(Vec<usize>),
    Cut,
    InsertContinuation(Vec<Vec<Row>>),
    MergeAdjacent(Vec<usize>),
    GuardFollowing(usize),
    Done(SplitOutcome),
}

pub struct TableSplitter<'a> {
    config: &'a EngineConfig,
    oracle: &'a dyn PaginationOracle,
}

impl<'a> TableSplitter<'a> {
    pub fn new(config: &'a EngineConfig, oracle: &'a dyn PaginationOracle) -> Self {
        Self { config, oracle }
    }

    pub fn split(&self, doc: &mut Document, table_number: u32) -> EngineResult<SplitOutcome> {
        let profile = self.config.split_profile(table_number);
        let index = locate_numbered_table(doc, &self.config.vocabulary.table_caption, table_number)
            .ok_or_else(|| EngineError::not_found(format!("table {table_number}")))?;
        self.split_at(doc, index, &profile)
    }

    pub fn split_at(
        &self,
        doc: &mut Document,
        index: usize,
        profile: &SplitProfile,
    ) -> EngineResult<SplitOutcome> {
        let table_number = profile.table_number;
        let (row_count, ordinal) = {
            let table = doc
                .table(index)
                .ok_or_else(|| EngineError::not_found(format!("table at body index {index}")))?;
            if table.has_wrapped_rows() {
                return Ok(SplitOutcome::Aborted {
                    reason: format!("table {table_number} wraps rows in foreign markup"),
                });
            }
            (table.rows.len(), doc.table_ordinal(index).unwrap_or_default())
        };
        let layout = TableLayout {
            ordinal,
            rows: row_count,
            header_rows: profile.header_rows,
        };

        // Nothing below Cut may fail on a precondition; the body is mutated from Cut onward.
        let mut cuts: Vec<usize> = Vec::new();
        let mut state = SplitState::CheckIdempotency;
        loop {
            state = match state {
                SplitState::CheckIdempotency => {
                    if self.has_continuation(doc, index, table_number) {
                        SplitState::Done(SplitOutcome::AlreadySplit)
                    } else {
                        SplitState::Measure
                    }
                }
                SplitState::Measure => {
                    if row_count <= profile.header_rows {
                        SplitState::Done(SplitOutcome::NotNeeded)
                    } else {
                        let breaks = measure_breaks(self.oracle, &layout)?;
                        debug!(
                            table = table_number,
                            oracle = self.oracle.name(),
                            breaks = breaks.len(),
                            "measured table"
                        );
                        SplitState::LocateSplit(breaks)
                    }
                }
                SplitState::LocateSplit(breaks) => {
                    let table = doc
                        .table(index)
                        .ok_or_else(|| EngineError::structural("table vanished while planning"))?;
                    cuts = plan_cuts(table, self.oracle, &layout, &breaks, profile);
                    if cuts.is_empty() {
                        SplitState::Done(SplitOutcome::NotNeeded)
                    } else {
                        SplitState::Cut
                    }
                }
                SplitState::Cut => {
                    let table = doc
                        .table_mut(index)
                        .ok_or_else(|| EngineError::structural("table vanished before cut"))?;
                    let fragments = cut_fragments(table, &cuts);
                    table.mark_header_rows(profile.header_rows);
                    info!(
                        table = table_number,
                        fragments = fragments.len() + 1,
                        "cut table at page boundaries"
                    );
                    SplitState::InsertContinuation(fragments)
                }
                SplitState::InsertContinuation(fragments) => {
                    let replicas = self.insert_continuations(doc, index, profile, fragments)?;
                    SplitState::MergeAdjacent(replicas)
                }
                SplitState::MergeAdjacent(replicas) => {
                    let mut last = index;
                    // Back to front so earlier replica indices stay valid.
                    for replica in replicas.iter().rev() {
                        if !join_adjacent_tables(doc, *replica)? {
                            warn!(index = replica, "continuation header not followed by its rows");
                        }
                    }
                    if let Some(first) = replicas.first() {
                        last = *first + (replicas.len() - 1) * 3;
                    }
                    SplitState::GuardFollowing(last)
                }
                SplitState::GuardFollowing(last) => {
                    if matches!(doc.block(last + 1), Some(Block::Table(_))) {
                        doc.insert_blocks_after(last, vec![Block::Paragraph(Paragraph::new())]);
                    }
                    SplitState::Done(SplitOutcome::Split {
                        fragments: cuts.len() + 1,
                        cut_rows: cuts.clone(),
                    })
                }
                SplitState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn has_continuation(&self, doc: &Document, index: usize, table_number: u32) -> bool {
        let marker = normalize(&self.config.vocabulary.continuation_text(table_number));
        doc.body
            .iter()
            .skip(index + 1)
            .take(self.config.idempotency_window)
            .filter_map(Block::as_paragraph)
            .any(|paragraph| {
                normalize(&paragraph.text())
                    .strip_prefix(&marker)
                    .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
            })
    }

    // Returns the body index of every inserted header replica.
    fn insert_continuations(
        &self,
        doc: &mut Document,
        index: usize,
        profile: &SplitProfile,
        fragments: Vec<Vec<Row>>,
    ) -> EngineResult<Vec<usize>> {
        let vocabulary = &self.config.vocabulary;
        let caption_style = caption_above(doc, index, &vocabulary.table_caption, profile.table_number)
            .and_then(|caption| doc.block(caption))
            .and_then(Block::as_paragraph)
            .and_then(|paragraph| paragraph.style().map(str::to_string));

        let (shell, header) = {
            let table = doc
                .table(index)
                .ok_or_else(|| EngineError::structural("table vanished before continuation"))?;
            let header: Vec<Row> = table
                .rows
                .iter()
                .take(profile.header_rows)
                .cloned()
                .map(|mut row| {
                    row.set_header(true);
                    row
                })
                .collect();
            (table.empty_like(), header)
        };

        let caption_text = vocabulary.continuation_text(profile.table_number);
        let mut replicas = Vec::with_capacity(fragments.len());
        let mut after = index;
        for rows in fragments {
            let mut replica = shell.clone();
            replica.rows = header.clone();
            let mut data = shell.clone();
            data.rows = rows;

            let blocks = vec![
                Block::Paragraph(Paragraph::page_break()),
                Block::Paragraph(self.continuation_caption(&caption_text, caption_style.as_deref())),
                Block::Table(replica),
                Block::Table(data),
            ];
            after = doc
                .insert_blocks_after(after, blocks)
                .ok_or_else(|| EngineError::structural("continuation insert point out of range"))?;
            replicas.push(after - 1);
        }
        Ok(replicas)
    }

    fn continuation_caption(&self, text: &str, style: Option<&str>) -> Paragraph {
        let caption = &self.config.caption;
        let mut paragraph = Paragraph::new();
        if let Some(style) = style {
            paragraph.set_style(style);
        }
        paragraph.set_keep_with_next();
        paragraph.set_alignment(caption.alignment);

        let mut run = Run::new(text);
        run.set_font(&caption.font);
        run.set_bold(caption.bold);
        run.set_size_pt(caption.size_pt);
        paragraph.content.push(Inline::Run(run));
        paragraph
    }
}

// Each cut opens a fresh page, so the next cut is measured from the aligned cut rather than
// taken from the uncut table's breaks.
fn plan_cuts(
    table: &Table,
    oracle: &dyn PaginationOracle,
    layout: &TableLayout,
    breaks: &[usize],
    profile: &SplitProfile,
) -> Vec<usize> {
    let mut cuts: Vec<usize> = Vec::new();
    let Some(&first) = breaks.first() else {
        return cuts;
    };

    let mut target = first;
    let mut page = 0;
    while target < table.rows.len() && cuts.len() < profile.max_splits {
        let aligned = align_cut_to_blocks(table, target);
        let floor = cuts.last().copied().unwrap_or(profile.header_rows);
        // A block longer than a page cannot be cut; the fragment runs on past the target.
        let start = if aligned > floor {
            cuts.push(aligned);
            aligned
        } else {
            target
        };

        page += 1;
        target = if breaks.get(page - 1) == Some(&start) {
            match breaks.get(page) {
                Some(next) => *next,
                None => break,
            }
        } else {
            match oracle.continuation_rows(layout, breaks, page) {
                Some(rows) => start + rows.max(1),
                None => break,
            }
        };
    }
    cuts
}

fn cut_fragments(table: &mut Table, cuts: &[usize]) -> Vec<Vec<Row>> {
    let mut fragments = Vec::with_capacity(cuts.len());
    for cut in cuts.iter().rev() {
        fragments.push(table.truncate_rows(*cut));
    }
    fragments.reverse();
    fragments
}

// Joins the table at `index` with the next table when only blank paragraphs sit between them.
pub fn join_adjacent_tables(doc: &mut Document, index: usize) -> EngineResult<bool> {
    if doc.table(index).is_none() {
        return Err(EngineError::not_found(format!("table at body index {index}")));
    }

    let mut next = index + 1;
    while let Some(Block::Paragraph(paragraph)) = doc.block(next) {
        if !paragraph.is_blank() {
            return Ok(false);
        }
        next += 1;
    }
    if doc.table(next).is_none() {
        return Ok(false);
    }

    let Some(Block::Table(follower)) = doc.remove_block(next) else {
        return Err(EngineError::structural("adjacent table disappeared during join"));
    };
    for _ in index + 1..next {
        doc.remove_block(index + 1);
    }
    let table = doc
        .table_mut(index)
        .ok_or_else(|| EngineError::structural("joined table disappeared"))?;
    table.rows.extend(follower.rows);
    Ok(true)
}
