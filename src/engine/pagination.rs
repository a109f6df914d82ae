use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::SplitProfile;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

impl PageSpan {
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    pub fn straddles(&self) -> bool {
        self.end > self.start
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub ordinal: usize,
    pub rows: usize,
    pub header_rows: usize,
}

pub trait PaginationOracle {
    fn name(&self) -> &str;

    fn row_span(&self, layout: &TableLayout, row: usize) -> EngineResult<Option<PageSpan>>;

    /// Data rows the `page`-th continuation page holds once earlier cuts have shifted rows.
    /// `breaks` are the page starts measured on the uncut table.
    fn continuation_rows(&self, layout: &TableLayout, breaks: &[usize], page: usize) -> Option<usize> {
        let capacity = |index: usize| breaks.get(index)?.checked_sub(*breaks.get(index - 1)?);
        if page >= 1 && page < breaks.len() {
            return capacity(page);
        }
        // Past the measured pages, assume the fullest measured page.
        (1..breaks.len())
            .filter_map(capacity)
            .max()
            .or_else(|| breaks.last().map(|last| layout.rows.saturating_sub(*last)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBudgetOracle {
    pub first_page_rows: usize,
    pub next_page_rows: usize,
}

impl RowBudgetOracle {
    pub fn from_profile(profile: &SplitProfile) -> Self {
        Self {
            first_page_rows: profile.first_page_rows,
            next_page_rows: profile.next_page_rows,
        }
    }
}

impl PaginationOracle for RowBudgetOracle {
    fn name(&self) -> &str {
        "row budget"
    }

    fn row_span(&self, layout: &TableLayout, row: usize) -> EngineResult<Option<PageSpan>> {
        if row >= layout.rows {
            return Ok(None);
        }
        if row < layout.header_rows {
            return Ok(Some(PageSpan::single(1)));
        }

        let data_index = row - layout.header_rows;
        let first = self.first_page_rows.max(1);
        if data_index < first {
            return Ok(Some(PageSpan::single(1)));
        }
        let next = self.next_page_rows.max(1);
        let page = 2 + (data_index - first) / next;
        Ok(Some(PageSpan::single(page as u32)))
    }

    fn continuation_rows(&self, _layout: &TableLayout, _breaks: &[usize], _page: usize) -> Option<usize> {
        Some(self.next_page_rows.max(1))
    }
}

#[derive(Debug, Deserialize)]
struct PageMapFile {
    tables: BTreeMap<String, Vec<[u32; 2]>>,
}

// Per-row page spans exported by an external layout pass, keyed by body table ordinal.
#[derive(Debug, Clone, Default)]
pub struct PageMapOracle {
    tables: BTreeMap<usize, Vec<PageSpan>>,
}

impl PageMapOracle {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|err| EngineError::ExternalToolUnavailable {
            tool: "page map".to_string(),
            reason: format!("{}: {err}", path.display()),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> EngineResult<Self> {
        let file: PageMapFile =
            serde_json::from_str(raw).map_err(|err| EngineError::ExternalToolUnavailable {
                tool: "page map".to_string(),
                reason: format!("unreadable page map: {err}"),
            })?;

        let mut tables = BTreeMap::new();
        for (key, spans) in file.tables {
            let ordinal = key.trim().parse::<usize>().map_err(|_| {
                EngineError::ExternalToolUnavailable {
                    tool: "page map".to_string(),
                    reason: format!("table key `{key}` is not an ordinal"),
                }
            })?;
            let spans = spans
                .into_iter()
                .map(|[start, end]| PageSpan {
                    start,
                    end: end.max(start),
                })
                .collect();
            tables.insert(ordinal, spans);
        }
        Ok(Self { tables })
    }
}

impl PaginationOracle for PageMapOracle {
    fn name(&self) -> &str {
        "page map"
    }

    fn row_span(&self, layout: &TableLayout, row: usize) -> EngineResult<Option<PageSpan>> {
        let spans = self.tables.get(&layout.ordinal).ok_or_else(|| {
            EngineError::ExternalToolUnavailable {
                tool: "page map".to_string(),
                reason: format!("no pages recorded for table #{}", layout.ordinal),
            }
        })?;
        Ok(spans.get(row).copied())
    }
}

// First row of each page-aligned fragment after the first.
pub fn measure_breaks(
    oracle: &dyn PaginationOracle,
    layout: &TableLayout,
) -> EngineResult<Vec<usize>> {
    let Some(table_start) = oracle.row_span(layout, 0)? else {
        return Ok(Vec::new());
    };

    let mut breaks = Vec::new();
    let mut page = table_start.start;
    for row in layout.header_rows..layout.rows {
        let Some(span) = oracle.row_span(layout, row)? else {
            break;
        };
        if span.start > page || span.straddles() {
            breaks.push(row);
            page = span.end.max(span.start);
        }
    }
    Ok(breaks)
}
