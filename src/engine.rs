pub mod expander;
pub mod locator;
pub mod marker_split;
pub mod pagination;
pub mod splitter;
pub mod vmerge;

#[cfg(test)]
mod tests;

pub use expander::{ExpandOptions, PlaceholderTable, RowGroup, RowRecord, RowTemplate, expand, expand_grouped, pad_rows};
pub use locator::{Keywords, find_anchor_row, find_column, find_columns, find_table};
pub use marker_split::{mark_repeat_headers, split_after_marker_row};
pub use pagination::{PageMapOracle, PageSpan, PaginationOracle, RowBudgetOracle};
pub use splitter::{SplitOutcome, TableSplitter, join_adjacent_tables};
pub use vmerge::{align_cut_to_blocks, merge_blocks, merge_column_range, merge_equal_runs, merge_or_write};
