use std::ops::Range;

use crate::docx::{Table, VMerge};
use crate::error::{EngineError, EngineResult};

pub fn merge_column_range(
    table: &mut Table,
    column: usize,
    rows: Range<usize>,
    top_value: &str,
) -> EngineResult<()> {
    if rows.is_empty() {
        return Ok(());
    }

    for index in rows.clone() {
        let present = table
            .row(index)
            .and_then(|row| row.cell_at_grid(column))
            .is_some();
        if !present {
            return Err(EngineError::mismatch(format!(
                "no cell at row {index}, column {column} for vertical merge"
            )));
        }
    }

    let first = rows.start;
    for index in rows {
        let Some(cell) = table
            .row_mut(index)
            .and_then(|row| row.cell_at_grid_mut(column))
        else {
            continue;
        };
        cell.set_vmerge(VMerge::None);
        if index == first {
            cell.set_text(top_value, true);
            cell.set_vmerge(VMerge::Start);
        } else {
            cell.set_text("", true);
            cell.set_vmerge(VMerge::Continue);
        }
    }
    Ok(())
}

// One-row ranges get plain text, not a lone restart.
pub fn merge_or_write(
    table: &mut Table,
    column: usize,
    rows: Range<usize>,
    top_value: &str,
) -> EngineResult<()> {
    match rows.len() {
        0 => Ok(()),
        1 => {
            let cell = table
                .row_mut(rows.start)
                .and_then(|row| row.cell_at_grid_mut(column))
                .ok_or_else(|| {
                    EngineError::mismatch(format!("no cell at row {}, column {column}", rows.start))
                })?;
            cell.set_text(top_value, true);
            Ok(())
        }
        _ => merge_column_range(table, column, rows, top_value),
    }
}

// Existing merge blocks in a column, including single-cell restarts.
pub fn merge_blocks(table: &Table, column: usize) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut open: Option<usize> = None;

    for (index, row) in table.rows.iter().enumerate() {
        let state = row
            .cell_at_grid(column)
            .map(|cell| cell.vmerge())
            .unwrap_or(VMerge::None);
        match state {
            VMerge::Start => {
                if let Some(start) = open.take() {
                    blocks.push(start..index);
                }
                open = Some(index);
            }
            VMerge::Continue => {
                if open.is_none() {
                    open = Some(index);
                }
            }
            VMerge::None => {
                if let Some(start) = open.take() {
                    blocks.push(start..index);
                }
            }
        }
    }
    if let Some(start) = open {
        blocks.push(start..table.rows.len());
    }
    blocks
}

// Moves a cut back to the start of any block in any column that it would tear.
pub fn align_cut_to_blocks(table: &Table, cut: usize) -> usize {
    let width = table.grid_width();
    let mut aligned = cut;
    loop {
        let earlier = (0..width)
            .flat_map(|column| merge_blocks(table, column))
            .filter(|block| block.start < aligned && aligned < block.end)
            .map(|block| block.start)
            .min();
        match earlier {
            Some(start) => aligned = start,
            None => return aligned,
        }
    }
}

// Merges consecutive rows whose keys are equal; returns the number of blocks built.
pub fn merge_equal_runs<F>(
    table: &mut Table,
    column: usize,
    rows: Range<usize>,
    key: F,
) -> EngineResult<usize>
where
    F: Fn(&str) -> String,
{
    let mut runs: Vec<(Range<usize>, String)> = Vec::new();
    let mut current: Option<(usize, String, String)> = None;

    for index in rows.clone() {
        let text = table
            .row(index)
            .and_then(|row| row.cell_at_grid(column))
            .map(|cell| cell.text())
            .ok_or_else(|| {
                EngineError::mismatch(format!("no cell at row {index}, column {column}"))
            })?;
        let row_key = key(&text);

        let continues = matches!(
            &current,
            Some((_, open_key, _)) if !row_key.is_empty() && *open_key == row_key
        );
        if !continues {
            if let Some((start, _, top)) = current.take() {
                runs.push((start..index, top));
            }
            current = Some((index, row_key, text));
        }
    }
    if let Some((start, _, top)) = current {
        runs.push((start..rows.end, top));
    }

    let mut built = 0;
    for (range, top) in runs {
        if range.len() < 2 {
            continue;
        }
        merge_column_range(table, column, range, &top)?;
        built += 1;
    }
    Ok(built)
}
