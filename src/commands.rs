pub mod airflow;
pub mod inspect;
pub mod render;
pub mod risk;
pub mod split;

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::cli::SplitBudgetArgs;
use crate::config::{EngineConfig, SplitProfile};
use crate::engine::{PageMapOracle, PaginationOracle, RowBudgetOracle};
use crate::error::EngineResult;

impl SplitBudgetArgs {
    pub fn is_empty(&self) -> bool {
        self.header_rows.is_none()
            && self.first_page_rows.is_none()
            && self.next_page_rows.is_none()
            && self.max_splits.is_none()
    }

    pub fn apply(&self, profile: &mut SplitProfile) {
        if let Some(rows) = self.header_rows {
            profile.header_rows = rows;
        }
        if let Some(rows) = self.first_page_rows {
            profile.first_page_rows = rows;
        }
        if let Some(rows) = self.next_page_rows {
            profile.next_page_rows = rows;
        }
        if let Some(limit) = self.max_splits {
            profile.max_splits = limit;
        }
    }
}

// Flag overrides land on every configured profile.
pub fn load_config(path: Option<&Path>, budgets: &SplitBudgetArgs) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(path)?;
    if !budgets.is_empty() {
        for profile in &mut config.split_profiles {
            budgets.apply(profile);
        }
        debug!(?budgets, "split budgets overridden from flags");
    }
    Ok(config)
}

pub fn pagination_oracle(
    page_map: Option<&Path>,
    profile: &SplitProfile,
) -> EngineResult<Box<dyn PaginationOracle>> {
    match page_map {
        Some(path) => Ok(Box::new(PageMapOracle::load(path)?)),
        None => Ok(Box::new(RowBudgetOracle::from_profile(profile))),
    }
}
