//! Environment System
//!
//! Natural evaporation: every plot dries out a little each tick.

use crate::config::TickRules;
use crate::error::Result;
use crate::store::GridStore;

/// Remove `rules.evaporation` moisture from every plot (floored at 0).
/// Returns the number of plots updated.
pub fn evaporation_system(store: &mut dyn GridStore, rules: &TickRules) -> Result<usize> {
    let mut plots = store.find_all_plots();
    for plot in &mut plots {
        plot.remove_moisture(rules.evaporation);
    }
    store.save_all_plots(&plots)?;
    Ok(plots.len())
}
