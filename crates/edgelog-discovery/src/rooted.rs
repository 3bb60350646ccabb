//! Root-scoped discovery for families with no well-known system location
//! (load-balancer exports, firewall/flow logs). Only the search root is
//! walked; nothing outside it is touched.

use crate::select::{self, Bounds};
use crate::TierOutcome;
use edgelog_core::SourceType;
use std::path::Path;

pub const ROOT_SEARCH: &str = "root_search";

pub(crate) fn search<S: AsRef<str>>(
    root: &Path,
    patterns: &[S],
    bounds: Bounds,
    hint: SourceType,
) -> TierOutcome {
    if !root.is_dir() {
        let note = format!("search root {} is not a directory", root.display());
        return TierOutcome::from_selection(ROOT_SEARCH, Default::default(), hint, true, vec![note]);
    }
    let found = select::glob_under(root, patterns, bounds.max_depth, bounds.max_files);
    let mut notes = vec![format!("{} patterns under {}", patterns.len(), root.display())];
    if found.len() >= bounds.max_files {
        notes.push(format!("search stopped at max_files ({})", bounds.max_files));
    }
    let selection = select::select(found, bounds);
    TierOutcome::from_selection(ROOT_SEARCH, selection, hint, false, notes)
}
