//! Discovery for families that log to fixed system locations (resolvers,
//! syslog, application logs). One strategy: expand the configured absolute
//! globs and keep the newest files the bounds allow.

use crate::select::{self, Bounds};
use crate::TierOutcome;
use edgelog_core::SourceType;

pub const SYSTEM_GLOB: &str = "system_glob";

pub(crate) fn search<S: AsRef<str>>(patterns: &[S], bounds: Bounds, hint: SourceType) -> TierOutcome {
    let found = select::glob_many(patterns, bounds.max_depth);
    let note = format!("{} patterns, {} files matched", patterns.len(), found.len());
    let selection = select::select(found, bounds);
    TierOutcome::from_selection(SYSTEM_GLOB, selection, hint, false, vec![note])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TierStatus;
    use std::fs;

    const WIDE: Bounds = Bounds {
        max_files: 25,
        max_total_bytes: u64::MAX,
        max_depth: 12,
    };

    #[test]
    fn rotated_resolver_logs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("named")).unwrap();
        fs::write(dir.path().join("named/queries.log"), "x").unwrap();
        fs::write(dir.path().join("named/queries.log.1.gz"), "x").unwrap();
        fs::write(dir.path().join("named/README"), "x").unwrap();

        let patterns = vec![format!("{}/named/*.log*", dir.path().display())];
        let out = search(&patterns, WIDE, SourceType::Dns);
        assert_eq!(out.attempt.strategy, SYSTEM_GLOB);
        assert_eq!(out.attempt.status, TierStatus::Resolved);
        assert_eq!(out.candidates.len(), 2);
        assert!(out.candidates.iter().all(|c| c.hint == SourceType::Dns));
    }

    #[test]
    fn recursive_pattern_respects_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("rsyslog/hosts/edge-01");
        fs::create_dir_all(&nested).unwrap();
        for name in ["a.log", "b.log", "c.log"] {
            fs::write(nested.join(name), "x").unwrap();
        }
        let patterns = vec![format!("{}/rsyslog/**/*", dir.path().display())];
        let bounds = Bounds { max_files: 2, ..WIDE };
        let out = search(&patterns, bounds, SourceType::Syslog);
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.attempt.skipped.len(), 1);
    }

    #[test]
    fn nothing_matched_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = vec![format!("{}/app/*.log", dir.path().display())];
        let out = search(&patterns, WIDE, SourceType::App);
        assert_eq!(out.attempt.status, TierStatus::Empty);
        assert!(out.candidates.is_empty());
    }
}
