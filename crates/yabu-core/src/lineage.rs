//! Remote archive listing checks and the retention decision.
//!
//! The store is trusted to return listings sorted ascending by name, which
//! for `<name>-<YYYYMMDDHHMM>.<ext>` keys is also ascending by time. That
//! trust is verified, not assumed: a listing whose first entry is newer than
//! its last aborts the run before anything is mutated.

use crate::error::{Result, YabuError};

/// Timestamp stamp width in the archive name: `%Y%m%d%H%M`.
const STAMP_LEN: usize = 12;

/// One remote archive: its object key plus the timestamp encoded in the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRef {
    pub key: String,
    pub stamp: String,
}

impl ArchiveRef {
    /// Extract the `YYYYMMDDHHMM` stamp from a `<name>-<stamp>.<ext>` key.
    pub fn parse(key: &str) -> Result<Self> {
        let basename = key.rsplit('/').next().unwrap_or(key);
        let stamp = basename
            .rsplit('-')
            .next()
            .and_then(|tail| tail.split('.').next())
            .filter(|s| s.len() == STAMP_LEN && s.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| {
                YabuError::Ordering(format!("cannot extract a timestamp from '{key}'"))
            })?;
        Ok(Self {
            key: key.to_string(),
            stamp: stamp.to_string(),
        })
    }
}

/// Verify the listing really is oldest-first. Listings of length 0 or 1 are a
/// new lineage and always pass.
pub fn check_ordering(listing: &[String]) -> Result<()> {
    if listing.len() <= 1 {
        return Ok(());
    }
    let oldest = ArchiveRef::parse(&listing[0])?;
    let newest = ArchiveRef::parse(&listing[listing.len() - 1])?;
    if oldest.stamp > newest.stamp {
        return Err(YabuError::Ordering(format!(
            "first entry '{}' ({}) is newer than last entry '{}' ({})",
            oldest.key, oldest.stamp, newest.key, newest.stamp
        )));
    }
    Ok(())
}

/// What the retention pass should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneDecision {
    /// Within budget, nothing to delete.
    None,
    /// Delete this single oldest archive.
    Delete(ArchiveRef),
}

/// At most one deletion per run: if the listing exceeds the ceiling, the
/// earliest entry goes. A lineage more than one over budget converges back
/// under the ceiling across subsequent runs.
pub fn prune_decision(listing: &[String], max_backups: u32) -> Result<PruneDecision> {
    if listing.len() <= 1 || listing.len() <= max_backups as usize {
        return Ok(PruneDecision::None);
    }
    Ok(PruneDecision::Delete(ArchiveRef::parse(&listing[0])?))
}
