//! Persistent storage for cached market distributions.

use crate::domain::error::RsRankError;
use crate::domain::score_cache::CacheSnapshot;

pub trait CachePort: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<CacheSnapshot>, RsRankError>;

    fn write(&self, snapshot: &CacheSnapshot) -> Result<(), RsRankError>;

    fn clear(&self) -> Result<(), RsRankError>;
}
