use async_trait::async_trait;

use crate::dto::athlete::{AthleteChanges, NewAthlete};
use crate::dto::filter::AthleteFilter;
use crate::error::Result;
use crate::models::Athlete;

pub mod athlete;
pub mod memory;

pub use athlete::AthleteRepository;
pub use memory::InMemoryAthleteRepository;

/// Persistence boundary for athlete records.
///
/// Every call is an independent atomic operation; callers never hold a
/// transaction across calls.
#[async_trait]
pub trait AthleteStore: Send + Sync {
    async fn create(&self, athlete: &NewAthlete) -> Result<Athlete>;

    /// Returns `StorageError::NotFound` when no athlete has this id.
    async fn get(&self, id: i64) -> Result<Athlete>;

    /// Athletes matching `filter`, in `filter.ordering` with `id` as final tiebreak.
    async fn list(&self, filter: &AthleteFilter) -> Result<Vec<Athlete>>;

    /// Applies `changes` and refreshes `updated_at`.
    async fn update(&self, id: i64, changes: &AthleteChanges) -> Result<Athlete>;

    async fn delete(&self, id: i64) -> Result<()>;
}
