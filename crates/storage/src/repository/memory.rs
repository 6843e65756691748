use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::AthleteStore;
use crate::dto::athlete::{AthleteChanges, NewAthlete};
use crate::dto::filter::{AthleteFilter, compare_athletes};
use crate::error::{Result, StorageError};
use crate::models::Athlete;

#[derive(Default)]
struct Inner {
    last_id: i64,
    athletes: BTreeMap<i64, Athlete>,
}

/// Process-local athlete store. Used by the test suite and for running the
/// API without a database.
#[derive(Default)]
pub struct InMemoryAthleteRepository {
    inner: RwLock<Inner>,
}

impl InMemoryAthleteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.athletes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AthleteStore for InMemoryAthleteRepository {
    async fn create(&self, athlete: &NewAthlete) -> Result<Athlete> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let now = Utc::now();
        let created = Athlete {
            id: inner.last_id,
            full_name: athlete.full_name.clone(),
            birth_date: athlete.birth_date,
            phone_number: athlete.phone_number.clone(),
            ranking_points: athlete.ranking_points,
            club: athlete.club.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.athletes.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Athlete> {
        self.inner
            .read()
            .await
            .athletes
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list(&self, filter: &AthleteFilter) -> Result<Vec<Athlete>> {
        let inner = self.inner.read().await;
        let mut athletes: Vec<Athlete> = inner
            .athletes
            .values()
            .filter(|athlete| filter.matches(athlete))
            .cloned()
            .collect();

        athletes.sort_by(|a, b| compare_athletes(&filter.ordering, a, b));

        Ok(athletes)
    }

    async fn update(&self, id: i64, changes: &AthleteChanges) -> Result<Athlete> {
        let mut inner = self.inner.write().await;
        let athlete = inner.athletes.get_mut(&id).ok_or(StorageError::NotFound)?;

        changes.apply(athlete);
        athlete.updated_at = Utc::now().max(athlete.created_at);

        Ok(athlete.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.inner
            .write()
            .await
            .athletes
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::filter::{SortField, SortKey};
    use chrono::NaiveDate;

    fn new_athlete(name: &str, points: i32, club: Option<&str>) -> NewAthlete {
        NewAthlete {
            full_name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(1995, 6, 15).unwrap(),
            phone_number: "555-0100".to_string(),
            ranking_points: points,
            club: club.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_timestamps() {
        let repo = InMemoryAthleteRepository::new();

        let first = repo.create(&new_athlete("A", 1, None)).await.unwrap();
        let second = repo.create(&new_athlete("B", 2, None)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(repo.get(2).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let repo = InMemoryAthleteRepository::new();
        let created = repo.create(&new_athlete("A", 1, Some("Club"))).await.unwrap();

        let changes = AthleteChanges {
            ranking_points: Some(50),
            club: Some(None),
            ..Default::default()
        };
        let updated = repo.update(created.id, &changes).await.unwrap();

        assert_eq!(updated.ranking_points, 50);
        assert_eq!(updated.club, None);
        assert_eq!(updated.full_name, "A");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_concurrent_partial_updates_keep_both_fields() {
        let repo = std::sync::Arc::new(InMemoryAthleteRepository::new());
        let created = repo.create(&new_athlete("A", 1, Some("Club"))).await.unwrap();

        let points = AthleteChanges {
            ranking_points: Some(900),
            ..Default::default()
        };
        let name = AthleteChanges {
            full_name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let (first, second) = tokio::join!(
            repo.update(created.id, &points),
            repo.update(created.id, &name)
        );
        first.unwrap();
        second.unwrap();

        let stored = repo.get(created.id).await.unwrap();
        assert_eq!(stored.ranking_points, 900);
        assert_eq!(stored.full_name, "Renamed");
        assert_eq!(stored.club.as_deref(), Some("Club"));
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let repo = InMemoryAthleteRepository::new();

        assert!(matches!(repo.get(9).await, Err(StorageError::NotFound)));
        assert!(matches!(repo.delete(9).await, Err(StorageError::NotFound)));
        assert!(matches!(
            repo.update(9, &AthleteChanges::default()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let repo = InMemoryAthleteRepository::new();
        repo.create(&new_athlete("Carl", 10, Some("Lyon"))).await.unwrap();
        repo.create(&new_athlete("Bob", 30, Some("Lyon"))).await.unwrap();
        repo.create(&new_athlete("Ann", 30, None)).await.unwrap();

        let all = repo.list(&AthleteFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Bob", "Carl"]);

        let filter = AthleteFilter {
            club: Some("Lyon".to_string()),
            ordering: vec![SortKey::asc(SortField::RankingPoints)],
            ..Default::default()
        };
        let lyon = repo.list(&filter).await.unwrap();
        let names: Vec<&str> = lyon.iter().map(|a| a.full_name.as_str()).collect();
        assert_eq!(names, vec!["Carl", "Bob"]);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let repo = InMemoryAthleteRepository::new();
        let created = repo.create(&new_athlete("A", 1, None)).await.unwrap();

        repo.delete(created.id).await.unwrap();

        assert!(repo.is_empty().await);
    }
}
