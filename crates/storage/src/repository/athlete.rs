use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::AthleteStore;
use crate::dto::athlete::{AthleteChanges, NewAthlete};
use crate::dto::filter::AthleteFilter;
use crate::error::{Result, StorageError};
use crate::models::Athlete;

/// Postgres-backed athlete store.
#[derive(Clone)]
pub struct AthleteRepository {
    pool: PgPool,
}

impl AthleteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AthleteStore for AthleteRepository {
    async fn create(&self, athlete: &NewAthlete) -> Result<Athlete> {
        let created = sqlx::query_as::<_, Athlete>(
            r#"
            INSERT INTO athletes (full_name, birth_date, phone_number, ranking_points, club)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, birth_date, phone_number, ranking_points, club,
                      created_at, updated_at
            "#,
        )
        .bind(&athlete.full_name)
        .bind(athlete.birth_date)
        .bind(&athlete.phone_number)
        .bind(athlete.ranking_points)
        .bind(&athlete.club)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from_write)?;

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Athlete> {
        let athlete = sqlx::query_as::<_, Athlete>(
            r#"
            SELECT id, full_name, birth_date, phone_number, ranking_points, club,
                   created_at, updated_at
            FROM athletes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(athlete)
    }

    async fn list(&self, filter: &AthleteFilter) -> Result<Vec<Athlete>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, full_name, birth_date, phone_number, ranking_points, club,
                   created_at, updated_at
            FROM athletes
            WHERE 1=1
            "#,
        );

        if let Some(ref club) = filter.club {
            query.push(" AND club = ");
            query.push_bind(club.clone());
        }

        if let Some(points) = filter.ranking_points {
            query.push(" AND ranking_points = ");
            query.push_bind(points);
        }

        for term in &filter.search_terms {
            let pattern = format!("%{}%", escape_like(term));
            query.push(" AND (full_name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR phone_number ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR club ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        query.push(" ORDER BY ");
        for key in &filter.ordering {
            query.push(key.field.as_column());
            query.push(" ");
            query.push(key.direction());
            query.push(", ");
        }
        query.push("id ASC");

        let athletes = query
            .build_query_as::<Athlete>()
            .fetch_all(&self.pool)
            .await?;

        Ok(athletes)
    }

    async fn update(&self, id: i64, changes: &AthleteChanges) -> Result<Athlete> {
        let (set_club, club) = club_assignment(changes);

        // Single statement so concurrent partial updates never overwrite
        // each other's fields.
        let updated = sqlx::query_as::<_, Athlete>(
            r#"
            UPDATE athletes
            SET full_name = COALESCE($2, full_name),
                birth_date = COALESCE($3, birth_date),
                phone_number = COALESCE($4, phone_number),
                ranking_points = COALESCE($5, ranking_points),
                club = CASE WHEN $6 THEN $7 ELSE club END,
                updated_at = GREATEST(now(), created_at)
            WHERE id = $1
            RETURNING id, full_name, birth_date, phone_number, ranking_points, club,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.full_name.as_deref())
        .bind(changes.birth_date)
        .bind(changes.phone_number.as_deref())
        .bind(changes.ranking_points)
        .bind(set_club)
        .bind(club)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_write)?
        .ok_or(StorageError::NotFound)?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM athletes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

/// `club` is the only nullable column, so clearing it needs an explicit flag
/// next to the new value.
fn club_assignment(changes: &AthleteChanges) -> (bool, Option<&str>) {
    match &changes.club {
        Some(club) => (true, club.as_deref()),
        None => (false, None),
    }
}

/// Escapes `ILIKE` wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
