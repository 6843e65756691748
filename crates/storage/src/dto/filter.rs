use std::cmp::Ordering;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::Athlete;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    FullName,
    RankingPoints,
    CreatedAt,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "full_name" => Some(Self::FullName),
            "ranking_points" => Some(Self::RankingPoints),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn as_column(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::RankingPoints => "ranking_points",
            Self::CreatedAt => "created_at",
        }
    }

    fn compare(&self, a: &Athlete, b: &Athlete) -> Ordering {
        match self {
            Self::FullName => a.full_name.cmp(&b.full_name),
            Self::RankingPoints => a.ranking_points.cmp(&b.ranking_points),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.descending { "DESC" } else { "ASC" }
    }
}

/// `-ranking_points, full_name`
pub const DEFAULT_ORDERING: [SortKey; 2] = [
    SortKey::desc(SortField::RankingPoints),
    SortKey::asc(SortField::FullName),
];

/// Compares two athletes by `keys`, falling back to `id` so the order is total.
pub fn compare_athletes(keys: &[SortKey], a: &Athlete, b: &Athlete) -> Ordering {
    keys.iter()
        .map(|key| {
            let ordering = key.field.compare(a, b);
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

/// Raw listing parameters as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AthleteQuery {
    /// Exact club match
    pub club: Option<String>,
    /// Exact ranking points match
    pub ranking_points: Option<String>,
    /// Case-insensitive terms matched against full name, phone number and club
    pub search: Option<String>,
    /// Comma separated fields, `-` prefix for descending
    /// (`full_name`, `ranking_points`, `created_at`)
    pub ordering: Option<String>,
}

impl AthleteQuery {
    pub fn into_filter(self) -> Result<AthleteFilter, String> {
        let ranking_points = match self.ranking_points.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| "ranking_points: Enter a whole number.".to_string())?,
            ),
        };

        Ok(AthleteFilter {
            club: self.club.filter(|club| !club.is_empty()),
            ranking_points,
            search_terms: self
                .search
                .as_deref()
                .map(split_search_terms)
                .unwrap_or_default(),
            ordering: self
                .ordering
                .as_deref()
                .map(parse_ordering)
                .unwrap_or_else(|| DEFAULT_ORDERING.to_vec()),
        })
    }
}

/// Resolved filter, search and ordering for a listing or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthleteFilter {
    pub club: Option<String>,
    pub ranking_points: Option<i32>,
    /// Every term must match at least one searchable field.
    pub search_terms: Vec<String>,
    pub ordering: Vec<SortKey>,
}

impl Default for AthleteFilter {
    fn default() -> Self {
        Self {
            club: None,
            ranking_points: None,
            search_terms: Vec::new(),
            ordering: DEFAULT_ORDERING.to_vec(),
        }
    }
}

impl AthleteFilter {
    pub fn matches(&self, athlete: &Athlete) -> bool {
        if let Some(club) = &self.club
            && athlete.club.as_ref() != Some(club)
        {
            return false;
        }

        if let Some(points) = self.ranking_points
            && athlete.ranking_points != points
        {
            return false;
        }

        self.search_terms.iter().all(|term| {
            let term = term.to_lowercase();
            [
                Some(athlete.full_name.as_str()),
                Some(athlete.phone_number.as_str()),
                athlete.club.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
        })
    }
}

fn split_search_terms(search: &str) -> Vec<String> {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(String::from)
        .collect()
}

/// Unknown fields are dropped; if nothing valid remains the default ordering applies.
fn parse_ordering(ordering: &str) -> Vec<SortKey> {
    let keys: Vec<SortKey> = ordering
        .split(',')
        .map(str::trim)
        .filter_map(|term| match term.strip_prefix('-') {
            Some(name) => SortField::parse(name).map(SortKey::desc),
            None => SortField::parse(term).map(SortKey::asc),
        })
        .collect();

    if keys.is_empty() {
        DEFAULT_ORDERING.to_vec()
    } else {
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn athlete(id: i64, name: &str, points: i32, club: Option<&str>) -> Athlete {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Athlete {
            id,
            full_name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            phone_number: format!("555-{:04}", id),
            ranking_points: points,
            club: club.map(String::from),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_default_ordering_points_then_name() {
        let mut athletes = vec![
            athlete(1, "Zed", 10, None),
            athlete(2, "Bea", 30, None),
            athlete(3, "Abe", 30, None),
        ];

        athletes.sort_by(|a, b| compare_athletes(&DEFAULT_ORDERING, a, b));

        let names: Vec<&str> = athletes.iter().map(|a| a.full_name.as_str()).collect();
        assert_eq!(names, vec!["Abe", "Bea", "Zed"]);
    }

    #[test]
    fn test_parse_ordering_drops_unknown_fields() {
        assert_eq!(
            parse_ordering("-created_at,phone_number, full_name"),
            vec![
                SortKey::desc(SortField::CreatedAt),
                SortKey::asc(SortField::FullName)
            ]
        );
        assert_eq!(parse_ordering("id,-club"), DEFAULT_ORDERING.to_vec());
    }

    #[test]
    fn test_into_filter_rejects_non_numeric_points() {
        let query = AthleteQuery {
            ranking_points: Some("lots".to_string()),
            ..Default::default()
        };

        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_into_filter_ignores_empty_values() {
        let query = AthleteQuery {
            club: Some(String::new()),
            ranking_points: Some(String::new()),
            search: Some(" , ".to_string()),
            ordering: None,
        };

        assert_eq!(query.into_filter().unwrap(), AthleteFilter::default());
    }

    #[test]
    fn test_search_terms_must_all_match() {
        let filter = AthleteFilter {
            search_terms: split_search_terms("lyon ma"),
            ..Default::default()
        };

        assert!(filter.matches(&athlete(1, "Ma Long", 0, Some("Lyon TT"))));
        assert!(!filter.matches(&athlete(2, "Ma Lin", 0, Some("Paris TT"))));
    }

    #[test]
    fn test_search_is_case_insensitive_and_covers_phone() {
        let filter = AthleteFilter {
            search_terms: vec!["555-0007".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&athlete(7, "Anyone", 0, None)));

        let filter = AthleteFilter {
            search_terms: vec!["BOLL".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&athlete(1, "Timo Boll", 0, None)));
    }

    #[test]
    fn test_club_and_points_filters_are_exact() {
        let filter = AthleteFilter {
            club: Some("Lyon".to_string()),
            ranking_points: Some(30),
            ..Default::default()
        };

        assert!(filter.matches(&athlete(1, "A", 30, Some("Lyon"))));
        assert!(!filter.matches(&athlete(2, "B", 30, Some("Lyon TT"))));
        assert!(!filter.matches(&athlete(3, "C", 31, Some("Lyon"))));
        assert!(!filter.matches(&athlete(4, "D", 30, None)));
    }
}
