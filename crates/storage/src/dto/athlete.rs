use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};
use serde_json::{Number, Value};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::models::Athlete;

/// Field order used when reporting errors.
pub const FIELD_ORDER: [&str; 5] = [
    "full_name",
    "birth_date",
    "phone_number",
    "ranking_points",
    "club",
];

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const DATE_FORMAT: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const NULL: &str = "This field may not be null.";
const NOT_TEXT: &str = "Not a valid string.";

/// Response containing a stored athlete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AthleteResponse {
    pub id: i64,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub phone_number: String,
    pub ranking_points: i32,
    pub club: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Athlete> for AthleteResponse {
    fn from(athlete: Athlete) -> Self {
        Self {
            id: athlete.id,
            full_name: athlete.full_name,
            birth_date: athlete.birth_date,
            phone_number: athlete.phone_number,
            ranking_points: athlete.ranking_points,
            club: athlete.club,
            created_at: athlete.created_at,
            updated_at: athlete.updated_at,
        }
    }
}

/// Candidate athlete fields, as sent in a create/update body or read from
/// an import row. Values are kept as raw JSON so that a wrong type becomes a
/// field error from `validate_*` instead of a body rejection.
///
/// Every field is `None` when the key is absent and `Some(Value::Null)` when
/// sent as `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AthletePayload {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Ma Long")]
    pub full_name: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "1998-05-21")]
    pub birth_date: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub phone_number: Option<Value>,

    /// Whole number, as a JSON number or a numeric string
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub ranking_points: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub club: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Why a value could not be read as ranking points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointsError {
    #[error("A valid integer is required.")]
    Invalid,

    #[error("Ensure this value is greater than or equal to {}.", i32::MIN)]
    TooSmall,

    #[error("Ensure this value is less than or equal to {}.", i32::MAX)]
    TooLarge,
}

/// Parses an optionally signed decimal integer. Integers outside the `i32`
/// range are out of range, not malformed.
pub fn parse_whole_number(raw: &str) -> Result<i32, PointsError> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PointsError::Invalid);
    }

    raw.parse::<i32>().map_err(|_| {
        if raw.starts_with('-') {
            PointsError::TooSmall
        } else {
            PointsError::TooLarge
        }
    })
}

fn points_from_number(number: &Number) -> Result<i32, PointsError> {
    if let Some(value) = number.as_i64() {
        return i32::try_from(value).map_err(|_| {
            if value < 0 {
                PointsError::TooSmall
            } else {
                PointsError::TooLarge
            }
        });
    }
    if number.is_u64() {
        return Err(PointsError::TooLarge);
    }

    match number.as_f64() {
        Some(value) if value.fract() == 0.0 => {
            if value < f64::from(i32::MIN) {
                Err(PointsError::TooSmall)
            } else if value > f64::from(i32::MAX) {
                Err(PointsError::TooLarge)
            } else {
                Ok(value as i32)
            }
        }
        _ => Err(PointsError::Invalid),
    }
}

/// A fully validated athlete ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAthlete {
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub phone_number: String,
    pub ranking_points: i32,
    pub club: Option<String>,
}

/// Validated changes to an existing athlete. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AthleteChanges {
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub ranking_points: Option<i32>,
    pub club: Option<Option<String>>,
}

impl AthleteChanges {
    pub fn apply(&self, athlete: &mut Athlete) {
        if let Some(full_name) = &self.full_name {
            athlete.full_name = full_name.clone();
        }
        if let Some(birth_date) = self.birth_date {
            athlete.birth_date = birth_date;
        }
        if let Some(phone_number) = &self.phone_number {
            athlete.phone_number = phone_number.clone();
        }
        if let Some(ranking_points) = self.ranking_points {
            athlete.ranking_points = ranking_points;
        }
        if let Some(club) = &self.club {
            athlete.club = club.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Validate)]
struct TextFields {
    #[validate(length(
        max = 100,
        message = "Ensure this field has no more than 100 characters."
    ))]
    full_name: Option<String>,

    #[validate(length(
        max = 20,
        message = "Ensure this field has no more than 20 characters."
    ))]
    phone_number: Option<String>,

    #[validate(length(
        max = 100,
        message = "Ensure this field has no more than 100 characters."
    ))]
    club: Option<String>,
}

impl AthletePayload {
    /// Validates a payload for creation. `ranking_points` defaults to 0 and
    /// `club` to absent.
    pub fn validate_new(&self) -> Result<NewAthlete, FieldErrors> {
        let changes = self.check(Presence::Required)?;

        let (Some(full_name), Some(birth_date), Some(phone_number)) =
            (changes.full_name, changes.birth_date, changes.phone_number)
        else {
            let mut errors = FieldErrors::default();
            errors.add("full_name", REQUIRED);
            return Err(errors);
        };

        Ok(NewAthlete {
            full_name,
            birth_date,
            phone_number,
            ranking_points: changes.ranking_points.unwrap_or(0),
            club: changes.club.flatten(),
        })
    }

    /// Validates a full replacement: required fields must be present,
    /// omitted optional fields keep their stored values.
    pub fn validate_replace(&self) -> Result<AthleteChanges, FieldErrors> {
        self.check(Presence::Required)
    }

    /// Validates a partial update: only supplied fields are checked.
    pub fn validate_patch(&self) -> Result<AthleteChanges, FieldErrors> {
        self.check(Presence::Optional)
    }

    fn check(&self, presence: Presence) -> Result<AthleteChanges, FieldErrors> {
        let mut errors = FieldErrors::default();

        let full_name = read_text(&mut errors, "full_name", &self.full_name);
        let birth_date = read_date(&mut errors, &self.birth_date);
        let phone_number = read_text(&mut errors, "phone_number", &self.phone_number);
        let ranking_points = read_points(&mut errors, &self.ranking_points);
        let club = match read_text(&mut errors, "club", &self.club) {
            Field::Absent | Field::Invalid => None,
            Field::Null => Some(None),
            Field::Given(club) => Some((!club.is_empty()).then_some(club)),
        };

        let full_name = require(&mut errors, "full_name", full_name, presence);
        let birth_date = require(&mut errors, "birth_date", birth_date, presence);
        let phone_number = require(&mut errors, "phone_number", phone_number, presence);
        let ranking_points = match ranking_points {
            Field::Null => {
                errors.add("ranking_points", NULL);
                None
            }
            field => field.given(),
        };

        for (field, value) in [("full_name", &full_name), ("phone_number", &phone_number)] {
            if value.as_deref() == Some("") {
                errors.add(field, BLANK);
            }
        }

        let text = TextFields {
            full_name: full_name.clone(),
            phone_number: phone_number.clone(),
            club: club.clone().flatten(),
        };
        if let Err(e) = text.validate() {
            errors.merge(e);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AthleteChanges {
            full_name,
            birth_date,
            phone_number,
            ranking_points,
            club,
        })
    }
}

/// A payload value after type checking. `Invalid` means an error has
/// already been recorded for the field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field<T> {
    Absent,
    Null,
    Invalid,
    Given(T),
}

impl<T> Field<T> {
    fn given(self) -> Option<T> {
        match self {
            Self::Given(value) => Some(value),
            _ => None,
        }
    }
}

/// Strings are trimmed and numbers taken as their decimal text.
fn read_text(errors: &mut FieldErrors, field: &str, value: &Option<Value>) -> Field<String> {
    match value {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(text)) => Field::Given(text.trim().to_string()),
        Some(Value::Number(number)) => Field::Given(number.to_string()),
        Some(_) => {
            errors.add(field, NOT_TEXT);
            Field::Invalid
        }
    }
}

fn read_date(errors: &mut FieldErrors, value: &Option<Value>) -> Field<NaiveDate> {
    match value {
        None => Field::Absent,
        Some(Value::Null) => Field::Null,
        Some(Value::String(raw)) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Field::Given(date),
            Err(_) => {
                errors.add("birth_date", DATE_FORMAT);
                Field::Invalid
            }
        },
        Some(_) => {
            errors.add("birth_date", DATE_FORMAT);
            Field::Invalid
        }
    }
}

fn read_points(errors: &mut FieldErrors, value: &Option<Value>) -> Field<i32> {
    let parsed = match value {
        None => return Field::Absent,
        Some(Value::Null) => return Field::Null,
        Some(Value::String(raw)) => parse_whole_number(raw),
        Some(Value::Number(number)) => points_from_number(number),
        Some(_) => Err(PointsError::Invalid),
    };

    match parsed {
        Ok(points) => Field::Given(points),
        Err(e) => {
            errors.add("ranking_points", e.to_string());
            Field::Invalid
        }
    }
}

fn require<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Field<T>,
    presence: Presence,
) -> Option<T> {
    match value {
        Field::Given(value) => Some(value),
        Field::Null => {
            errors.add(field, NULL);
            None
        }
        Field::Absent if presence == Presence::Required => {
            errors.add(field, REQUIRED);
            None
        }
        Field::Absent | Field::Invalid => None,
    }
}

/// Per-field validation messages, kept in declaration order of the athlete fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => {
                self.fields.push((field.to_string(), vec![message]));
                self.fields.sort_by_key(|(name, _)| field_rank(name));
            }
        }
    }

    pub fn merge(&mut self, errors: ValidationErrors) {
        for (field, errors) in errors.field_errors() {
            for e in errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                self.add(&field.to_string(), message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// `field: message` for the first message of every field, comma separated.
    pub fn summary(&self) -> String {
        self.iter()
            .filter_map(|(field, messages)| {
                messages.first().map(|message| format!("{}: {}", field, message))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|known| *known == field)
        .unwrap_or(FIELD_ORDER.len())
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for FieldErrors {}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}
