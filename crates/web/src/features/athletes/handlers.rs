use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use importer::{CsvUpload, ImportSummary, export_filename};
use storage::dto::{
    athlete::{AthletePayload, AthleteResponse},
    filter::AthleteQuery,
};
use utoipa::ToSchema;

use crate::error::WebError;
use crate::state::AppState;

use super::{RESOURCE, services};

/// Multipart form accepted by the import endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImportUpload {
    /// UTF-8 CSV with a `full_name,birth_date,phone_number,ranking_points,club` header
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    get,
    path = "/api/athletes",
    params(AthleteQuery),
    responses(
        (status = 200, description = "List athletes successfully", body = Vec<AthleteResponse>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "athletes"
)]
pub async fn list_athletes(
    State(state): State<AppState>,
    Query(query): Query<AthleteQuery>,
) -> Result<Response, WebError> {
    let filter = query.into_filter().map_err(WebError::BadRequest)?;

    let athletes = services::list_athletes(state.athletes.as_ref(), &filter).await?;

    let response: Vec<AthleteResponse> = athletes.into_iter().map(AthleteResponse::from).collect();

    Ok(Json(response).into_response())
}

/// Bodies that are not a JSON object are rejected as a whole; wrong field
/// types are left to the validator.
fn json_body(
    payload: Result<Json<AthletePayload>, JsonRejection>,
) -> Result<AthletePayload, WebError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| WebError::BadRequest(rejection.body_text()))
}

#[utoipa::path(
    get,
    path = "/api/athletes/{id}",
    params(
        ("id" = i64, Path, description = "Athlete id")
    ),
    responses(
        (status = 200, description = "Athlete found", body = AthleteResponse),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn get_athlete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let athlete = services::get_athlete(state.athletes.as_ref(), id).await?;

    Ok(Json(AthleteResponse::from(athlete)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/athletes",
    request_body = AthletePayload,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Athlete created successfully", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "athletes"
)]
pub async fn create_athlete(
    State(state): State<AppState>,
    payload: Result<Json<AthletePayload>, JsonRejection>,
) -> Result<Response, WebError> {
    let athlete = json_body(payload)?.validate_new()?;

    let created = services::create_athlete(state.athletes.as_ref(), &athlete).await?;

    Ok((StatusCode::CREATED, Json(AthleteResponse::from(created))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/athletes/{id}",
    params(
        ("id" = i64, Path, description = "Athlete id")
    ),
    request_body = AthletePayload,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Athlete updated successfully", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn update_athlete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AthletePayload>, JsonRejection>,
) -> Result<Response, WebError> {
    let changes = json_body(payload)?.validate_replace()?;

    let updated = services::update_athlete(state.athletes.as_ref(), id, &changes).await?;

    Ok(Json(AthleteResponse::from(updated)).into_response())
}

#[utoipa::path(
    patch,
    path = "/api/athletes/{id}",
    params(
        ("id" = i64, Path, description = "Athlete id")
    ),
    request_body = AthletePayload,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Athlete updated successfully", body = AthleteResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn partial_update_athlete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AthletePayload>, JsonRejection>,
) -> Result<Response, WebError> {
    let changes = json_body(payload)?.validate_patch()?;

    let updated = services::update_athlete(state.athletes.as_ref(), id, &changes).await?;

    Ok(Json(AthleteResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/athletes/{id}",
    params(
        ("id" = i64, Path, description = "Athlete id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Athlete deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Athlete not found")
    ),
    tag = "athletes"
)]
pub async fn delete_athlete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    services::delete_athlete(state.athletes.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/athletes/import_csv",
    request_body(content = ImportUpload, content_type = "multipart/form-data"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "File processed; per-row failures are listed in the summary", body = ImportSummary),
        (status = 400, description = "Missing file, wrong extension or undecodable content"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "athletes"
)]
pub async fn import_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, WebError> {
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            tracing::debug!("Import request without multipart body: {}", rejection);
            None
        }
    };

    let summary = services::import_athletes(state.athletes.as_ref(), upload).await?;

    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

/// Returns the first file part named `file`. Plain form fields with that
/// name do not count as an upload.
async fn read_upload(mut multipart: Multipart) -> Result<Option<CsvUpload>, WebError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Error processing CSV: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };

        let content = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(format!("Error processing CSV: {}", e)))?;

        return Ok(Some(CsvUpload::new(filename, content.to_vec())));
    }

    Ok(None)
}

#[utoipa::path(
    get,
    path = "/api/athletes/export_csv",
    params(AthleteQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "CSV attachment; empty when nothing matches", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "athletes"
)]
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<AthleteQuery>,
) -> Result<Response, WebError> {
    let filter = query.into_filter().map_err(WebError::BadRequest)?;

    let export = services::export_athletes(state.athletes.as_ref(), &filter).await?;
    let body = Body::from_stream(futures::stream::iter(export));

    let disposition = format!("attachment; filename=\"{}\"", export_filename(RESOURCE));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
