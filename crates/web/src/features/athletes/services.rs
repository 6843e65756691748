use importer::{CsvExport, CsvImporter, CsvUpload, ImportSummary};
use storage::{
    dto::{
        athlete::{AthleteChanges, NewAthlete},
        filter::AthleteFilter,
    },
    error::Result,
    models::Athlete,
    repository::AthleteStore,
};

/// List athletes matching the filter, in the requested order
pub async fn list_athletes(store: &dyn AthleteStore, filter: &AthleteFilter) -> Result<Vec<Athlete>> {
    store.list(filter).await
}

/// Get athlete by id
pub async fn get_athlete(store: &dyn AthleteStore, id: i64) -> Result<Athlete> {
    store.get(id).await
}

/// Create a new athlete
pub async fn create_athlete(store: &dyn AthleteStore, athlete: &NewAthlete) -> Result<Athlete> {
    let created = store.create(athlete).await?;
    tracing::info!("Created athlete {} ({})", created.id, created.full_name);
    Ok(created)
}

/// Update an athlete, fully or partially
pub async fn update_athlete(
    store: &dyn AthleteStore,
    id: i64,
    changes: &AthleteChanges,
) -> Result<Athlete> {
    store.update(id, changes).await
}

/// Delete an athlete
pub async fn delete_athlete(store: &dyn AthleteStore, id: i64) -> Result<()> {
    store.delete(id).await?;
    tracing::info!("Deleted athlete {}", id);
    Ok(())
}

/// Import athletes from an uploaded CSV file
pub async fn import_athletes(
    store: &dyn AthleteStore,
    upload: Option<CsvUpload>,
) -> importer::Result<ImportSummary> {
    CsvImporter::new(store).import(upload).await
}

/// Fetch the athletes to export and wrap them in a chunked CSV encoder
pub async fn export_athletes(
    store: &dyn AthleteStore,
    filter: &AthleteFilter,
) -> Result<CsvExport<std::vec::IntoIter<Athlete>>> {
    let athletes = store.list(filter).await?;
    tracing::info!("Exporting {} athletes", athletes.len());
    Ok(CsvExport::new(athletes))
}
