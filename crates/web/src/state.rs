use std::sync::Arc;

use storage::repository::AthleteStore;

#[derive(Clone)]
pub struct AppState {
    pub athletes: Arc<dyn AthleteStore>,
}

impl AppState {
    pub fn new(athletes: Arc<dyn AthleteStore>) -> Self {
        Self { athletes }
    }
}
