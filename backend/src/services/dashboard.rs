//! Dashboard service: one prediction snapshot per server process
//!
//! Wraps [`DashboardSession`] for concurrent handlers. The lock is taken for
//! `begin` and `complete` only; the upstream call runs in between without it.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    rank_by, top_cleanest, top_polluted, validate_form, CityStatistics, DashboardError,
    DashboardSession, DashboardView, DistrictCard, DistrictId, GeoJsonCollection, PredictionForm,
    PredictionInfo, PredictionRequest, PredictionResult, RankKey, RankedDistrict, SortOrder,
    ValidationResult, TOP_N,
};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::external::PredictionClient;

/// Source of the city's wall-clock time
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// System clock shifted by a fixed UTC offset
    System { utc_offset_hours: i32 },
    /// Frozen time (for testing)
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System { utc_offset_hours } => {
                Utc::now().naive_utc() + Duration::hours(*utc_offset_hours as i64)
            }
            Clock::Fixed(now) => *now,
        }
    }
}

/// What `GET /dashboard` shows
#[derive(Debug, Serialize)]
pub struct DashboardState {
    pub loading: bool,
    pub last_error: Option<DashboardError>,
    pub view: Option<DashboardView>,
}

/// Ranked district list for the current snapshot
#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub prediction_info: PredictionInfo,
    pub sort_by: RankKey,
    pub order: SortOrder,
    pub limit: usize,
    pub total_districts: usize,
    pub ranking: Vec<RankedDistrict>,
    /// Cleanest districts by PM2.5, whatever `sort_by` is
    pub best_air_quality: Vec<RankedDistrict>,
    pub worst_air_quality: Vec<RankedDistrict>,
    pub statistics: CityStatistics,
}

/// A selection to validate: the dashboard form or structured integer fields
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValidationInput {
    Request(PredictionRequest),
    Form(PredictionForm),
}

#[derive(Clone)]
pub struct DashboardService {
    session: Arc<Mutex<DashboardSession>>,
    client: PredictionClient,
    clock: Clock,
}

impl DashboardService {
    pub fn new(client: PredictionClient, clock: Clock) -> Self {
        Self {
            session: Arc::new(Mutex::new(DashboardSession::new())),
            client,
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn client(&self) -> &PredictionClient {
        &self.client
    }

    /// Check a selection without touching the session or the prediction service
    pub fn validate(&self, input: &ValidationInput) -> ValidationResult {
        match input {
            ValidationInput::Request(request) => request.validate_at(self.now()),
            ValidationInput::Form(form) => validate_form(form, self.now()),
        }
    }

    /// Validate, predict, and replace the snapshot
    pub async fn submit(&self, form: PredictionForm) -> AppResult<DashboardView> {
        let now = self.now();
        let request = {
            let mut session = self.session.lock().await;
            session.begin(&form, now)?
        };

        tracing::info!(
            "Prediction submitted for {:04}-{:02}-{:02} {:02}:{:02}",
            request.year,
            request.month,
            request.day,
            request.hour,
            request.minute
        );

        // Completion must run even if the caller goes away, or loading sticks.
        let client = self.client.clone();
        let session = Arc::clone(&self.session);
        let task = tokio::spawn(async move {
            let outcome = client.predict_all(&request).await;
            if let Ok(result) = &outcome {
                log_contract_violations(result);
            }
            let mut session = session.lock().await;
            session.complete(outcome)
        });

        let snapshot = task
            .await
            .map_err(|e| AppError::Internal(format!("prediction task failed: {}", e)))??;

        Ok(DashboardView::build(&snapshot))
    }

    pub async fn state(&self) -> DashboardState {
        let session = self.session.lock().await;
        DashboardState {
            loading: session.is_loading(),
            last_error: session.last_error().cloned(),
            view: session.current().map(|snapshot| DashboardView::build(&snapshot)),
        }
    }

    async fn snapshot(&self) -> AppResult<Arc<PredictionResult>> {
        self.session
            .lock()
            .await
            .current()
            .ok_or(AppError::NoPredictionData)
    }

    pub async fn ranking(
        &self,
        sort_by: RankKey,
        order: SortOrder,
        limit: usize,
    ) -> AppResult<RankingResponse> {
        let snapshot = self.snapshot().await?;
        let districts = &snapshot.districts;

        Ok(RankingResponse {
            prediction_info: snapshot.prediction_info.clone(),
            sort_by,
            order,
            limit,
            total_districts: districts.len(),
            ranking: RankedDistrict::list(&rank_by(districts, sort_by, order, limit)),
            best_air_quality: RankedDistrict::list(&top_cleanest(districts, TOP_N)),
            worst_air_quality: RankedDistrict::list(&top_polluted(districts, TOP_N)),
            statistics: snapshot.statistics.clone(),
        })
    }

    /// Card for one district of the current snapshot
    pub async fn district(&self, id: &str) -> AppResult<DistrictCard> {
        let snapshot = self.snapshot().await?;

        let numeric = id.parse::<u64>().ok().map(DistrictId::Number);
        numeric
            .and_then(|key| snapshot.district(&key))
            .or_else(|| snapshot.district(&DistrictId::from(id)))
            .map(DistrictCard::from_district)
            .ok_or_else(|| AppError::DistrictNotFound(id.to_string()))
    }

    pub async fn geojson(&self) -> AppResult<GeoJsonCollection> {
        let snapshot = self.snapshot().await?;
        Ok(GeoJsonCollection::build(&snapshot))
    }

    pub async fn clear(&self) {
        self.session.lock().await.clear();
        tracing::debug!("Dashboard state cleared");
    }
}

fn log_contract_violations(result: &PredictionResult) {
    for violation in result.check_contract() {
        tracing::warn!("Prediction result contract violation: {}", violation);
    }
}
