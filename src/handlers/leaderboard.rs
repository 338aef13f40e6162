use axum::extract::{Query, State};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiSuccess},
    models::leaderboard::{LeaderboardEntry, LeaderboardPeriod, LeaderboardQuery},
    services::{leaderboard_service::LeaderboardService, AppState},
};

/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<ApiSuccess<Vec<LeaderboardEntry>>, ApiError> {
    let period = LeaderboardPeriod::from_query(query.period.as_deref());
    let service = LeaderboardService::new(state.mongo.clone());
    let entries = service.standings(period).await?;
    let count = entries.len();
    Ok(ApiSuccess::ok(entries).with_count(count))
}
