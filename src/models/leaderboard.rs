use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Aggregation window over the result ledger.
///
/// A missing `period` defaults to weekly; an explicit `all` (or any
/// unrecognized value) removes the time filter entirely. Those are two
/// deliberate code paths, kept distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Monthly,
    All,
}

impl LeaderboardPeriod {
    pub fn from_query(period: Option<&str>) -> Self {
        match period {
            None => LeaderboardPeriod::Weekly,
            Some("daily") => LeaderboardPeriod::Daily,
            Some("weekly") => LeaderboardPeriod::Weekly,
            Some("monthly") => LeaderboardPeriod::Monthly,
            Some(_) => LeaderboardPeriod::All,
        }
    }

    /// Start of the window, `None` for the unfiltered case. Daily is aligned
    /// to midnight of the previous day; weekly and monthly are rolling.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            LeaderboardPeriod::Daily => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc() - Duration::days(1)),
            LeaderboardPeriod::Weekly => Some(now - Duration::days(7)),
            LeaderboardPeriod::Monthly => Some(now - Duration::days(30)),
            LeaderboardPeriod::All => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub period: Option<String>,
}

/// Row coming out of the `$group`/`$lookup` pipeline.
#[derive(Debug, Deserialize)]
pub struct LeaderboardAggRow {
    #[serde(rename = "studentId")]
    pub student_id: ObjectId,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "examsCompleted")]
    pub exams_completed: i64,
    #[serde(rename = "avgPercentage", default)]
    pub avg_percentage: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    /// Dense rank 1..N in aggregation output order; equal scores still get
    /// distinct consecutive ranks.
    pub rank: usize,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "examsCompleted")]
    pub exams_completed: i64,
    #[serde(rename = "avgPercentage")]
    pub avg_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Attach ranks in output order (already sorted by total score descending).
pub fn assign_ranks(rows: Vec<LeaderboardAggRow>) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| LeaderboardEntry {
            rank: idx + 1,
            student_id: row.student_id.to_hex(),
            total_score: row.total_score,
            exams_completed: row.exams_completed,
            avg_percentage: row.avg_percentage,
            name: row.name,
            email: row.email,
        })
        .collect()
}
