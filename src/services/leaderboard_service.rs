use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, Document};
use mongodb::Database;

use crate::error::ApiError;
use crate::models::leaderboard::{
    assign_ranks, LeaderboardAggRow, LeaderboardEntry, LeaderboardPeriod,
};
use crate::utils::time::chrono_to_bson;

const LEADERBOARD_LIMIT: i32 = 200;

pub struct LeaderboardService {
    mongo: Database,
}

impl LeaderboardService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Aggregate the result ledger into a ranked standings list: group per
    /// student, sort by total score, cap at 200 rows, then join user identity.
    pub async fn standings(
        &self,
        period: LeaderboardPeriod,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let mut pipeline: Vec<Document> = Vec::new();

        if let Some(since) = period.window_start(Utc::now()) {
            pipeline.push(doc! {
                "$match": { "submittedAt": { "$gte": chrono_to_bson(since) } }
            });
        }

        pipeline.push(doc! {
            "$group": {
                "_id": "$studentId",
                "totalScore": { "$sum": "$score" },
                "examsCompleted": { "$sum": 1 },
                "avgPercentage": { "$avg": "$percentage" },
            }
        });
        pipeline.push(doc! { "$sort": { "totalScore": -1 } });
        pipeline.push(doc! { "$limit": LEADERBOARD_LIMIT });
        pipeline.push(doc! {
            "$lookup": {
                "from": "users",
                "localField": "_id",
                "foreignField": "_id",
                "as": "student",
            }
        });
        pipeline.push(doc! {
            "$unwind": { "path": "$student", "preserveNullAndEmptyArrays": true }
        });
        // Deleted accounts keep their rows; name falls back to email, and a
        // row with neither stays in the standings anonymously.
        pipeline.push(doc! {
            "$project": {
                "_id": 0,
                "studentId": "$_id",
                "totalScore": 1,
                "examsCompleted": 1,
                "avgPercentage": { "$round": ["$avgPercentage", 0] },
                "name": { "$ifNull": ["$student.name", "$student.email"] },
                "email": "$student.email",
            }
        });

        let rows: Vec<Document> = self
            .mongo
            .collection::<Document>("exam_results")
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let rows: Vec<LeaderboardAggRow> = rows
            .into_iter()
            .map(|d| from_document(d).map_err(anyhow::Error::new))
            .collect::<Result<_, _>>()?;

        Ok(assign_ranks(rows))
    }
}
