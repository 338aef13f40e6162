use crate::config::Config;
use mongodb::{bson::doc, options::IndexOptions, Client as MongoClient, Database, IndexModel};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        // The (examId, studentId) unique index is what makes result
        // submission an atomic upsert rather than a read-then-write.
        let results = mongo.collection::<mongodb::bson::Document>("exam_results");
        results
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "examId": 1, "studentId": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        let users = mongo.collection::<mongodb::bson::Document>("users");
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        let classes = mongo.collection::<mongodb::bson::Document>("classes");
        classes
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        let exam_types = mongo.collection::<mongodb::bson::Document>("exam_types");
        exam_types
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "examCategory": 1, "examName": 1, "year": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        tracing::info!("MongoDB indexes ensured");

        Ok(Self { config, mongo })
    }
}

pub mod auth_service;
pub mod content_service;
pub mod exam_service;
pub mod exam_status;
pub mod leaderboard_service;
pub mod question_service;
pub mod result_service;
pub mod user_service;
