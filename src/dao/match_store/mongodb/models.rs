use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{MatchBackupEntity, SetArchiveEntity, SetListItemEntity};
use crate::state::{
    match_state::MatchState,
    roster::{PerSide, Side},
};

/// The backup collection holds at most one document, under this key.
pub const BACKUP_DOC_ID: &str = "current";

/// Stored form of the live-match backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBackupDocument {
    #[serde(rename = "_id")]
    id: String,
    saved_at: DateTime,
    state: MatchState,
}

impl From<MatchBackupEntity> for MongoBackupDocument {
    fn from(value: MatchBackupEntity) -> Self {
        Self {
            id: BACKUP_DOC_ID.to_owned(),
            saved_at: DateTime::from_system_time(value.saved_at),
            state: value.state,
        }
    }
}

impl From<MongoBackupDocument> for MatchBackupEntity {
    fn from(value: MongoBackupDocument) -> Self {
        Self {
            saved_at: value.saved_at.to_system_time(),
            state: value.state,
        }
    }
}

/// Stored form of an archived set, frozen state included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSetDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    set_number: u8,
    home_name: String,
    away_name: String,
    score: PerSide<u16>,
    winner: Side,
    completed_at: DateTime,
    state: MatchState,
}

impl From<SetArchiveEntity> for MongoSetDocument {
    fn from(value: SetArchiveEntity) -> Self {
        Self {
            id: value.id,
            set_number: value.set_number,
            home_name: value.home_name,
            away_name: value.away_name,
            score: value.score,
            winner: value.winner,
            completed_at: DateTime::from_system_time(value.completed_at),
            state: value.state,
        }
    }
}

impl From<MongoSetDocument> for SetArchiveEntity {
    fn from(value: MongoSetDocument) -> Self {
        Self {
            id: value.id,
            set_number: value.set_number,
            home_name: value.home_name,
            away_name: value.away_name,
            score: value.score,
            winner: value.winner,
            completed_at: value.completed_at.to_system_time(),
            state: value.state,
        }
    }
}

/// Projection of [`MongoSetDocument`] without the frozen state, used for
/// listings.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoSetListDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    set_number: u8,
    home_name: String,
    away_name: String,
    score: PerSide<u16>,
    winner: Side,
    completed_at: DateTime,
}

impl From<MongoSetListDocument> for SetListItemEntity {
    fn from(value: MongoSetListDocument) -> Self {
        Self {
            id: value.id,
            set_number: value.set_number,
            home_name: value.home_name,
            away_name: value.away_name,
            score: value.score,
            winner: value.winner,
            completed_at: value.completed_at.to_system_time(),
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

/// Filter matching one archived set by id.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
