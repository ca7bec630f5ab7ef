use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::asset::Asset;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Album {
    pub id: String,
    pub album_name: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub asset_count: i64,
    #[serde(default)]
    pub assets: Vec<Asset>,
}
