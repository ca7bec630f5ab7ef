use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    #[serde(other)]
    Unknown,
}

impl Default for AssetType {
    fn default() -> Self {
        AssetType::Unknown
    }
}

/// EXIF block attached to an asset when requested with `withExif`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExifInfo {
    pub make: String,
    pub model: String,
    pub exif_image_width: i64,
    pub exif_image_height: i64,
    pub file_size_in_byte: i64,
    pub orientation: String,
    pub date_time_original: Option<DateTime<Utc>>,
    pub time_zone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    pub id: String,
    pub device_asset_id: String,
    pub owner_id: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub original_path: String,
    pub original_file_name: String,
    pub checksum: String,
    pub thumbhash: String,
    pub file_created_at: Option<DateTime<Utc>>,
    pub file_modified_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
    pub duration: String,
    pub rating: i32,
    pub exif_info: Option<ExifInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_from_wire_json() {
        let value = serde_json::json!({
            "id": "abc-123",
            "type": "image",
            "originalFileName": "IMG_0001.jpg",
            "isFavorite": true,
            "fileCreatedAt": "2024-06-01T12:00:00Z",
        });
        let asset: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(asset.id, "abc-123");
        assert_eq!(asset.asset_type, AssetType::Image);
        assert_eq!(asset.original_file_name, "IMG_0001.jpg");
        assert!(asset.is_favorite);
        assert!(asset.file_created_at.is_some());
        assert!(asset.exif_info.is_none());
    }

    #[test]
    fn test_unknown_asset_type_tolerated() {
        let value = serde_json::json!({"id": "x", "type": "hologram"});
        let asset: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(asset.asset_type, AssetType::Unknown);
    }
}
