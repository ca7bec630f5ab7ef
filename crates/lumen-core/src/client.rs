//! Blocking HTTP transport for the Lumen server API.
//!
//! Thin verb helpers plus per-endpoint methods returning wire JSON; the
//! typed facades live in [`crate::api`]. Error translation is uniform:
//! non-expected statuses become [`Error::Api`] with the server's `message`
//! or `error` field when present, transport failures become [`Error::Http`].

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::info;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::progress::ProgressHandle;
use crate::upload::{AssetTransport, UploadOutcome, UploadUnit};

const API_KEY_HEADER: &str = "x-api-key";

pub struct ClientBuilder {
    endpoint: String,
    api_key: String,
    verify_ssl: bool,
    timeout: Duration,
    dry_run: bool,
    device_id: Option<String>,
}

impl ClientBuilder {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            verify_ssl: true,
            timeout: Duration::from_secs(60),
            dry_run: false,
            device_id: None,
        }
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// When set, mutating requests are logged and short-circuited.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn device_id(mut self, device_id: &str) -> Self {
        self.device_id = Some(device_id.to_string());
        self
    }

    pub fn build(self) -> Result<Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(&self.api_key)?,
        );

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .default_headers(headers)
            .build()?;

        let device_id = self.device_id.unwrap_or_else(|| {
            hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "lumen".to_string())
        });

        Ok(Client {
            http,
            endpoint: format!("{}/api", self.endpoint.trim_end_matches('/')),
            dry_run: self.dry_run,
            device_id,
            media_types: Mutex::new(HashMap::new()),
        })
    }
}

pub struct Client {
    http: HttpClient,
    endpoint: String,
    dry_run: bool,
    device_id: String,
    // ext → media type, fetched lazily from /server/media-types
    media_types: Mutex<HashMap<String, String>>,
}

/// Search filter for `POST /search/metadata`. Pagination is handled by the
/// client; callers set the filter fields only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub page: u32,
    #[serde(rename = "size")]
    pub page_size: u32,
    pub with_exif: bool,
    pub is_visible: bool,
    pub with_deleted: bool,
    pub with_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 1000,
            with_exif: true,
            is_visible: true,
            with_deleted: false,
            with_archived: false,
            taken_before: None,
            taken_after: None,
            model: None,
            make: None,
            checksum: None,
            original_file_name: None,
        }
    }
}

impl Client {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, Error> {
        ClientBuilder::new(endpoint, api_key).build()
    }

    pub fn builder(endpoint: &str, api_key: &str) -> ClientBuilder {
        ClientBuilder::new(endpoint, api_key)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn skip_for_dry_run(&self, method: &str, path: &str) -> bool {
        if self.dry_run {
            info!("DRY RUN: {} {}", method, path);
            true
        } else {
            false
        }
    }

    fn execute(
        &self,
        builder: RequestBuilder,
        endpoint_name: &str,
        expected: &[u16],
    ) -> Result<Value, Error> {
        let response = builder.header(ACCEPT, "application/json").send()?;
        handle_response(response, endpoint_name, expected)
    }

    fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        endpoint_name: &str,
    ) -> Result<Value, Error> {
        self.execute(
            self.http.get(self.url(path)).query(params),
            endpoint_name,
            &[200],
        )
    }

    fn post_json(
        &self,
        path: &str,
        body: &Value,
        endpoint_name: &str,
        expected: &[u16],
    ) -> Result<Value, Error> {
        if self.skip_for_dry_run("POST", path) {
            return Ok(json!({}));
        }
        self.execute(
            self.http.post(self.url(path)).json(body),
            endpoint_name,
            expected,
        )
    }

    fn put_json(&self, path: &str, body: &Value, endpoint_name: &str) -> Result<Value, Error> {
        if self.skip_for_dry_run("PUT", path) {
            return Ok(json!({}));
        }
        self.execute(
            self.http.put(self.url(path)).json(body),
            endpoint_name,
            &[200],
        )
    }

    fn delete_json(&self, path: &str, body: &Value, endpoint_name: &str) -> Result<Value, Error> {
        if self.skip_for_dry_run("DELETE", path) {
            return Ok(json!({}));
        }
        self.execute(
            self.http.delete(self.url(path)).json(body),
            endpoint_name,
            &[200, 204],
        )
    }

    fn get_binary(&self, path: &str, endpoint_name: &str) -> Result<Vec<u8>, Error> {
        let response = self
            .http
            .get(self.url(path))
            .header(ACCEPT, "application/octet-stream")
            .send()?;
        let status = response.status().as_u16();
        if status == 200 {
            Ok(response.bytes()?.to_vec())
        } else {
            handle_response(response, endpoint_name, &[200]).map(|_| Vec::new())
        }
    }

    // ---- Server ----

    /// True if the server answers the ping with "pong"; network and API
    /// errors read as "not available".
    pub fn ping(&self) -> bool {
        match self.get("/server/ping", &[], "PingServer") {
            Ok(value) => value.get("res").and_then(Value::as_str) == Some("pong"),
            Err(_) => false,
        }
    }

    /// Query the identity behind the API key and warm the media-type map.
    pub fn validate_connection(&self) -> Result<Value, Error> {
        let user = self.get("/users/me", &[], "ValidateConnection")?;
        self.load_media_types()?;
        Ok(user)
    }

    pub fn server_statistics(&self) -> Result<Value, Error> {
        self.get("/server/statistics", &[], "GetServerStatistics")
    }

    pub fn asset_statistics(&self) -> Result<Value, Error> {
        self.get("/assets/statistics", &[], "GetAssetStatistics")
    }

    pub fn about_info(&self) -> Result<Value, Error> {
        self.get("/server/about", &[], "GetAboutInfo")
    }

    /// Fetch the server's extension → media-type map, with the local
    /// additions the upload path needs (.mp useless, .json sidecar,
    /// .csv meta).
    pub fn supported_media_types(&self) -> Result<HashMap<String, String>, Error> {
        let response = self.get("/server/media-types", &[], "GetSupportedMediaTypes")?;
        let mut media_types = HashMap::new();
        if let Some(map) = response.as_object() {
            for (media_type, extensions) in map {
                if let Some(exts) = extensions.as_array() {
                    for ext in exts.iter().filter_map(Value::as_str) {
                        media_types.insert(ext.to_string(), media_type.clone());
                    }
                }
            }
        }
        media_types.insert(".mp".to_string(), "useless".to_string());
        media_types.insert(".json".to_string(), "sidecar".to_string());
        media_types.insert(".csv".to_string(), "meta".to_string());
        Ok(media_types)
    }

    fn load_media_types(&self) -> Result<(), Error> {
        let mut cache = self.media_types.lock().unwrap();
        if cache.is_empty() {
            *cache = self.supported_media_types()?;
        }
        Ok(())
    }

    fn media_type_for(&self, extension: &str) -> Result<String, Error> {
        self.load_media_types()?;
        let ext = normalize_extension(extension);
        let cache = self.media_types.lock().unwrap();
        Ok(cache.get(&ext).cloned().unwrap_or_else(|| "unknown".to_string()))
    }

    pub fn is_extension_supported(&self, extension: &str) -> Result<bool, Error> {
        let media_type = self.media_type_for(extension)?;
        Ok(media_type == "image" || media_type == "video")
    }

    pub fn is_extension_ignored(&self, extension: &str) -> Result<bool, Error> {
        let media_type = self.media_type_for(extension)?;
        Ok(matches!(media_type.as_str(), "useless" | "sidecar" | "meta"))
    }

    // ---- Assets ----

    pub fn asset_info(&self, asset_id: &str) -> Result<Value, Error> {
        self.get(&format!("/assets/{}", asset_id), &[], "GetAssetInfo")
    }

    pub fn download_asset(&self, asset_id: &str) -> Result<Vec<u8>, Error> {
        self.get_binary(&format!("/assets/{}/original", asset_id), "DownloadAsset")
    }

    pub fn update_asset(&self, asset_id: &str, fields: &Value) -> Result<Value, Error> {
        self.put_json(&format!("/assets/{}", asset_id), fields, "UpdateAsset")
    }

    /// Apply the same field updates to many assets at once.
    pub fn update_assets(&self, asset_ids: &[String], fields: &Value) -> Result<Value, Error> {
        let mut body = fields.clone();
        if !body.is_object() {
            body = json!({});
        }
        body["ids"] = json!(asset_ids);
        self.put_json("/assets", &body, "UpdateAssets")
    }

    pub fn delete_assets(&self, asset_ids: &[String], force: bool) -> Result<Value, Error> {
        self.delete_json(
            "/assets",
            &json!({"ids": asset_ids, "force": force}),
            "DeleteAssets",
        )
    }

    /// Upload one file (plus optional sidecar) as multipart form data.
    /// Byte progress is reported through `progress` as the body streams.
    pub fn upload_asset(
        &self,
        unit: &UploadUnit,
        progress: &ProgressHandle,
    ) -> Result<Value, Error> {
        if self.dry_run {
            info!("DRY RUN: POST /assets ({})", unit.path.display());
            return Ok(json!({"id": "dry-run-id", "status": "created"}));
        }

        let path = unit.path.as_path();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path)?;
        let file_size = metadata.len();
        let file_name = unit.file_name();
        let extension = file_extension(path);

        let asset_type = self.media_type_for(&extension)?;
        if asset_type != "image" && asset_type != "video" {
            return Err(Error::UnsupportedFileType(extension));
        }

        let opts = &unit.options;
        let created_at = opts
            .file_created_at
            .or_else(|| metadata.created().ok().map(to_utc))
            .or_else(|| metadata.modified().ok().map(to_utc))
            .unwrap_or_else(Utc::now);
        let modified_at = opts
            .file_modified_at
            .or_else(|| metadata.modified().ok().map(to_utc))
            .unwrap_or_else(Utc::now);

        let device_asset_id = opts
            .device_asset_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", file_name, file_size));
        let device_id = opts.device_id.clone().unwrap_or_else(|| self.device_id.clone());

        let mut form = Form::new()
            .text("deviceAssetId", device_asset_id)
            .text("deviceId", device_id)
            .text("assetType", asset_type)
            .text("fileCreatedAt", format_timestamp(&created_at))
            .text("fileModifiedAt", format_timestamp(&modified_at))
            .text("isFavorite", bool_str(opts.is_favorite))
            .text("isArchived", bool_str(opts.is_archived))
            .text("fileExtension", extension.clone())
            .text("duration", opts.duration.clone())
            .text("isReadOnly", bool_str(opts.is_read_only));

        let asset_part = Part::reader(progress.wrap(File::open(path)?))
            .file_name(file_name)
            .mime_str(guess_mime_type(path))?;
        form = form.part("assetData", asset_part);

        if let Some(sidecar) = opts.sidecar_path.as_deref() {
            if !sidecar.exists() {
                return Err(Error::FileNotFound(sidecar.to_path_buf()));
            }
            let sidecar_name = sidecar
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sidecar".to_string());
            let sidecar_part = Part::reader(File::open(sidecar)?)
                .file_name(sidecar_name)
                .mime_str(guess_mime_type(sidecar))?;
            form = form.part("sidecarData", sidecar_part);
        }

        self.execute(
            self.http.post(self.url("/assets")).multipart(form),
            "AssetUpload",
            &[200, 201],
        )
    }

    /// Replace the original file behind an existing asset.
    pub fn replace_asset(
        &self,
        asset_id: &str,
        file_path: &Path,
        sidecar_path: Option<&Path>,
    ) -> Result<Value, Error> {
        if self.dry_run {
            info!("DRY RUN: PUT /assets/{}/original", asset_id);
            return Ok(json!({"id": asset_id, "status": "replaced"}));
        }

        if !file_path.exists() {
            return Err(Error::FileNotFound(file_path.to_path_buf()));
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut form = Form::new();
        let asset_part = Part::reader(File::open(file_path)?)
            .file_name(file_name)
            .mime_str(guess_mime_type(file_path))?;
        form = form.part("assetData", asset_part);

        if let Some(sidecar) = sidecar_path {
            if !sidecar.exists() {
                return Err(Error::FileNotFound(sidecar.to_path_buf()));
            }
            let sidecar_name = sidecar
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sidecar".to_string());
            let sidecar_part = Part::reader(File::open(sidecar)?)
                .file_name(sidecar_name)
                .mime_str(guess_mime_type(sidecar))?;
            form = form.part("sidecarData", sidecar_part);
        }

        self.execute(
            self.http
                .put(self.url(&format!("/assets/{}/original", asset_id)))
                .multipart(form),
            "AssetReplace",
            &[200],
        )
    }

    /// Paginated metadata search; follows `assets.nextPage` until exhausted.
    pub fn search_assets(&self, query: &SearchQuery) -> Result<Vec<Value>, Error> {
        let mut body = serde_json::to_value(query)?;
        let mut assets = Vec::new();

        loop {
            let response = self.post_json("/search/metadata", &body, "SearchMetadata", &[200])?;
            if let Some(items) = response
                .pointer("/assets/items")
                .and_then(Value::as_array)
            {
                assets.extend(items.iter().cloned());
            }

            let next_page = response
                .pointer("/assets/nextPage")
                .and_then(|v| match v {
                    Value::String(s) => s.parse::<u32>().ok(),
                    Value::Number(n) => n.as_u64().map(|n| n as u32),
                    _ => None,
                });
            match next_page {
                Some(page) => body["page"] = json!(page),
                None => break,
            }
        }

        Ok(assets)
    }

    pub fn all_assets(&self) -> Result<Vec<Value>, Error> {
        self.search_assets(&SearchQuery {
            with_deleted: true,
            ..SearchQuery::default()
        })
    }

    pub fn assets_by_hash(&self, checksum: &str) -> Result<Vec<Value>, Error> {
        let assets = self.search_assets(&SearchQuery {
            checksum: Some(checksum.to_string()),
            ..SearchQuery::default()
        })?;
        Ok(assets
            .into_iter()
            .filter(|a| a.get("checksum").and_then(Value::as_str) == Some(checksum))
            .collect())
    }

    pub fn assets_by_name(&self, name: &str) -> Result<Vec<Value>, Error> {
        let assets = self.search_assets(&SearchQuery {
            original_file_name: Some(name.to_string()),
            ..SearchQuery::default()
        })?;
        Ok(assets
            .into_iter()
            .filter(|a| a.get("originalFileName").and_then(Value::as_str) == Some(name))
            .collect())
    }

    // ---- Albums ----

    pub fn all_albums(&self) -> Result<Value, Error> {
        self.get("/albums", &[], "GetAllAlbums")
    }

    pub fn album_info(&self, album_id: &str, without_assets: bool) -> Result<Value, Error> {
        self.get(
            &format!("/albums/{}", album_id),
            &[("withoutAssets", without_assets.to_string())],
            "GetAlbumInfo",
        )
    }

    pub fn create_album(
        &self,
        album_name: &str,
        description: &str,
        asset_ids: &[String],
    ) -> Result<Value, Error> {
        if self.dry_run {
            info!("DRY RUN: POST /albums ({})", album_name);
            return Ok(json!({
                "id": "dry-run-id",
                "albumName": album_name,
                "description": description,
            }));
        }
        let mut body = json!({
            "albumName": album_name,
            "description": description,
        });
        if !asset_ids.is_empty() {
            body["assetIds"] = json!(asset_ids);
        }
        self.post_json("/albums", &body, "CreateAlbum", &[200, 201])
    }

    pub fn add_assets_to_album(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<Value, Error> {
        self.put_json(
            &format!("/albums/{}/assets", album_id),
            &json!({"ids": asset_ids}),
            "AddAssetToAlbum",
        )
    }

    pub fn asset_albums(&self, asset_id: &str) -> Result<Value, Error> {
        self.get(
            "/albums",
            &[("assetId", asset_id.to_string())],
            "GetAssetAlbums",
        )
    }

    pub fn delete_album(&self, album_id: &str) -> Result<Value, Error> {
        self.delete_json(&format!("/albums/{}", album_id), &json!({}), "DeleteAlbum")
    }

    // ---- Tags ----

    pub fn all_tags(&self) -> Result<Value, Error> {
        self.get("/tags", &[], "GetAllTags")
    }

    pub fn upsert_tags(&self, tags: &[String]) -> Result<Value, Error> {
        self.put_json("/tags", &json!({"tags": tags}), "UpsertTags")
    }

    pub fn tag_assets(&self, tag_id: &str, asset_ids: &[String]) -> Result<Value, Error> {
        self.put_json(
            &format!("/tags/{}/assets", tag_id),
            &json!({"ids": asset_ids}),
            "TagAssets",
        )
    }

    pub fn bulk_tag_assets(
        &self,
        tag_ids: &[String],
        asset_ids: &[String],
    ) -> Result<Value, Error> {
        self.put_json(
            "/tags/assets",
            &json!({"tagIds": tag_ids, "assetIds": asset_ids}),
            "BulkTagAssets",
        )
    }

    // ---- Stacks ----

    pub fn create_stack(&self, asset_ids: &[String]) -> Result<String, Error> {
        if asset_ids.len() < 2 {
            return Err(Error::Other(
                "Stack must have at least 2 assets".to_string(),
            ));
        }
        let response = self.post_json(
            "/stacks",
            &json!({"assetIds": asset_ids}),
            "CreateStack",
            &[200, 201],
        )?;
        Ok(response
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    // ---- Jobs ----

    pub fn jobs(&self) -> Result<Value, Error> {
        self.get("/jobs", &[], "GetJobs")
    }

    pub fn send_job_command(
        &self,
        job_id: &str,
        command: &str,
        force: bool,
    ) -> Result<Value, Error> {
        self.put_json(
            &format!("/jobs/{}", job_id),
            &json!({"command": command, "force": force}),
            "SendJobCommand",
        )
    }

    pub fn create_job(&self, name: &str) -> Result<Value, Error> {
        self.post_json("/jobs", &json!({"name": name}), "CreateJob", &[200, 201])
    }
}

impl AssetTransport for Client {
    fn upload_unit(
        &self,
        unit: &UploadUnit,
        progress: &ProgressHandle,
    ) -> Result<UploadOutcome, Error> {
        let value = self.upload_asset(unit, progress)?;
        UploadOutcome::from_wire(&value)
    }
}

fn handle_response(
    response: Response,
    endpoint_name: &str,
    expected: &[u16],
) -> Result<Value, Error> {
    let status = response.status().as_u16();

    if expected.contains(&status) {
        if status == 204 {
            return Ok(json!({}));
        }
        let text = response.text()?;
        if text.is_empty() {
            return Ok(json!({}));
        }
        return Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({"text": text})));
    }

    let mut message = format!("HTTP {}", status);
    if let Ok(text) = response.text() {
        if let Ok(body) = serde_json::from_str::<Value>(&text) {
            if let Some(msg) = body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
            {
                message = msg.to_string();
            }
        } else if !text.is_empty() {
            message = text;
        }
    }

    Err(Error::Api {
        status,
        endpoint: endpoint_name.to_string(),
        message,
    })
}

fn normalize_extension(extension: &str) -> String {
    let ext = extension.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn bool_str(value: bool) -> String {
    value.to_string()
}

fn guess_mime_type(path: &Path) -> &'static str {
    match file_extension(path).as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".heic" => "image/heic",
        ".heif" => "image/heif",
        ".tif" | ".tiff" => "image/tiff",
        ".bmp" => "image/bmp",
        ".dng" => "image/x-adobe-dng",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".avi" => "video/x-msvideo",
        ".mkv" => "video/x-matroska",
        ".webm" => "video/webm",
        ".json" => "application/json",
        _ => "application/octet-stream",
    }
}
