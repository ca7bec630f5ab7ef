use serde_json::Value;
use std::path::Path;

use crate::client::{Client, SearchQuery};
use crate::error::Error;
use crate::models::Asset;
use crate::upload::{
    upload_assets, HashAlgorithm, HashLedger, UploadOptions, UploadReport,
};

/// Asset operations plus the dedup-aware upload entry point. Owns the hash
/// ledger so every upload through this facade shares one dedup store.
pub struct AssetApi<'a> {
    client: &'a Client,
    ledger: HashLedger,
    algorithm: HashAlgorithm,
}

impl<'a> AssetApi<'a> {
    pub fn new(
        client: &'a Client,
        ledger: HashLedger,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            client,
            ledger,
            algorithm,
        }
    }

    /// Upload a file, directory, or archive. Dispatch, dedup, and progress
    /// are handled by the pipeline; this facade supplies the transport and
    /// the shared ledger.
    pub fn upload(&self, path: &Path, options: &UploadOptions) -> Result<UploadReport, Error> {
        upload_assets(self.client, &self.ledger, self.algorithm, path, options)
    }

    pub fn ledger(&self) -> &HashLedger {
        &self.ledger
    }

    pub fn info(&self, asset_id: &str) -> Result<Asset, Error> {
        Ok(serde_json::from_value(self.client.asset_info(asset_id)?)?)
    }

    pub fn download(&self, asset_id: &str) -> Result<Vec<u8>, Error> {
        self.client.download_asset(asset_id)
    }

    pub fn update(&self, asset_id: &str, fields: &Value) -> Result<Asset, Error> {
        Ok(serde_json::from_value(
            self.client.update_asset(asset_id, fields)?,
        )?)
    }

    pub fn update_many(&self, asset_ids: &[String], fields: &Value) -> Result<(), Error> {
        self.client.update_assets(asset_ids, fields)?;
        Ok(())
    }

    pub fn delete(&self, asset_ids: &[String], force: bool) -> Result<(), Error> {
        self.client.delete_assets(asset_ids, force)?;
        Ok(())
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Asset>, Error> {
        deserialize_assets(self.client.search_assets(query)?)
    }

    pub fn all(&self) -> Result<Vec<Asset>, Error> {
        deserialize_assets(self.client.all_assets()?)
    }

    pub fn by_hash(&self, checksum: &str) -> Result<Vec<Asset>, Error> {
        deserialize_assets(self.client.assets_by_hash(checksum)?)
    }

    pub fn by_name(&self, name: &str) -> Result<Vec<Asset>, Error> {
        deserialize_assets(self.client.assets_by_name(name)?)
    }

    pub fn statistics(&self) -> Result<Value, Error> {
        self.client.asset_statistics()
    }
}

fn deserialize_assets(values: Vec<Value>) -> Result<Vec<Asset>, Error> {
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(Error::from))
        .collect()
}
