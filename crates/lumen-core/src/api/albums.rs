use serde_json::Value;

use crate::client::Client;
use crate::error::Error;
use crate::models::Album;

pub struct AlbumApi<'a> {
    client: &'a Client,
}

impl<'a> AlbumApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn all(&self) -> Result<Vec<Album>, Error> {
        deserialize_albums(self.client.all_albums()?)
    }

    pub fn info(&self, album_id: &str, without_assets: bool) -> Result<Album, Error> {
        Ok(serde_json::from_value(
            self.client.album_info(album_id, without_assets)?,
        )?)
    }

    pub fn create(
        &self,
        album_name: &str,
        description: &str,
        asset_ids: &[String],
    ) -> Result<Album, Error> {
        Ok(serde_json::from_value(self.client.create_album(
            album_name,
            description,
            asset_ids,
        )?)?)
    }

    pub fn delete(&self, album_id: &str) -> Result<(), Error> {
        self.client.delete_album(album_id)?;
        Ok(())
    }

    pub fn add_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<Value, Error> {
        self.client.add_assets_to_album(album_id, asset_ids)
    }

    /// Albums containing the given asset.
    pub fn for_asset(&self, asset_id: &str) -> Result<Vec<Album>, Error> {
        deserialize_albums(self.client.asset_albums(asset_id)?)
    }

    /// Look an album up by name, creating it when absent. Name matching is
    /// exact.
    pub fn find_or_create(&self, album_name: &str) -> Result<Album, Error> {
        if let Some(album) = self
            .all()?
            .into_iter()
            .find(|a| a.album_name == album_name)
        {
            return Ok(album);
        }
        self.create(album_name, "", &[])
    }
}

fn deserialize_albums(value: Value) -> Result<Vec<Album>, Error> {
    Ok(serde_json::from_value(value)?)
}
