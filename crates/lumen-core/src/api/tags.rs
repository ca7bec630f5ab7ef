use serde_json::Value;

use crate::client::Client;
use crate::error::Error;
use crate::models::Tag;

pub struct TagApi<'a> {
    client: &'a Client,
}

impl<'a> TagApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn all(&self) -> Result<Vec<Tag>, Error> {
        Ok(serde_json::from_value(self.client.all_tags()?)?)
    }

    /// Create-or-return tags by name. The server treats tag names as
    /// hierarchical paths ("people/family").
    pub fn upsert(&self, names: &[String]) -> Result<Vec<Tag>, Error> {
        Ok(serde_json::from_value(self.client.upsert_tags(names)?)?)
    }

    pub fn tag_assets(&self, tag_id: &str, asset_ids: &[String]) -> Result<Value, Error> {
        self.client.tag_assets(tag_id, asset_ids)
    }

    pub fn bulk_tag_assets(
        &self,
        tag_ids: &[String],
        asset_ids: &[String],
    ) -> Result<Value, Error> {
        self.client.bulk_tag_assets(tag_ids, asset_ids)
    }
}
