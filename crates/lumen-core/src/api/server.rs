use serde_json::Value;
use std::collections::HashMap;

use crate::client::Client;
use crate::error::Error;
use crate::models::User;

pub struct ServerApi<'a> {
    client: &'a Client,
}

impl<'a> ServerApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn ping(&self) -> bool {
        self.client.ping()
    }

    /// Verify the endpoint and API key by fetching the authenticated user.
    pub fn validate_connection(&self) -> Result<User, Error> {
        Ok(serde_json::from_value(self.client.validate_connection()?)?)
    }

    pub fn statistics(&self) -> Result<Value, Error> {
        self.client.server_statistics()
    }

    pub fn about(&self) -> Result<Value, Error> {
        self.client.about_info()
    }

    pub fn media_types(&self) -> Result<HashMap<String, String>, Error> {
        self.client.supported_media_types()
    }
}
