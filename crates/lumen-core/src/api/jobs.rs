use serde_json::Value;
use std::collections::HashMap;

use crate::client::Client;
use crate::error::Error;
use crate::models::{Job, JobCommand, JobName};

pub struct JobApi<'a> {
    client: &'a Client,
}

impl<'a> JobApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Queue name → counts and pause state, for every queue the server runs.
    pub fn all(&self) -> Result<HashMap<String, Job>, Error> {
        Ok(serde_json::from_value(self.client.jobs()?)?)
    }

    pub fn command(&self, job_id: &str, command: JobCommand, force: bool) -> Result<Job, Error> {
        Ok(serde_json::from_value(self.client.send_job_command(
            job_id,
            command.as_str(),
            force,
        )?)?)
    }

    pub fn create(&self, name: JobName) -> Result<Value, Error> {
        self.client.create_job(name.as_str())
    }
}
