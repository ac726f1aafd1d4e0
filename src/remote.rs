use axum::http::StatusCode;
use serde::Serialize;

use crate::error::ToolkitError;
use crate::Toolkit;

impl Toolkit {
    /// POSTs `data` as JSON to `uri` and returns the raw response together
    /// with its status code.
    ///
    /// Uses the supplied client when given, otherwise a default one. The
    /// response body is returned unconsumed; reading or dropping it is the
    /// caller's responsibility.
    pub async fn push_json_to_remote<T: Serialize>(
        &self,
        uri: &str,
        data: &T,
        client: Option<&reqwest::Client>,
    ) -> Result<(reqwest::Response, StatusCode), ToolkitError> {
        let default_client;
        let client = match client {
            Some(client) => client,
            None => {
                default_client = reqwest::Client::new();
                &default_client
            }
        };

        let response = client.post(uri).json(data).send().await?;
        let status = response.status();
        Ok((response, status))
    }
}
