//! Response decoding shared by the inventory and reference clients

use crate::error::{Error, Result};
use reqwest::blocking::Response;
use serde::de::DeserializeOwned;

/// Decode a JSON body, reporting error statuses and shape mismatches as
/// [`Error::Transport`] together with the HTTP status.
pub(crate) fn read_json<T: DeserializeOwned>(response: Response, expected: &str) -> Result<T> {
    let status = response.status();
    let url = response.url().to_string();

    if !status.is_success() {
        return Err(Error::Transport {
            url,
            status,
            reason: "unexpected status".to_string(),
        });
    }

    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| Error::Transport {
        url,
        status,
        reason: format!("response is not {expected}: {e}"),
    })
}
