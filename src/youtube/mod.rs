use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{Result, ScribeError};

pub mod captions;
pub mod channel;

#[cfg(test)]
mod test_server;

/// Map non-success responses to `ScribeError`, keeping query strings (and API keys) out of messages
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ScribeError::TooManyRequests.into());
    }

    if !status.is_success() {
        let mut url = response.url().clone();
        url.set_query(None);
        return Err(ScribeError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        }
        .into());
    }

    Ok(response)
}

/// A video to fetch a transcript for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    /// YouTube video id
    pub id: String,

    /// Video title as listed by the channel
    pub title: String,
}

impl VideoReference {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Canonical watch URL written to reports
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.id)
    }
}
