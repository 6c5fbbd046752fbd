use crate::prelude::{BoxFuture, FeedError, FeedResult};

/// Retrieval of a remote resource as text.
pub trait Transport: Send + Sync {
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<String>>;
}

/// `reqwest`-backed transport. No timeout beyond the client defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<String>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| FeedError::Transport(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FeedError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            response
                .text()
                .await
                .map_err(|err| FeedError::Transport(err.to_string()))
        })
    }
}

#[cfg(test)]
pub(crate) use canned::StaticTransport;
