//! This module provides the HTTP transport used to reach the portal API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use url::Url;

use crate::error::Result;

/// What a server answered to a GET request
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that can perform a GET request
///
/// Implementations must report network, DNS and timeout failures as [`PortalError::Transport`].
/// Non-200 statuses are not errors at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, authorization: &str) -> Result<Response>;
}

/// A [`Transport`] that performs actual HTTP requests
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for Client {
    async fn get(&self, url: &Url, authorization: &str) -> Result<Response> {
        let res = self.http
            .get(url.as_str())
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        log::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(Response { status, body })
    }
}
