use crate::common::{FeedResponse, HttpResponse, PumpAction};
use crate::config::Config;
use crate::connectivity::ConnectivityProbe;
use crate::error::ClientError;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Uri};
use hyper_rustls::HttpsConnector;
use log::{debug, info};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError>;
}

pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        HyperTransport {
            client: Client::builder().build(https),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ClientError::Network(format!("invalid url {} ({})", url, e)))?;

        let response = self.client.get(uri).await?;
        let status = response.status().as_u16();
        let body = hyper::body::to_bytes(response.into_body()).await?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Request urls with the api keys baked in.
#[derive(Debug, Clone)]
pub struct Endpoints {
    feed: String,
    update: String,
    write_api_key: String,
}

impl Endpoints {
    pub fn new(feed_url: &str, read_api_key: &str, update_url: &str, write_api_key: &str) -> Self {
        Endpoints {
            feed: format!(
                "{}{}api_key={}&results=1",
                feed_url,
                query_separator(feed_url),
                read_api_key
            ),
            update: update_url.to_string(),
            write_api_key: write_api_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.feed_url,
            &config.read_api_key,
            &config.update_url,
            &config.write_api_key,
        )
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn command(&self, action: PumpAction) -> String {
        format!(
            "{}{}api_key={}&field1={}",
            self.update,
            query_separator(&self.update),
            self.write_api_key,
            action.field_value()
        )
    }
}

fn query_separator(url: &str) -> char {
    if url.contains('?') {
        '&'
    } else {
        '?'
    }
}

pub async fn fetch_reading(
    transport: &dyn Transport,
    url: &str,
) -> Result<FeedResponse, ClientError> {
    let response = transport.get(url).await?;
    if response.body.is_empty() {
        return Err(ClientError::EmptyResponse);
    }

    Ok(serde_json::from_slice(&response.body)?)
}

/// Latest water level as sent by the channel, e.g. `"42"`.
pub async fn request_level(transport: &dyn Transport, url: &str) -> Result<String, ClientError> {
    let response = fetch_reading(transport, url).await?;
    response
        .latest_level()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Parse("feed has no field1".to_string()))
}

pub async fn send_command(
    transport: &dyn Transport,
    probe: &dyn ConnectivityProbe,
    url: &str,
) -> Result<(), ClientError> {
    if !probe.is_connected() {
        return Err(ClientError::Connectivity);
    }

    let response = transport.get(url).await?;
    info!("command request status: {}", response.status);
    if !response.is_success() {
        return Err(ClientError::CommandRejected(response.status));
    }
    Ok(())
}
