use super::{Params, PcloudError, RpcMethod};
use crate::PcloudConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One round trip to one regional endpoint. Implementations return the raw
/// JSON envelope; interpreting `result` codes is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        server: &str,
        method: RpcMethod,
        params: &Params,
    ) -> Result<Value, PcloudError>;

    fn name(&self) -> &str;
}

pub type DynTransport = Arc<dyn Transport>;

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &PcloudConfig) -> Result<Self, PcloudError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(seconds) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        server: &str,
        method: RpcMethod,
        params: &Params,
    ) -> Result<Value, PcloudError> {
        let url = format!("https://{}/{}", server, method);
        debug!(%url, public = method.is_public(), "Issuing remote call");

        let response = self
            .client
            .get(&url)
            .query(&params.to_query())
            .send()
            .await?;

        Ok(response.json::<Value>().await?)
    }

    fn name(&self) -> &str {
        "HTTPS"
    }
}
