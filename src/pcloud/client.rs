use super::{
    ApiFailure, BatchThumbResult, DynTransport, HttpTransport, ListingResult, Params, PcloudError,
    RpcMethod, SingleLinkResult, ThumbnailSpec,
};
use crate::PcloudConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedClient = Arc<PcloudClient>;

/// Issues logical calls against an ordered list of regional endpoints,
/// moving on to the next endpoint only for the configured retry codes.
pub struct PcloudClient {
    transport: DynTransport,
    servers: Vec<String>,
    retry_codes: Vec<u32>,
}

impl PcloudClient {
    pub fn new(transport: DynTransport, servers: Vec<String>, retry_codes: Vec<u32>) -> Self {
        Self {
            transport,
            servers,
            retry_codes,
        }
    }

    pub fn from_config(config: &PcloudConfig) -> Result<Self, PcloudError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &PcloudConfig, transport: DynTransport) -> Self {
        Self::new(
            transport,
            config.api_servers.clone(),
            config.retry_codes.clone(),
        )
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Same as [`PcloudClient::call`], for callers holding a method name.
    pub async fn call_named(&self, method: &str, params: &Params) -> Result<Value, PcloudError> {
        let method: RpcMethod = method.parse()?;
        self.call(method, params).await
    }

    pub async fn call(&self, method: RpcMethod, params: &Params) -> Result<Value, PcloudError> {
        let mut last_failure = None;

        for server in &self.servers {
            let envelope = self.transport.call(server, method, params).await?;
            let code = result_code(&envelope)?;

            if code == 0 {
                debug!(
                    %method,
                    %server,
                    transport = self.transport.name(),
                    "Remote call succeeded"
                );
                return Ok(envelope);
            }

            let failure = ApiFailure {
                code,
                message: envelope
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string(),
                server: server.clone(),
            };

            if !self.retry_codes.contains(&code) {
                return Err(PcloudError::Api(failure));
            }

            warn!(
                %method,
                code,
                %server,
                "Remote API error, trying next endpoint"
            );
            last_failure = Some(failure);
        }

        Err(match last_failure {
            Some(failure) => PcloudError::Unavailable(failure),
            None => PcloudError::NoEndpoints,
        })
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: &Params,
    ) -> Result<T, PcloudError> {
        let envelope = self.call(method, params).await?;
        Ok(serde_json::from_value(envelope)?)
    }

    pub async fn show_publink(&self, code: &str) -> Result<ListingResult, PcloudError> {
        let params = Params::new().text("code", code);
        self.call_typed(RpcMethod::ShowPublink, &params).await
    }

    pub async fn list_folder(&self, folder_id: u64) -> Result<ListingResult, PcloudError> {
        let params = Params::new().number("folderid", folder_id);
        self.call_typed(RpcMethod::ListFolder, &params).await
    }

    pub async fn pub_thumbs_links(
        &self,
        code: &str,
        file_ids: &[u64],
        spec: &ThumbnailSpec,
    ) -> Result<BatchThumbResult, PcloudError> {
        let params = spec.batch_params(Params::new().text("code", code), file_ids);
        self.call_typed(RpcMethod::GetPubThumbsLinks, &params).await
    }

    pub async fn thumbs_links(
        &self,
        file_ids: &[u64],
        spec: &ThumbnailSpec,
    ) -> Result<BatchThumbResult, PcloudError> {
        let params = spec.batch_params(Params::new(), file_ids);
        self.call_typed(RpcMethod::GetThumbsLinks, &params).await
    }

    pub async fn pub_thumb_link(
        &self,
        code: &str,
        file_id: u64,
        size: &str,
    ) -> Result<SingleLinkResult, PcloudError> {
        let params = Params::new()
            .text("code", code)
            .number("fileid", file_id)
            .text("size", size);
        self.call_typed(RpcMethod::GetPubThumbLink, &params).await
    }
}

fn result_code(envelope: &Value) -> Result<u32, PcloudError> {
    envelope
        .get("result")
        .and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok())
        .ok_or_else(|| PcloudError::MalformedResponse("missing result code".to_string()))
}
