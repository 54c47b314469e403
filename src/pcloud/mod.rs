// Remote storage API access - region-aware calls and typed results
mod client;
mod error;
mod fixture;
mod transport;
mod types;

pub use client::{PcloudClient, SharedClient};
pub use error::{ApiFailure, PcloudError};
pub use fixture::{FixtureTransport, RecordedCall};
pub use transport::{DynTransport, HttpTransport, Transport};
pub use types::*;

/// "Invalid link 'code'" - also what a share code from another region returns.
pub const WRONG_REGION: u32 = 7001;
/// Transient internal error on the API side.
pub const INTERNAL_ERROR: u32 = 500;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    const PRIMARY: &str = "api.pcloud.com";
    const SECONDARY: &str = "eapi.pcloud.com";

    fn client_for(transport: Arc<FixtureTransport>) -> PcloudClient {
        PcloudClient::new(
            transport,
            vec![PRIMARY.to_string(), SECONDARY.to_string()],
            vec![WRONG_REGION, INTERNAL_ERROR],
        )
    }

    fn listing() -> serde_json::Value {
        json!({
            "result": 0,
            "metadata": { "name": "Holiday", "contents": [] }
        })
    }

    #[tokio::test]
    async fn test_primary_success_makes_one_call() {
        let transport = Arc::new(FixtureTransport::new().respond(RpcMethod::ShowPublink, listing()));
        let client = client_for(transport.clone());

        let result = client.show_publink("abc123").await.unwrap();
        assert_eq!(
            result.metadata.unwrap().name.as_deref(),
            Some("Holiday")
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].server, PRIMARY);
        assert_eq!(calls[0].params.get("code"), Some(&Param::Text("abc123".into())));
    }

    #[tokio::test]
    async fn test_wrong_region_falls_back_to_secondary() {
        let transport = Arc::new(
            FixtureTransport::new()
                .fail_on(PRIMARY, RpcMethod::ShowPublink, WRONG_REGION, "Invalid link 'code'.")
                .respond_on(SECONDARY, RpcMethod::ShowPublink, listing()),
        );
        let client = client_for(transport.clone());

        let result = client.show_publink("abc123").await;
        assert!(result.is_ok(), "secondary success must not surface an error");

        let servers: Vec<_> = transport.calls().into_iter().map(|c| c.server).collect();
        assert_eq!(servers, vec![PRIMARY.to_string(), SECONDARY.to_string()]);
    }

    #[tokio::test]
    async fn test_internal_error_is_retried() {
        let transport = Arc::new(
            FixtureTransport::new()
                .fail_on(PRIMARY, RpcMethod::ShowPublink, INTERNAL_ERROR, "Internal error.")
                .respond_on(SECONDARY, RpcMethod::ShowPublink, listing()),
        );
        let client = client_for(transport.clone());

        assert!(client.show_publink("abc123").await.is_ok());
        assert_eq!(transport.call_count(RpcMethod::ShowPublink), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_payload() {
        let transport = Arc::new(
            FixtureTransport::new()
                .fail_on(PRIMARY, RpcMethod::ShowPublink, WRONG_REGION, "primary says no")
                .fail_on(SECONDARY, RpcMethod::ShowPublink, WRONG_REGION, "secondary says no"),
        );
        let client = client_for(transport);

        let err = client.show_publink("abc123").await.unwrap_err();
        match err {
            PcloudError::Unavailable(failure) => {
                assert_eq!(
                    failure,
                    ApiFailure {
                        code: WRONG_REGION,
                        message: "secondary says no".to_string(),
                        server: SECONDARY.to_string(),
                    }
                );
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_codes_are_not_retried() {
        let transport = Arc::new(
            FixtureTransport::new()
                .fail_on(PRIMARY, RpcMethod::ShowPublink, 2009, "File not found.")
                .respond_on(SECONDARY, RpcMethod::ShowPublink, listing()),
        );
        let client = client_for(transport.clone());

        let err = client.show_publink("abc123").await.unwrap_err();
        assert!(matches!(&err, PcloudError::Api(f) if f.code == 2009 && f.server == PRIMARY));
        assert_eq!(transport.call_count(RpcMethod::ShowPublink), 1);
    }

    #[tokio::test]
    async fn test_missing_result_code_is_malformed() {
        let transport = Arc::new(
            FixtureTransport::new().respond(RpcMethod::ShowPublink, json!({ "metadata": {} })),
        );
        let client = client_for(transport);

        let err = client.show_publink("abc123").await.unwrap_err();
        assert!(matches!(err, PcloudError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_no_endpoints() {
        let transport = Arc::new(FixtureTransport::new());
        let client = PcloudClient::new(transport, Vec::new(), vec![WRONG_REGION]);

        let err = client.show_publink("abc123").await.unwrap_err();
        assert!(matches!(err, PcloudError::NoEndpoints));
    }

    #[tokio::test]
    async fn test_call_named_rejects_unknown_methods() {
        let transport = Arc::new(FixtureTransport::new());
        let client = client_for(transport.clone());

        let err = client.call_named("uploadfile", &Params::new()).await.unwrap_err();
        assert!(matches!(err, PcloudError::UnsupportedMethod(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_link_params() {
        let transport = Arc::new(FixtureTransport::new().respond(
            RpcMethod::GetPubThumbLink,
            json!({ "result": 0, "hosts": ["c1.pcloud.com"], "path": "/big.jpg" }),
        ));
        let client = client_for(transport.clone());

        let link = client.pub_thumb_link("abc123", 42, "2048x2048").await.unwrap();
        assert_eq!(link.url().as_deref(), Some("https://c1.pcloud.com/big.jpg"));

        let call = &transport.calls()[0];
        assert_eq!(call.params.get("fileid"), Some(&Param::Number(42)));
        assert_eq!(call.params.get("size"), Some(&Param::Text("2048x2048".into())));
    }

    #[test]
    fn test_client_reports_transport() {
        let client = client_for(Arc::new(FixtureTransport::new()));
        assert_eq!(client.transport_name(), "Fixture");
        assert_eq!(client.servers(), &[PRIMARY.to_string(), SECONDARY.to_string()]);
    }
}
