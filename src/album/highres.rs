use super::{HighResError, PhotoId};
use crate::pcloud::SharedClient;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Resolved full-resolution URLs for one album session.
///
/// Entries are only ever inserted; a photo id keeps its first resolved URL
/// until the owning session is dropped. Failures are not cached, so a later
/// request may try again. Concurrent misses for the same id may both hit the
/// network; whichever lands second finds the entry already present.
pub struct HighResCache {
    client: SharedClient,
    size: String,
    entries: RwLock<HashMap<PhotoId, String>>,
}

impl HighResCache {
    pub fn new(client: SharedClient, size: impl Into<String>) -> Self {
        Self {
            client,
            size: size.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cached(&self, photo_id: PhotoId) -> Option<String> {
        self.entries.read().await.get(&photo_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn get_high_res(
        &self,
        photo_id: PhotoId,
        share_code: &str,
    ) -> Result<String, HighResError> {
        if let Some(url) = self.cached(photo_id).await {
            debug!("High-res cache hit for photo {}", photo_id);
            return Ok(url);
        }

        let link = self
            .client
            .pub_thumb_link(share_code, photo_id.0, &self.size)
            .await
            .map_err(|source| HighResError::Resolution { photo_id, source })?;
        let url = link.url().ok_or(HighResError::MissingLink(photo_id))?;

        let mut entries = self.entries.write().await;
        Ok(entries.entry(photo_id).or_insert(url).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcloud::{FixtureTransport, Params, PcloudClient, PcloudError, RpcMethod, Transport};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every call with a different path, the first call fastest.
    #[derive(Default)]
    struct SequencedTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for SequencedTransport {
        async fn call(
            &self,
            _server: &str,
            _method: RpcMethod,
            _params: &Params,
        ) -> Result<Value, PcloudError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20 * (n as u64 + 1))).await;
            Ok(json!({ "result": 0, "hosts": ["c1.pcloud.com"], "path": format!("/{}.jpg", n) }))
        }

        fn name(&self) -> &str {
            "Sequenced"
        }
    }

    fn cache_for(transport: Arc<FixtureTransport>) -> HighResCache {
        let client = PcloudClient::new(
            transport,
            vec!["api.pcloud.com".to_string(), "eapi.pcloud.com".to_string()],
            vec![7001, 500],
        );
        HighResCache::new(Arc::new(client), "2048x2048")
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        let transport = Arc::new(FixtureTransport::new().respond(
            RpcMethod::GetPubThumbLink,
            json!({ "result": 0, "hosts": ["c7.pcloud.com"], "path": "/2048/5.jpg" }),
        ));
        let cache = cache_for(transport.clone());

        let first = cache.get_high_res(PhotoId(5), "abc123").await.unwrap();
        let second = cache.get_high_res(PhotoId(5), "abc123").await.unwrap();

        assert_eq!(first, "https://c7.pcloud.com/2048/5.jpg");
        assert_eq!(first, second);
        assert_eq!(transport.call_count(RpcMethod::GetPubThumbLink), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let transport = Arc::new(FixtureTransport::new().respond(
            RpcMethod::GetPubThumbLink,
            json!({ "result": 2009, "error": "File not found." }),
        ));
        let cache = cache_for(transport.clone());

        let err = cache.get_high_res(PhotoId(9), "abc123").await.unwrap_err();
        assert!(matches!(err, HighResError::Resolution { photo_id: PhotoId(9), .. }));
        assert!(cache.is_empty().await);

        assert!(cache.get_high_res(PhotoId(9), "abc123").await.is_err());
        assert_eq!(transport.call_count(RpcMethod::GetPubThumbLink), 2);
    }

    #[tokio::test]
    async fn test_response_without_link_fails() {
        let transport = Arc::new(
            FixtureTransport::new().respond(RpcMethod::GetPubThumbLink, json!({ "result": 0 })),
        );
        let cache = cache_for(transport);

        let err = cache.get_high_res(PhotoId(3), "abc123").await.unwrap_err();
        assert!(matches!(err, HighResError::MissingLink(PhotoId(3))));
        assert_eq!(cache.cached(PhotoId(3)).await, None);
    }

    #[tokio::test]
    async fn test_request_uses_configured_size() {
        let transport = Arc::new(FixtureTransport::new().respond(
            RpcMethod::GetPubThumbLink,
            json!({ "result": 0, "hosts": ["c7.pcloud.com"], "path": "/x.jpg" }),
        ));
        let cache = cache_for(transport.clone());

        cache.get_high_res(PhotoId(1), "abc123").await.unwrap();
        let call = &transport.calls()[0];
        assert_eq!(
            call.params.get("size").map(|p| p.to_string()).as_deref(),
            Some("2048x2048")
        );
    }

    #[tokio::test]
    async fn test_concurrent_misses_keep_first_url() {
        let transport = Arc::new(SequencedTransport::default());
        let client = PcloudClient::new(
            transport.clone(),
            vec!["api.pcloud.com".to_string()],
            vec![7001, 500],
        );
        let cache = HighResCache::new(Arc::new(client), "2048x2048");

        let (first, second) = tokio::join!(
            cache.get_high_res(PhotoId(5), "abc123"),
            cache.get_high_res(PhotoId(5), "abc123"),
        );

        // Both misses went to the network; the later one got the stored URL.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.unwrap(), "https://c1.pcloud.com/0.jpg");
        assert_eq!(second.unwrap(), "https://c1.pcloud.com/0.jpg");
        assert_eq!(cache.len().await, 1);

        let again = cache.get_high_res(PhotoId(5), "abc123").await.unwrap();
        assert_eq!(again, "https://c1.pcloud.com/0.jpg");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
