// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Async layer loading with cancellation.
//!
//! A [`LayerLoader`] spawns one GetFeature fetch per [`LoadRequest`] on a
//! tokio runtime. A new request for a layer cancels the fetch still running
//! for that layer. Results come back as [`LoadEvent`]s tagged with the
//! request generation so the caller can discard stale completions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::extent::Extent;
use crate::layers::LayerName;
use crate::protocol::{decode_feature_collection, Feature, WfsEndpoint, WfsError};

/// Configuration for a [`LayerLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// WFS service to query.
    pub endpoint: WfsEndpoint,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Channel buffer size for completed loads.
    pub buffer_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            endpoint: WfsEndpoint::default(),
            timeout: Duration::from_secs(30),
            buffer_size: 64,
        }
    }
}

/// One layer fetch scoped to an extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadRequest {
    pub layer: LayerName,
    pub extent: Extent,
    /// Generation of the layer set this request belongs to.
    pub generation: u64,
}

/// Outcome of a fetch.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Features decoded successfully.
    Loaded {
        layer: LayerName,
        generation: u64,
        features: Vec<Feature>,
    },
    /// The fetch or decode failed.
    Failed {
        layer: LayerName,
        generation: u64,
        error: String,
    },
}

impl LoadEvent {
    #[must_use]
    pub fn layer(&self) -> LayerName {
        match self {
            Self::Loaded { layer, .. } | Self::Failed { layer, .. } => *layer,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Loaded { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// Callback run after each event is queued, e.g. to wake a UI.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Handle that issues layer fetches and collects their results.
///
/// Dropping the loader cancels every fetch still in flight.
pub struct LayerLoader {
    client: reqwest::Client,
    endpoint: WfsEndpoint,
    runtime: Handle,
    event_tx: mpsc::Sender<LoadEvent>,
    event_rx: mpsc::Receiver<LoadEvent>,
    in_flight: HashMap<LayerName, CancellationToken>,
    notifier: Option<Notifier>,
}

impl std::fmt::Debug for LayerLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerLoader")
            .field("endpoint", &self.endpoint)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl LayerLoader {
    /// Create a loader that spawns its fetches on `runtime`.
    pub fn new(config: LoaderConfig, runtime: Handle) -> Result<Self, WfsError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size.max(1));

        Ok(Self {
            client,
            endpoint: config.endpoint,
            runtime,
            event_tx,
            event_rx,
            in_flight: HashMap::new(),
            notifier: None,
        })
    }

    /// Install a callback run after every queued event.
    #[must_use]
    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &WfsEndpoint {
        &self.endpoint
    }

    /// Start fetching one layer. Any fetch still running for the same layer
    /// is cancelled first.
    pub fn request(&mut self, request: LoadRequest) {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.insert(request.layer, token.clone()) {
            if !previous.is_cancelled() {
                debug!("Cancelling superseded fetch for layer {}", request.layer);
                previous.cancel();
            }
        }

        let url = self.endpoint.get_feature_url(request.layer, &request.extent);
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        let notifier = self.notifier.clone();
        let LoadRequest {
            layer, generation, ..
        } = request;

        info!("Fetching layer {layer} (generation {generation})");
        debug!("GET {url}");

        self.runtime.spawn(async move {
            let result = tokio::select! {
                result = fetch_features(&client, &url) => result,
                () = token.cancelled() => Err(WfsError::Cancelled),
            };

            let event = match result {
                Ok(features) => {
                    info!(
                        "Loaded {} features for layer {layer} (generation {generation})",
                        features.len()
                    );
                    LoadEvent::Loaded {
                        layer,
                        generation,
                        features,
                    }
                }
                Err(WfsError::Cancelled) => {
                    debug!("Fetch for layer {layer} (generation {generation}) cancelled");
                    return;
                }
                Err(e) => {
                    warn!("Failed to load layer {layer}: {e}");
                    LoadEvent::Failed {
                        layer,
                        generation,
                        error: e.to_string(),
                    }
                }
            };

            if event_tx.send(event).await.is_err() {
                return; // Loader dropped
            }
            if let Some(notify) = notifier {
                notify();
            }
        });
    }

    /// Cancel every fetch in flight.
    pub fn cancel_all(&mut self) {
        for (layer, token) in self.in_flight.drain() {
            if !token.is_cancelled() {
                debug!("Cancelling fetch for layer {layer}");
                token.cancel();
            }
        }
    }

    /// Next completed load, without waiting.
    pub fn try_recv(&mut self) -> Option<LoadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next completed load.
    pub async fn recv(&mut self) -> Option<LoadEvent> {
        self.event_rx.recv().await
    }
}

impl Drop for LayerLoader {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Fetch and decode one GetFeature URL.
pub async fn fetch_features(client: &reqwest::Client, url: &str) -> Result<Vec<Feature>, WfsError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WfsError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    decode_feature_collection(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const BODY: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"solr.1","geometry":{"type":"Point","coordinates":[-3.4,54.9]},
         "properties":{"description":"Solar array"}}]}"#;

    /// Minimal HTTP stub answering every connection with the same response.
    async fn serve(status_line: &'static str, body: &'static str, delay: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0_u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn loader_for(addr: SocketAddr) -> LayerLoader {
        let config = LoaderConfig {
            endpoint: WfsEndpoint {
                host: addr.ip().to_string(),
                port: addr.port(),
                ..Default::default()
            },
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        LayerLoader::new(config, Handle::current()).unwrap()
    }

    fn request(layer: LayerName, generation: u64) -> LoadRequest {
        LoadRequest {
            layer,
            extent: Extent::new(-400_000.0, 7_200_000.0, -350_000.0, 7_250_000.0),
            generation,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_loads_features() {
        let addr = serve("200 OK", BODY, Duration::ZERO).await;
        let mut loader = loader_for(addr);

        loader.request(request(LayerName::Solr, 1));
        let event = timeout(Duration::from_secs(5), loader.recv()).await.unwrap().unwrap();

        match event {
            LoadEvent::Loaded {
                layer,
                generation,
                features,
            } => {
                assert_eq!(layer, LayerName::Solr);
                assert_eq!(generation, 1);
                assert_eq!(features.len(), 1);
                assert_eq!(features[0].id.as_deref(), Some("solr.1"));
            }
            LoadEvent::Failed { error, .. } => panic!("unexpected failure: {error}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_error_is_reported() {
        let addr = serve("500 Internal Server Error", "{}", Duration::ZERO).await;
        let mut loader = loader_for(addr);

        loader.request(request(LayerName::Sssi, 3));
        let event = timeout(Duration::from_secs(5), loader.recv()).await.unwrap().unwrap();

        assert_eq!(event.layer(), LayerName::Sssi);
        assert_eq!(event.generation(), 3);
        match event {
            LoadEvent::Failed { error, .. } => assert!(error.contains("HTTP 500"), "{error}"),
            LoadEvent::Loaded { .. } => panic!("expected a failure"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_superseded_fetch_is_cancelled() {
        let addr = serve("200 OK", BODY, Duration::from_millis(300)).await;
        let mut loader = loader_for(addr);

        loader.request(request(LayerName::Tpo, 1));
        loader.request(request(LayerName::Tpo, 2));

        let event = timeout(Duration::from_secs(5), loader.recv()).await.unwrap().unwrap();
        assert_eq!(event.generation(), 2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(loader.try_recv().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notifier_runs_after_event() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let addr = serve("200 OK", BODY, Duration::ZERO).await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut loader = loader_for(addr).with_notifier(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        loader.request(request(LayerName::Reserves, 1));
        let _ = timeout(Duration::from_secs(5), loader.recv()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
