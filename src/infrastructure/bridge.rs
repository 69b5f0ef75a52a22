pub mod player_bridge {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_channel::oneshot;
    use futures_util::stream::{SplitSink, SplitStream};
    use futures_util::{SinkExt, StreamExt};
    use http::header::USER_AGENT;
    use http::HeaderValue;
    use log::{debug, info, warn};
    use serde_json::{json, Value};
    use tokio::net::TcpStream;
    use tokio::sync::{mpsc, Mutex};
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::protocol::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
    use url::Url;

    use crate::catalog::TrackKind;
    use crate::error::{Error, Result};
    use crate::infrastructure::player_bridge::model::bridge_model::{Incoming, Outgoing};
    use crate::player::{EmbedOptions, PlayerEvent, PlayerHandle, PlayerHost};

    pub const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

    type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct BridgeInner {
        write: Mutex<SplitSink<WsStream, Message>>,
        pending: Mutex<HashMap<u64, oneshot::Sender<Option<f64>>>>,
        next_request: AtomicU64,
    }

    impl BridgeInner {
        async fn send(&self, frame: &Outgoing<'_>) -> Result<()> {
            let text = serde_json::to_string(frame)?;
            debug!("Bridge <- {}", text);
            let mut write = self.write.lock().await;
            write.send(Message::Text(text)).await?;
            Ok(())
        }

        async fn call(&self, slot: TrackKind, method: &'static str, args: Vec<Value>) -> Result<()> {
            self.send(&Outgoing::Call {
                slot,
                method,
                args,
                request_id: None,
            })
            .await
        }

        async fn query(&self, slot: TrackKind, method: &'static str) -> Result<Option<f64>> {
            let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = oneshot::channel();
            self.pending.lock().await.insert(request_id, tx);

            let frame = Outgoing::Call {
                slot,
                method,
                args: Vec::new(),
                request_id: Some(request_id),
            };
            if let Err(e) = self.send(&frame).await {
                self.pending.lock().await.remove(&request_id);
                return Err(e);
            }

            match tokio::time::timeout(QUERY_TIMEOUT, rx).await {
                Ok(Ok(value)) => Ok(value),
                // Connection went away; the reader dropped our sender.
                Ok(Err(_)) => Ok(None),
                Err(_) => {
                    self.pending.lock().await.remove(&request_id);
                    Err(Error::Bridge(format!(
                        "{} on {} player timed out",
                        method, slot
                    )))
                }
            }
        }
    }

    /// WebSocket connection to the page that hosts both iframe embeds.
    #[derive(Clone)]
    pub struct PlayerBridge {
        inner: Arc<BridgeInner>,
    }

    impl PlayerBridge {
        /// Connects and starts the reader task. Ready notifications from the
        /// page arrive on the returned channel.
        pub async fn connect(url: &Url) -> Result<(Self, mpsc::UnboundedReceiver<PlayerEvent>)> {
            info!("Connecting to player bridge at {}", url);
            let mut request = url.as_str().into_client_request()?;
            request.headers_mut().insert(
                USER_AGENT,
                HeaderValue::from_static(concat!("rust-mashup-player/", env!("CARGO_PKG_VERSION"))),
            );

            let (ws_stream, _) = connect_async(request).await?;
            info!("Player bridge handshake completed");

            let (write, read) = ws_stream.split();
            let inner = Arc::new(BridgeInner {
                write: Mutex::new(write),
                pending: Mutex::new(HashMap::new()),
                next_request: AtomicU64::new(1),
            });

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let listener = Arc::clone(&inner);
            tokio::spawn(async move {
                listen(listener, read, events_tx).await;
            });

            Ok((PlayerBridge { inner }, events_rx))
        }

        pub async fn close(&self) -> Result<()> {
            let mut write = self.inner.write.lock().await;
            write.close().await?;
            Ok(())
        }
    }

    async fn listen(
        inner: Arc<BridgeInner>,
        mut read: SplitStream<WsStream>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    debug!("Bridge -> {}", text);
                    handle_frame(&inner, &events, &text).await;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Player bridge read failed: {}", e);
                    break;
                }
            }
        }

        // Outstanding queries resolve to `None`.
        inner.pending.lock().await.clear();
        info!("Player bridge disconnected");
    }

    async fn handle_frame(
        inner: &Arc<BridgeInner>,
        events: &mpsc::UnboundedSender<PlayerEvent>,
        text: &str,
    ) {
        let frame: Incoming = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring malformed bridge frame: {}", e);
                return;
            }
        };

        match frame {
            Incoming::Ready { slot, generation } => {
                let handle = Arc::new(BridgePlayer {
                    inner: Arc::clone(inner),
                    slot,
                });
                let event = PlayerEvent::Ready {
                    kind: slot,
                    generation,
                    handle,
                };
                if events.send(event).is_err() {
                    debug!("No controller listening for {} ready", slot);
                }
            }
            Incoming::Result { request_id, value } => {
                match inner.pending.lock().await.remove(&request_id) {
                    Some(tx) => {
                        let _ = tx.send(value);
                    }
                    None => debug!("Late reply for request {}", request_id),
                }
            }
            Incoming::Error { message } => warn!("Player bridge error: {}", message),
        }
    }

    #[async_trait]
    impl PlayerHost for PlayerBridge {
        async fn mount(
            &self,
            kind: TrackKind,
            generation: u64,
            track_id: &str,
            options: EmbedOptions,
        ) -> Result<()> {
            self.inner
                .send(&Outgoing::Mount {
                    slot: kind,
                    generation,
                    video_id: track_id,
                    player_vars: options,
                })
                .await
        }
    }

    /// One embed on the bridge page, addressed by its slot.
    pub struct BridgePlayer {
        inner: Arc<BridgeInner>,
        slot: TrackKind,
    }

    #[async_trait]
    impl PlayerHandle for BridgePlayer {
        async fn play(&self) -> Result<()> {
            self.inner.call(self.slot, "playVideo", Vec::new()).await
        }

        async fn pause(&self) -> Result<()> {
            self.inner.call(self.slot, "pauseVideo", Vec::new()).await
        }

        async fn seek_to(&self, seconds: f64) -> Result<()> {
            self.inner
                .call(self.slot, "seekTo", vec![json!(seconds), json!(true)])
                .await
        }

        async fn set_volume(&self, volume: u8) -> Result<()> {
            self.inner
                .call(self.slot, "setVolume", vec![json!(volume)])
                .await
        }

        async fn set_playback_rate(&self, rate: f64) -> Result<()> {
            self.inner
                .call(self.slot, "setPlaybackRate", vec![json!(rate)])
                .await
        }

        async fn current_time(&self) -> Result<Option<f64>> {
            self.inner.query(self.slot, "getCurrentTime").await
        }

        async fn duration(&self) -> Result<Option<f64>> {
            self.inner.query(self.slot, "getDuration").await
        }
    }
}
