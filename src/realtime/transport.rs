use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use reqwest::cookie::{CookieStore, Jar};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::COOKIE, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use crate::error::{AppError, Result};

pub type FrameSink = Pin<Box<dyn Sink<String, Error = AppError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Opens a bidirectional text-frame channel to the realtime server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self) -> Result<(FrameSink, FrameStream)>;
}

/// WebSocket transport that presents the HTTP session cookie on the
/// handshake.
pub struct WsTransport {
    endpoint: Url,
    cookies: Option<(Arc<Jar>, Url)>,
}

impl WsTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            cookies: None,
        }
    }

    /// Cookies stored in `jar` for `origin` are sent with the upgrade
    /// request.
    pub fn with_cookies(mut self, jar: Arc<Jar>, origin: Url) -> Self {
        self.cookies = Some((jar, origin));
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self) -> Result<(FrameSink, FrameStream)> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        if let Some((jar, origin)) = &self.cookies {
            if let Some(cookie) = jar.cookies(origin) {
                let value = HeaderValue::from_bytes(cookie.as_bytes())
                    .map_err(|e| AppError::Transport(e.to_string()))?;
                request.headers_mut().insert(COOKIE, value);
            }
        }

        debug!(endpoint = %self.endpoint, "opening websocket");
        let (socket, _response) = tokio_tungstenite::connect_async(request).await?;
        let (sink, stream) = socket.split();

        let sink = sink.with(|frame: String| ready(Ok::<_, AppError>(Message::text(frame))));
        let stream = stream.filter_map(|item| {
            ready(match item {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(AppError::from(e))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
