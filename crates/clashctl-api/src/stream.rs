//! Line-delimited JSON streams over a WebSocket connection.
//!
//! The daemon upgrades `/traffic` and `/logs` to WebSocket and pushes one
//! JSON object per line. A frame may carry several lines; every non-empty
//! line becomes one stream item.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut traffic = client.traffic().await?;
//! while let Some(sample) = traffic.next().await {
//!     let sample = sample?;
//!     println!("up {} / down {}", sample.up, sample.down);
//! }
//! traffic.close().await?;
//! ```

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An unbounded stream of JSON records decoded from a WebSocket.
///
/// Never finishes on its own while the daemon keeps the connection open.
/// The consumer decides when to stop and should call [`close`](Self::close);
/// dropping the stream tears down the socket without a close handshake.
pub struct JsonLineStream<T> {
    socket: Socket,
    pending: VecDeque<Result<T, Error>>,
    finished: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonLineStream<T> {
    /// Connect to `url`, sending the secret as a bearer header as well as
    /// whatever `token` query the caller already placed on the URL.
    pub async fn connect(url: Url, secret: Option<&str>) -> Result<Self, Error> {
        tracing::info!(url = %redacted(&url), "Connecting to stream");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            request = request.with_header("Authorization", format!("Bearer {secret}"));
        }

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::debug!("Stream connected");

        Ok(Self {
            socket,
            pending: VecDeque::new(),
            finished: false,
            _record: PhantomData,
        })
    }

    /// Close the connection with a normal close frame.
    pub async fn close(mut self) -> Result<(), Error> {
        tracing::debug!("Closing stream");
        self.socket
            .close(None)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))
    }

    fn queue_lines(&mut self, text: &str) {
        self.pending.extend(decode_lines(text));
    }
}

impl<T: DeserializeOwned + Unpin> Stream for JsonLineStream<T> {
    type Item = Result<T, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.socket.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(tungstenite::Message::Text(text)))) => {
                    this.queue_lines(text.as_str());
                }
                Poll::Ready(Some(Ok(tungstenite::Message::Binary(bytes)))) => {
                    match std::str::from_utf8(&bytes) {
                        Ok(text) => this.queue_lines(text),
                        Err(e) => tracing::debug!(error = %e, "Skipping non-UTF-8 binary frame"),
                    }
                }
                Poll::Ready(Some(Ok(tungstenite::Message::Close(frame)))) => {
                    if let Some(ref cf) = frame {
                        tracing::info!(code = %cf.code, reason = %cf.reason, "Stream closed by daemon");
                    } else {
                        tracing::info!("Stream closed by daemon (no payload)");
                    }
                    this.finished = true;
                }
                Poll::Ready(Some(Ok(_))) => {
                    // Ping / Pong / raw frames: tungstenite answers pings itself
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(Error::WebSocketConnect(e.to_string()))));
                }
                Poll::Ready(None) => {
                    tracing::info!("Stream ended");
                    this.finished = true;
                }
            }
        }
    }
}

/// Decode every non-empty line of a frame.
///
/// A malformed line becomes an error item; the rest of the frame is kept.
fn decode_lines<T: DeserializeOwned>(text: &str) -> Vec<Result<T, Error>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: line.to_owned(),
            })
        })
        .collect()
}

/// Strip the `token` query value before logging a stream URL.
fn redacted(url: &Url) -> Url {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return clean;
    }
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean
}
