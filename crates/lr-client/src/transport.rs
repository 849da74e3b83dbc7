//! Connection seams and the WebSocket transport.

use std::future::Future;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;

/// Opens connections to a notifier.
pub trait Connector: Send {
    /// An established connection.
    type Connection: MessageSource + Send;

    /// Make one connection attempt. No timeout is applied beyond the
    /// transport's own.
    fn connect(&mut self) -> impl Future<Output = Result<Self::Connection, ClientError>> + Send;
}

/// Stream of text payloads from an established connection.
pub trait MessageSource {
    /// Next text payload, or `None` once the connection has closed.
    fn next_message(&mut self) -> impl Future<Output = Option<String>> + Send;
}

/// [`Connector`] for a `ws://` or `wss://` URL.
#[derive(Clone, Debug)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&mut self) -> Result<WsConnection, ClientError> {
        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::Connect {
                url: self.url.clone(),
                source: Box::new(e),
            })?;
        Ok(WsConnection { stream })
    }
}

/// Established WebSocket connection.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl MessageSource for WsConnection {
    async fn next_message(&mut self) -> Option<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text.as_str().to_owned()),
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite; binary frames mean nothing here
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket read failed");
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_an_error() {
        // Grab a free port, then release it so nothing is listening there
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let mut connector = WsConnector::new(format!("ws://127.0.0.1:{port}/"));

        let Err(err) = connector.connect().await else {
            panic!("connection to a closed port succeeded");
        };

        assert!(matches!(err, ClientError::Connect { .. }));
        assert!(err.to_string().contains(connector.url()));
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let mut connector = WsConnector::new("not a url");
        assert!(connector.connect().await.is_err());
    }
}
