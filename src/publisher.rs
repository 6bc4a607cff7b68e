use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use zeromq::{PubSocket, Socket, SocketSend, ZmqError, ZmqMessage};

use crate::logging;
use crate::tick::WireError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to bind broadcast socket at {endpoint}")]
    Bind {
        endpoint: String,
        #[source]
        source: ZmqError,
    },
    #[error("broadcast socket rejected message")]
    Send(#[source] ZmqError),
    #[error(transparent)]
    Encode(#[from] WireError),
}

/// Sending half of a one-to-many broadcast transport.
///
/// Delivery is at most once and best effort. `send` returning `Ok` only means
/// the transport accepted the message; nothing reports how many subscribers,
/// if any, received it. `close` consumes the channel, so it can run at most
/// once per open channel.
#[async_trait]
pub trait BroadcastChannel: Send {
    async fn send(&mut self, payload: String) -> Result<(), PublishError>;

    async fn close(self);
}

/// ZeroMQ PUB socket.
///
/// A PUB socket drops every message sent before a subscriber has finished its
/// handshake. The only mitigation is the fixed warm-up pause the feeder
/// observes after binding, which is a heuristic and not a handshake.
pub struct Publisher {
    socket: PubSocket,
    endpoint: String,
}

impl Publisher {
    /// Binds a PUB socket at `endpoint` (e.g. `tcp://127.0.0.1:5555`).
    /// Returns as soon as the socket listens and does not wait for subscribers.
    pub async fn open(endpoint: &str) -> Result<Self, PublishError> {
        let mut socket = PubSocket::new();
        let bound = socket
            .bind(endpoint)
            .await
            .map_err(|source| PublishError::Bind {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let endpoint = bound.to_string();
        logging::info(
            "publisher.bind",
            "PUB socket bound, waiting for subscribers to connect",
            json!({ "endpoint": endpoint }),
        );
        Ok(Self { socket, endpoint })
    }

    /// Resolved endpoint, including the concrete port when bound to port 0.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BroadcastChannel for Publisher {
    async fn send(&mut self, payload: String) -> Result<(), PublishError> {
        self.socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(PublishError::Send)
    }

    async fn close(self) {
        let endpoint = self.endpoint;
        for err in self.socket.close().await {
            logging::warn(
                "publisher.close_error",
                "Broadcast socket reported an error during teardown",
                json!({ "endpoint": endpoint, "error": err.to_string() }),
            );
        }
        logging::info(
            "publisher.closed",
            "Broadcast socket closed",
            json!({ "endpoint": endpoint }),
        );
    }
}
