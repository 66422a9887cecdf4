use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cachet_protocol::{Command, GetValue, ProtocolError, Reply, Request, MAX_DATAGRAM_SIZE};
use cachet_protocol::messages;
use cachet_store::KeyValueStore;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::handler::SharedStore;

/// Answer one request datagram.
///
/// Never fails: anything that goes wrong becomes a reply with
/// `success: false`.
pub fn dispatch(store: &dyn KeyValueStore, datagram: &[u8]) -> Reply {
    let request = match Request::from_slice(datagram) {
        Ok(request) => request,
        Err(e) => return Reply::failure("", e),
    };
    let cmd = match request.command() {
        Ok(cmd) => cmd,
        Err(e) => return Reply::failure(request.cmd, e),
    };

    match execute(store, cmd, &request) {
        Ok(reply) => reply,
        Err(message) => Reply::failure(request.cmd, message),
    }
}

fn execute(store: &dyn KeyValueStore, cmd: Command, request: &Request) -> Result<Reply, String> {
    let echo = request.cmd.as_str();
    match cmd {
        Command::Set => {
            let ttl = request
                .ttl
                .ok_or_else(|| ProtocolError::MissingField("ttl").to_string())?;
            let value = request
                .value
                .as_ref()
                .ok_or_else(|| ProtocolError::MissingField("value").to_string())?;
            store
                .set(&request.key, value, ttl.as_duration())
                .map_err(|e| e.to_string())?;
            Ok(Reply::ok(echo))
        }
        Command::Get => match store.get(&request.key).map_err(|e| e.to_string())? {
            Some(item) => {
                let value = serde_json::to_value(GetValue {
                    meta: item.meta,
                    data: item.value,
                })
                .map_err(|e| e.to_string())?;
                Ok(Reply::with_value(echo, value))
            }
            None => Err(messages::NOT_FOUND.to_string()),
        },
        Command::Delete => {
            store.delete(&request.key).map_err(|e| e.to_string())?;
            Ok(Reply::ok(echo))
        }
        Command::Has => {
            let exists = store.has(&request.key).map_err(|e| e.to_string())?;
            Ok(Reply::with_value(echo, serde_json::Value::Bool(exists)))
        }
    }
}

/// UDP front end: one JSON request per datagram, one JSON reply back.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    store: SharedStore,
    request_timeout: Duration,
    buffer_size: usize,
}

impl UdpServer {
    pub async fn bind(
        addr: SocketAddr,
        store: SharedStore,
        request_timeout: Duration,
        buffer_size: usize,
    ) -> ServerResult<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket: Arc::new(socket),
            store,
            request_timeout,
            buffer_size: buffer_size.clamp(1, MAX_DATAGRAM_SIZE),
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then stop receiving and give
    /// in-flight requests up to `drain_timeout` to finish.
    pub async fn run<F>(self, shutdown: F, drain_timeout: Duration) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        info!(addr = %self.local_addr()?, "UDP listener started");
        let mut buf = vec![0u8; self.buffer_size];
        let mut inflight = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "UDP request handler failed");
                    }
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        inflight.spawn(handle_datagram(
                            Arc::clone(&self.socket),
                            Arc::clone(&self.store),
                            buf[..len].to_vec(),
                            peer,
                            self.request_timeout,
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "UDP receive failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        let pending = inflight.len();
        debug!(pending, "UDP listener draining");
        let drained = tokio::time::timeout(drain_timeout, async {
            while inflight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = inflight.len(),
                "UDP drain timed out; aborting remaining handlers"
            );
            inflight.shutdown().await;
        }
        info!("UDP listener stopped");
        Ok(())
    }
}

async fn handle_datagram(
    socket: Arc<UdpSocket>,
    store: SharedStore,
    datagram: Vec<u8>,
    peer: SocketAddr,
    deadline: Duration,
) {
    let work = async {
        let reply = dispatch(store.as_ref(), &datagram);
        let mut bytes = reply.to_bytes()?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            bytes = Reply::failure(reply.cmd, "reply too large for a datagram").to_bytes()?;
        }
        socket.send_to(&bytes, peer).await?;
        Ok::<_, ServerError>(())
    };

    match tokio::time::timeout(deadline, work).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(peer = %peer, error = %e, "failed to answer datagram"),
        Err(_) => warn!(peer = %peer, ?deadline, "datagram handler timed out"),
    }
}
