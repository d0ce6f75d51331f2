/*!
Transport multicast utilisé par le locator.

Le locator est un *control point* : il se lie sur un port éphémère
(`0.0.0.0:0` par défaut), jamais sur UDP 1900, pour qu'un serveur SSDP local
continue de recevoir son propre trafic. Les réponses aux M-SEARCH reviennent
en unicast sur ce port.

Chaque datagramme reçu est décodé (UTF-8 avec pertes) puis poussé dans un
canal ; le consommateur de [`Transport::incoming`] en possède le côté
réception. Lâcher le récepteur désenregistre le handler.
*/

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::errors::TransportError;

const RECV_BUFFER_SIZE: usize = 8192;

/// Capacité réseau consommée par le locator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Réserve un endpoint UDP local.
    async fn bind(&mut self, local: SocketAddrV4) -> Result<(), TransportError>;

    /// Rejoint un groupe multicast IPv4.
    async fn join_multicast_group(&mut self, group: Ipv4Addr) -> Result<(), TransportError>;

    /// Enregistre le handler de datagrammes et retourne son canal.
    ///
    /// Un seul appel par endpoint, après `bind`.
    fn incoming(&mut self) -> Result<mpsc::UnboundedReceiver<String>, TransportError>;

    /// Envoie un datagramme texte ; le retour vaut confirmation d'envoi.
    async fn send_to(&self, target: SocketAddrV4, payload: &str) -> Result<(), TransportError>;

    /// Libère l'endpoint. Idempotent.
    async fn close(&mut self);
}

/// Fabrique d'endpoints : chaque découverte ouvre et ferme le sien.
pub trait TransportFactory: Send + Sync {
    type Transport: Transport;

    fn create(&self) -> Self::Transport;
}

impl<F, T> TransportFactory for F
where
    F: Fn() -> T + Send + Sync,
    T: Transport,
{
    type Transport = T;

    fn create(&self) -> T {
        self()
    }
}

/// Fabrique d'endpoints UDP réels.
#[derive(Debug, Clone)]
pub struct UdpTransportFactory {
    pub multicast_loop: bool,
}

impl Default for UdpTransportFactory {
    fn default() -> Self {
        Self {
            multicast_loop: true,
        }
    }
}

impl TransportFactory for UdpTransportFactory {
    type Transport = UdpTransport;

    fn create(&self) -> UdpTransport {
        UdpTransport::new(self.multicast_loop)
    }
}

/// Endpoint UDP tokio, configuré via socket2.
pub struct UdpTransport {
    socket: Option<Arc<UdpSocket>>,
    recv_task: Option<JoinHandle<()>>,
    multicast_loop: bool,
}

impl UdpTransport {
    pub fn new(multicast_loop: bool) -> Self {
        Self {
            socket: None,
            recv_task: None,
            multicast_loop,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn socket(&self) -> Result<&Arc<UdpSocket>, TransportError> {
        self.socket.as_ref().ok_or(TransportError::NotBound)
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn bind(&mut self, local: SocketAddrV4) -> Result<(), TransportError> {
        let bind_error = |source| TransportError::Bind {
            addr: local.to_string(),
            source,
        };

        let socket2 =
            Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_error)?;
        socket2.set_reuse_address(true).map_err(bind_error)?;
        socket2
            .bind(&SocketAddr::V4(local).into())
            .map_err(bind_error)?;
        socket2.set_nonblocking(true).map_err(bind_error)?;

        let socket = UdpSocket::from_std(socket2.into()).map_err(bind_error)?;
        socket
            .set_multicast_loop_v4(self.multicast_loop)
            .map_err(bind_error)?;

        debug!(
            "SSDP endpoint bound on {}",
            socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| local.to_string())
        );
        self.socket = Some(Arc::new(socket));
        Ok(())
    }

    async fn join_multicast_group(&mut self, group: Ipv4Addr) -> Result<(), TransportError> {
        let socket = self.socket()?;

        let mut interfaces = pmoutils::list_ipv4_interfaces();
        if interfaces.is_empty() {
            interfaces.push(Ipv4Addr::UNSPECIFIED);
        }

        let mut joined = 0usize;
        let mut last_error = None;
        for iface in interfaces {
            match socket.join_multicast_v4(group, iface) {
                Ok(()) => {
                    debug!("SSDP: joined {} on {}", group, iface);
                    joined += 1;
                }
                Err(e) => {
                    warn!("SSDP: failed to join {} on {}: {}", group, iface, e);
                    last_error = Some(e);
                }
            }
        }

        if joined == 0 {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no usable interface".to_string());
            return Err(TransportError::join_multicast(group, reason));
        }
        Ok(())
    }

    fn incoming(&mut self) -> Result<mpsc::UnboundedReceiver<String>, TransportError> {
        let socket = Arc::clone(self.socket()?);
        if self.recv_task.is_some() {
            return Err(TransportError::ReceiverTaken);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.recv_task = Some(tokio::spawn(receive_loop(socket, tx)));
        Ok(rx)
    }

    async fn send_to(&self, target: SocketAddrV4, payload: &str) -> Result<(), TransportError> {
        let socket = self.socket()?;
        socket
            .send_to(payload.as_bytes(), SocketAddr::V4(target))
            .await
            .map_err(|source| TransportError::Send {
                target: target.to_string(),
                source,
            })?;
        trace!("📤 {} bytes sent to {}", payload.len(), target);
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
        if self.socket.take().is_some() {
            debug!("SSDP endpoint closed");
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, tx: mpsc::UnboundedSender<String>) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((n, from)) => {
                trace!("📥 SSDP datagram from {} ({} bytes)", from, n);
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(text).is_err() {
                    // Handler désenregistré
                    break;
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => {
                warn!("❌ SSDP read error, stopping receiver: {}", e);
                break;
            }
        }
    }
}
