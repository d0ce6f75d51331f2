use std::io;

use thiserror::Error;

/// Erreurs du transport multicast.
///
/// Seules `Bind` et `JoinMulticast` interrompent une découverte : un M-SEARCH
/// qui ne part pas est simplement journalisé.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Cannot bind UDP endpoint on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("Cannot join multicast group {group}: {reason}")]
    JoinMulticast { group: String, reason: String },
    #[error("Transport endpoint is not bound")]
    NotBound,
    #[error("Incoming datagram channel already taken")]
    ReceiverTaken,
    #[error("Failed to send datagram to {target}: {source}")]
    Send {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    pub fn join_multicast(group: impl ToString, reason: impl ToString) -> Self {
        TransportError::JoinMulticast {
            group: group.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Empty response body")]
    EmptyBody,
}

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::de::DeError),
    #[error("Missing required device element: {0}")]
    MissingField(&'static str),
}

/// Raison pour laquelle un candidat n'est pas retenu.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Cannot fetch device description: {0}")]
    Fetch(#[from] FetchError),
    #[error("Invalid device description: {0}")]
    Description(#[from] DescriptionError),
    #[error("{found} is not a DIAL device")]
    DeviceTypeMismatch { found: String },
}
