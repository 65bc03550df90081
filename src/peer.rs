use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// The five transport kinds a peer can advertise.
///
/// `tls` peers are probed with the same plain stream open as `tcp` ones;
/// the label only matters for catalog filtering and display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Tls,
    Quic,
    Ws,
    Wss,
}

impl Protocol {
    pub const ALL: [Protocol; 5] = [
        Protocol::Tcp,
        Protocol::Tls,
        Protocol::Quic,
        Protocol::Ws,
        Protocol::Wss,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tls => "tls",
            Protocol::Quic => "quic",
            Protocol::Ws => "ws",
            Protocol::Wss => "wss",
        }
    }

    pub fn from_label(label: &str) -> Option<Protocol> {
        Protocol::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One advertised endpoint, as extracted from the peers catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerRecord {
    pub protocol: Protocol,
    /// Hostname, IPv4 literal, or bracketed IPv6 literal.
    pub host: String,
    pub port: u16,
    pub region: String,
    pub country: String,
}

impl PeerRecord {
    pub fn uri(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn location(&self) -> String {
        format!("{}/{}", self.region, self.country)
    }
}

/// Outcome of probing one peer.
///
/// `latency` is set exactly when `up` is true, and already includes any
/// proxy-edge penalty.
#[derive(Clone, Debug)]
pub struct ProbeResult {
    pub peer: PeerRecord,
    pub resolved: Option<IpAddr>,
    pub up: bool,
    pub latency: Option<Duration>,
}

impl ProbeResult {
    pub fn alive(peer: PeerRecord, resolved: IpAddr, latency: Duration) -> Self {
        Self {
            peer,
            resolved: Some(resolved),
            up: true,
            latency: Some(latency),
        }
    }

    pub fn dead(peer: PeerRecord, resolved: Option<IpAddr>) -> Self {
        Self {
            peer,
            resolved,
            up: false,
            latency: None,
        }
    }
}
