use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct InstanceStatus {
    pub exists: bool,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConnectionStateResponse {
    pub instance: ConnectionStateInner,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ConnectionStateInner {
    #[serde(rename = "instanceName")]
    pub instance_name: String,
    pub state: String,
}

/// An instance's upstream connection state, folded from the gateway's
/// free-form `state` string (and from transport failures — a client that
/// can't be reached is indistinguishable from a closed session). Never
/// surfaced as an `Err`: see `GatewayClient::instance_connection_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Connecting,
    Closed,
    Unknown,
}

impl ConnectionState {
    pub fn from_wire(state: &str) -> Self {
        match state {
            "open" => ConnectionState::Open,
            "connecting" => ConnectionState::Connecting,
            "close" | "closed" => ConnectionState::Closed,
            _ => ConnectionState::Unknown,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_wire_states() {
        assert_eq!(ConnectionState::from_wire("open"), ConnectionState::Open);
        assert_eq!(ConnectionState::from_wire("connecting"), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from_wire("close"), ConnectionState::Closed);
        assert_eq!(ConnectionState::from_wire("garbage"), ConnectionState::Unknown);
    }

    #[test]
    fn only_open_is_open() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(!ConnectionState::Closed.is_open());
        assert!(!ConnectionState::Unknown.is_open());
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FetchInstancesResponseEntry {
    #[serde(rename = "instanceName", alias = "name")]
    pub instance_name: String,
}
