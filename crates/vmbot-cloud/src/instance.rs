//! Compute instance snapshot types

use serde::{Deserialize, Serialize};

/// Snapshot of a compute instance as reported by the provider
///
/// Snapshots are fetched on demand and never cached between commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Provider-specific instance ID
    pub id: String,

    /// Human readable name, if the provider has one
    pub name: Option<String>,

    /// Current status
    pub status: Status,

    /// Attached network interfaces, in provider order
    pub network_interfaces: Vec<NetworkInterface>,
}

impl Instance {
    pub fn new(id: impl Into<String>, status: Status) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
            network_interfaces: Vec::new(),
        }
    }

    pub fn with_interface(mut self, interface: NetworkInterface) -> Self {
        self.network_interfaces.push(interface);
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// External IPv4 address of the first interface
    ///
    /// Only reported while the instance is running.
    pub fn external_ip(&self) -> Option<&str> {
        if !self.is_running() {
            return None;
        }
        self.network_interfaces
            .first()?
            .external_ipv4
            .as_deref()
            .filter(|ip| !ip.is_empty())
    }
}

/// Network interface of an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Internal (primary) IPv4 address
    pub internal_ipv4: Option<String>,

    /// One-to-one NAT address reachable from the internet
    pub external_ipv4: Option<String>,
}

impl NetworkInterface {
    pub fn external(address: impl Into<String>) -> Self {
        Self {
            internal_ipv4: None,
            external_ipv4: Some(address.into()),
        }
    }
}

/// Instance status, named as the provider names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Resources are being allocated, the instance is booting
    Provisioning,
    Running,
    Stopping,
    Stopped,
    Starting,
    Restarting,
    Updating,
    Error,
    Crashed,
    Deleting,
    /// Anything the provider reports that we do not know about
    #[serde(rename = "STATUS_UNSPECIFIED", other)]
    Unspecified,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Provisioning => "PROVISIONING",
            Status::Running => "RUNNING",
            Status::Stopping => "STOPPING",
            Status::Stopped => "STOPPED",
            Status::Starting => "STARTING",
            Status::Restarting => "RESTARTING",
            Status::Updating => "UPDATING",
            Status::Error => "ERROR",
            Status::Crashed => "CRASHED",
            Status::Deleting => "DELETING",
            Status::Unspecified => "STATUS_UNSPECIFIED",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_ip_requires_running() {
        let running =
            Instance::new("fhm1", Status::Running).with_interface(NetworkInterface::external("1.2.3.4"));
        assert_eq!(running.external_ip(), Some("1.2.3.4"));

        let stopped =
            Instance::new("fhm1", Status::Stopped).with_interface(NetworkInterface::external("1.2.3.4"));
        assert_eq!(stopped.external_ip(), None);
    }

    #[test]
    fn test_external_ip_without_nat() {
        let no_interfaces = Instance::new("fhm1", Status::Running);
        assert_eq!(no_interfaces.external_ip(), None);

        let internal_only = Instance::new("fhm1", Status::Running).with_interface(NetworkInterface {
            internal_ipv4: Some("10.128.0.4".to_string()),
            external_ipv4: None,
        });
        assert_eq!(internal_only.external_ip(), None);
    }

    #[test]
    fn test_status_wire_names() {
        let status: Status = serde_json::from_str("\"PROVISIONING\"").unwrap();
        assert_eq!(status, Status::Provisioning);

        let unknown: Status = serde_json::from_str("\"HIBERNATED\"").unwrap();
        assert_eq!(unknown, Status::Unspecified);

        assert_eq!(Status::Running.to_string(), "RUNNING");
        assert_eq!(
            serde_json::to_string(&Status::Stopping).unwrap(),
            "\"STOPPING\""
        );
    }
}
