//! What `/server-info` says about a server.

use std::time::Duration;

use library::ListingError;
use transport::AuthMethod;
use wire::{ContentNode, Version};

/// Parsed `dmap.serverinforesponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub auth_method: AuthMethod,
    pub login_required: bool,
    /// Idle time after which the server drops a session.
    pub timeout: Duration,
    pub supports_update: bool,
    pub database_count: i32,
    pub dmap_version: Option<Version>,
    pub daap_version: Option<Version>,
}

impl ServerInfo {
    pub fn from_node(node: &ContentNode) -> Result<Self, ListingError> {
        if node.name != "dmap.serverinforesponse" {
            return Err(ListingError::UnexpectedNode {
                expected: "dmap.serverinforesponse",
                found: node.name.clone(),
            });
        }
        let flag = |name: &str| node.child_i32(name).is_some_and(|v| v != 0);
        let auth_method = node
            .child_i32("dmap.authenticationmethod")
            .and_then(|v| u8::try_from(v).ok())
            .and_then(AuthMethod::from_wire)
            .unwrap_or_default();
        Ok(Self {
            name: node.child_str("dmap.itemname").unwrap_or_default().to_owned(),
            auth_method,
            login_required: flag("dmap.loginrequired"),
            timeout: Duration::from_secs(
                node.child_i32("dmap.timeoutinterval")
                    .and_then(|v| u64::try_from(v).ok())
                    .unwrap_or(0),
            ),
            supports_update: flag("dmap.supportsupdate"),
            database_count: node.child_i32("dmap.databasescount").unwrap_or(0),
            dmap_version: node.child("dmap.protocolversion").and_then(ContentNode::as_version),
            daap_version: node.child("daap.protocolversion").and_then(ContentNode::as_version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_every_field() {
        let node = ContentNode::container(
            "dmap.serverinforesponse",
            vec![
                ContentNode::new("dmap.status", 200),
                ContentNode::new("dmap.protocolversion", Version::new(2, 0, 0)),
                ContentNode::new("dmap.itemname", "Den"),
                ContentNode::new("dmap.timeoutinterval", 1800),
                ContentNode::new("dmap.loginrequired", 1u8),
                ContentNode::new("dmap.authenticationmethod", 2u8),
                ContentNode::new("dmap.supportsupdate", 1u8),
                ContentNode::new("dmap.databasescount", 1),
            ],
        );
        let info = ServerInfo::from_node(&node).unwrap();
        assert_eq!(info.name, "Den");
        assert_eq!(info.auth_method, AuthMethod::UserAndPassword);
        assert!(info.login_required);
        assert!(info.supports_update);
        assert_eq!(info.timeout, Duration::from_secs(1800));
        assert_eq!(info.database_count, 1);
        assert_eq!(info.dmap_version, Some(Version::new(2, 0, 0)));
        assert_eq!(info.daap_version, None);
    }

    #[test]
    fn missing_fields_default() {
        let info =
            ServerInfo::from_node(&ContentNode::container("dmap.serverinforesponse", vec![]))
                .unwrap();
        assert_eq!(info.auth_method, AuthMethod::None);
        assert!(!info.supports_update);
    }

    #[test]
    fn wrong_node() {
        let err = ServerInfo::from_node(&ContentNode::container("dmap.loginresponse", vec![]))
            .unwrap_err();
        assert!(matches!(err, ListingError::UnexpectedNode { .. }));
    }
}
