//! The `/server-info` body.

use std::time::Duration;

use transport::AuthMethod;
use wire::{ContentNode, Version};

/// DMAP protocol version the server speaks.
pub const DMAP_VERSION: Version = Version::new(2, 0, 0);

/// DAAP protocol version the server speaks.
pub const DAAP_VERSION: Version = Version::new(3, 0, 0);

#[must_use]
pub fn server_info_node(
    name: &str,
    auth_method: AuthMethod,
    timeout: Duration,
    database_count: usize,
) -> ContentNode {
    ContentNode::container(
        "dmap.serverinforesponse",
        vec![
            ContentNode::new("dmap.status", 200),
            ContentNode::new("dmap.protocolversion", DMAP_VERSION),
            ContentNode::new("daap.protocolversion", DAAP_VERSION),
            ContentNode::new("dmap.itemname", name),
            ContentNode::new(
                "dmap.timeoutinterval",
                i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX),
            ),
            ContentNode::new("dmap.loginrequired", auth_method.is_required()),
            ContentNode::new("dmap.authenticationmethod", auth_method.to_wire()),
            ContentNode::new("dmap.supportsupdate", 1u8),
            ContentNode::new("dmap.supportsautologout", 1u8),
            ContentNode::new(
                "dmap.databasescount",
                i32::try_from(database_count).unwrap_or(i32::MAX),
            ),
        ],
    )
}
