//! DAAP response bodies: building them from snapshots and reading them back.

use thiserror::Error;
use wire::ContentNode;

use crate::database::Database;
use crate::playlist::{Playlist, PlaylistEntry};
use crate::track::Track;
use crate::types::{ContainerItemId, DatabaseId, PlaylistId, Revision, TrackId};

/// `dmap.updatetype` of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateType {
    /// The listing is the complete set; nothing about deletions is known.
    #[default]
    Full,
    /// The listing carries a deleted-id list relative to a baseline.
    Incremental,
}

impl UpdateType {
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::Incremental => 1,
        }
    }

    #[must_use]
    pub const fn from_wire(value: i64) -> Self {
        if value == 0 {
            Self::Full
        } else {
            Self::Incremental
        }
    }
}

/// A response body did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("expected '{expected}' response, found '{found}'")]
    UnexpectedNode {
        expected: &'static str,
        found: String,
    },
    #[error("'{parent}' is missing '{field}'")]
    MissingField {
        parent: &'static str,
        field: &'static str,
    },
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

fn listing_response(
    name: &str,
    items: Vec<ContentNode>,
    deleted: Option<Vec<i32>>,
) -> ContentNode {
    let update_type = if deleted.is_some() {
        UpdateType::Incremental
    } else {
        UpdateType::Full
    };
    let total = count(items.len());
    let mut children = vec![
        ContentNode::new("dmap.status", 200),
        ContentNode::new("dmap.updatetype", update_type.to_wire()),
        ContentNode::new("dmap.specifiedtotalcount", total),
        ContentNode::new("dmap.returnedcount", total),
        ContentNode::container("dmap.listing", items),
    ];
    if let Some(deleted) = deleted {
        children.push(ContentNode::container(
            "dmap.deletedidlisting",
            deleted
                .into_iter()
                .map(|id| ContentNode::new("dmap.itemid", id))
                .collect(),
        ));
    }
    ContentNode::container(name, children)
}

/// `/databases` body.
#[must_use]
pub fn databases_node(databases: &[Database]) -> ContentNode {
    let items = databases
        .iter()
        .map(|db| {
            ContentNode::container(
                "dmap.listingitem",
                vec![
                    ContentNode::new("dmap.itemid", db.id().raw()),
                    ContentNode::new("dmap.persistentid", i64::from(db.id().raw())),
                    ContentNode::new("dmap.itemname", db.name()),
                    ContentNode::new("dmap.itemcount", count(db.track_count())),
                    ContentNode::new("dmap.containercount", count(db.playlist_count() + 1)),
                ],
            )
        })
        .collect();
    listing_response("daap.serverdatabases", items, None)
}

fn playlist_item(playlist: &Playlist) -> ContentNode {
    ContentNode::container(
        "dmap.listingitem",
        vec![
            ContentNode::new("dmap.itemid", playlist.id().raw()),
            ContentNode::new("dmap.persistentid", i64::from(playlist.id().raw())),
            ContentNode::new("dmap.parentcontainerid", 0),
            ContentNode::new("dmap.itemname", playlist.name()),
            ContentNode::new("dmap.itemcount", count(playlist.len())),
            ContentNode::new("daap.baseplaylist", u8::from(playlist.is_base())),
        ],
    )
}

/// `/databases/{id}/containers` body, base playlist first.
#[must_use]
pub fn playlists_node(db: &Database) -> ContentNode {
    let items = std::iter::once(db.base_playlist())
        .chain(db.playlists())
        .map(playlist_item)
        .collect();
    listing_response("daap.databaseplaylists", items, None)
}

/// `/databases/{id}/items` body.
///
/// `deleted` is `Some` when a baseline revision was available, which makes
/// the listing incremental.
pub fn tracks_node<S: AsRef<str>>(
    db: &Database,
    meta: &[S],
    deleted: Option<&[TrackId]>,
) -> ContentNode {
    let items = db
        .tracks()
        .iter()
        .map(|track| track.to_listing_item(meta))
        .collect();
    let deleted = deleted.map(|ids| ids.iter().map(|id| id.raw()).collect());
    listing_response("daap.databasesongs", items, deleted)
}

/// `/databases/{id}/containers/{id}/items` body.
#[must_use]
pub fn playlist_tracks_node(
    db: &Database,
    playlist: &Playlist,
    deleted: Option<&[ContainerItemId]>,
) -> ContentNode {
    let items = playlist
        .entries()
        .iter()
        .filter_map(|entry| {
            db.track(entry.track)
                .map(|track| track.to_playlist_item(entry.container_item_id))
        })
        .collect();
    let deleted = deleted.map(|ids| ids.iter().map(|id| id.raw()).collect());
    listing_response("daap.playlistsongs", items, deleted)
}

/// `/update` body.
#[must_use]
pub fn update_node(revision: Revision) -> ContentNode {
    ContentNode::container(
        "dmap.updateresponse",
        vec![
            ContentNode::new("dmap.status", 200),
            ContentNode::new("dmap.serverrevision", revision.raw()),
        ],
    )
}

/// `/login` body.
#[must_use]
pub fn login_node(session_id: i32) -> ContentNode {
    ContentNode::container(
        "dmap.loginresponse",
        vec![
            ContentNode::new("dmap.status", 200),
            ContentNode::new("dmap.sessionid", session_id),
        ],
    )
}

fn expect<'a>(node: &'a ContentNode, name: &'static str) -> Result<&'a ContentNode, ListingError> {
    if node.name == name {
        Ok(node)
    } else {
        Err(ListingError::UnexpectedNode {
            expected: name,
            found: node.name.clone(),
        })
    }
}

fn listing_items(node: &ContentNode) -> impl Iterator<Item = &ContentNode> {
    node.child("dmap.listing")
        .map(ContentNode::children)
        .unwrap_or_default()
        .iter()
        .filter(|item| item.name == "dmap.listingitem")
}

fn deleted_ids(node: &ContentNode) -> Vec<i32> {
    node.child("dmap.deletedidlisting")
        .map(ContentNode::children)
        .unwrap_or_default()
        .iter()
        .filter_map(ContentNode::as_i32)
        .collect()
}

fn update_type(node: &ContentNode) -> UpdateType {
    node.child("dmap.updatetype")
        .and_then(ContentNode::as_integer)
        .map_or(UpdateType::Full, UpdateType::from_wire)
}

/// Parses `dmap.updateresponse`.
pub fn parse_update(node: &ContentNode) -> Result<Revision, ListingError> {
    expect(node, "dmap.updateresponse")?
        .child_i32("dmap.serverrevision")
        .map(Revision::new)
        .ok_or(ListingError::MissingField {
            parent: "dmap.updateresponse",
            field: "dmap.serverrevision",
        })
}

/// Parses `dmap.loginresponse` into a session id.
pub fn parse_login(node: &ContentNode) -> Result<i32, ListingError> {
    expect(node, "dmap.loginresponse")?
        .child_i32("dmap.sessionid")
        .ok_or(ListingError::MissingField {
            parent: "dmap.loginresponse",
            field: "dmap.sessionid",
        })
}

/// One entry of a `/databases` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSummary {
    pub id: DatabaseId,
    pub name: String,
    pub track_count: i32,
    pub playlist_count: i32,
}

pub fn parse_databases(node: &ContentNode) -> Result<Vec<DatabaseSummary>, ListingError> {
    listing_items(expect(node, "daap.serverdatabases")?)
        .map(|item| {
            let id = item.child_i32("dmap.itemid").ok_or(ListingError::MissingField {
                parent: "daap.serverdatabases",
                field: "dmap.itemid",
            })?;
            Ok(DatabaseSummary {
                id: DatabaseId::new(id),
                name: item.child_str("dmap.itemname").unwrap_or_default().to_owned(),
                track_count: item.child_i32("dmap.itemcount").unwrap_or(0),
                playlist_count: item.child_i32("dmap.containercount").unwrap_or(0),
            })
        })
        .collect()
}

/// One entry of a `/containers` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    pub is_base: bool,
    pub track_count: i32,
}

pub fn parse_playlists(node: &ContentNode) -> Result<Vec<PlaylistSummary>, ListingError> {
    listing_items(expect(node, "daap.databaseplaylists")?)
        .map(|item| {
            let id = item.child_i32("dmap.itemid").ok_or(ListingError::MissingField {
                parent: "daap.databaseplaylists",
                field: "dmap.itemid",
            })?;
            Ok(PlaylistSummary {
                id: PlaylistId::new(id),
                name: item.child_str("dmap.itemname").unwrap_or_default().to_owned(),
                is_base: item.child_i32("daap.baseplaylist").unwrap_or(0) != 0,
                track_count: item.child_i32("dmap.itemcount").unwrap_or(0),
            })
        })
        .collect()
}

/// A parsed `/items` response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackListing {
    pub update_type: UpdateType,
    pub tracks: Vec<Track>,
    pub deleted: Vec<TrackId>,
}

impl TrackListing {
    pub fn from_node(node: &ContentNode) -> Result<Self, ListingError> {
        let node = expect(node, "daap.databasesongs")?;
        Ok(Self {
            update_type: update_type(node),
            tracks: listing_items(node).map(Track::from_listing_item).collect(),
            deleted: deleted_ids(node).into_iter().map(TrackId::new).collect(),
        })
    }
}

/// A parsed playlist `/items` response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaylistTracksListing {
    pub update_type: UpdateType,
    pub entries: Vec<PlaylistEntry>,
    pub deleted: Vec<ContainerItemId>,
}

impl PlaylistTracksListing {
    pub fn from_node(node: &ContentNode) -> Result<Self, ListingError> {
        let node = expect(node, "daap.playlistsongs")?;
        let entries = listing_items(node)
            .filter_map(|item| {
                Some(PlaylistEntry {
                    track: TrackId::new(item.child_i32("dmap.itemid")?),
                    container_item_id: ContainerItemId::new(
                        item.child_i32("dmap.containeritemid")?,
                    ),
                })
            })
            .collect();
        Ok(Self {
            update_type: update_type(node),
            entries,
            deleted: deleted_ids(node)
                .into_iter()
                .map(ContainerItemId::new)
                .collect(),
        })
    }
}
