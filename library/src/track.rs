//! Tracks and their DAAP field mapping.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use wire::{ContentNode, ContentValue};

use crate::types::{ContainerItemId, TrackId};

/// Item kind value DAAP uses for audio tracks.
pub const ITEM_KIND_AUDIO: u8 = 2;

/// Fields requested when the caller does not pass `meta`.
pub const DEFAULT_META: &[&str] = &[
    "dmap.itemid",
    "dmap.itemname",
    "dmap.itemkind",
    "dmap.persistentid",
    "daap.songalbum",
    "daap.songartist",
    "daap.songformat",
    "daap.songgenre",
    "daap.songtime",
    "daap.songsize",
    "daap.songyear",
    "daap.songtracknumber",
    "daap.songtrackcount",
    "daap.songdiscnumber",
    "daap.songdisccount",
    "daap.songbitrate",
    "daap.songdateadded",
    "daap.songdatemodified",
];

/// A single track.
///
/// The id is owned by the database the track lives in and is assigned when
/// the track is added. Equality compares every field, so an upsert of an
/// identical track is recognisable as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Track {
    id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    /// File extension style format, e.g. `mp3`.
    pub format: String,
    pub year: i16,
    pub duration: Duration,
    pub size: u64,
    pub track_number: i16,
    pub track_count: i16,
    pub disc_number: i16,
    pub disc_count: i16,
    /// Kilobits per second.
    pub bitrate: i16,
    pub date_added: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    /// Server-local path of the audio data. Never sent over the wire.
    pub file: Option<PathBuf>,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Creates a track that already carries an id, as read from a peer.
    #[must_use]
    pub fn with_id(id: TrackId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn id(&self) -> TrackId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TrackId) {
        self.id = id;
    }

    fn field_value(&self, field: &str) -> Option<ContentValue> {
        let value = match field {
            "dmap.itemid" => ContentValue::Int(self.id.raw()),
            "dmap.itemname" => ContentValue::String(self.title.clone()),
            "dmap.itemkind" => ContentValue::Byte(ITEM_KIND_AUDIO),
            "dmap.persistentid" => ContentValue::Long(i64::from(self.id.raw())),
            "daap.songalbum" => ContentValue::String(self.album.clone()),
            "daap.songartist" => ContentValue::String(self.artist.clone()),
            "daap.songformat" => ContentValue::String(self.format.clone()),
            "daap.songgenre" => ContentValue::String(self.genre.clone()),
            "daap.songbitrate" => ContentValue::Short(self.bitrate),
            "daap.songdateadded" => ContentValue::Date(wire_date(self.date_added?)),
            "daap.songdatemodified" => ContentValue::Date(wire_date(self.date_modified?)),
            "daap.songdisccount" => ContentValue::Short(self.disc_count),
            "daap.songdiscnumber" => ContentValue::Short(self.disc_number),
            "daap.songsize" => ContentValue::Int(i32::try_from(self.size).unwrap_or(i32::MAX)),
            "daap.songtime" => {
                ContentValue::Int(i32::try_from(self.duration.as_millis()).unwrap_or(i32::MAX))
            }
            "daap.songtrackcount" => ContentValue::Short(self.track_count),
            "daap.songtracknumber" => ContentValue::Short(self.track_number),
            "daap.songyear" => ContentValue::Short(self.year),
            // recognised but not modelled
            "daap.songgrouping"
            | "daap.songcomment"
            | "daap.songcomposer"
            | "daap.songeqpreset"
            | "daap.songdescription"
            | "daap.songdataurl" => ContentValue::String(String::new()),
            "daap.songbeatsperminute" => ContentValue::Short(0),
            "daap.songcompilation"
            | "daap.songdisabled"
            | "daap.songuserrating"
            | "daap.songdatakind" => ContentValue::Byte(0),
            "daap.songrelativevolume" => ContentValue::SignedByte(0),
            "daap.songsamplerate" | "daap.songstarttime" | "daap.songstoptime" => {
                ContentValue::Int(0)
            }
            _ => return None,
        };
        Some(value)
    }

    /// Renders the track as a `dmap.listingitem` holding the requested fields.
    ///
    /// Fields keep the requested order, except `dmap.itemkind`, which always
    /// comes first. Unknown field names are skipped.
    pub fn to_listing_item<S: AsRef<str>>(&self, fields: &[S]) -> ContentNode {
        let mut children = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            let Some(value) = self.field_value(field) else {
                continue;
            };
            let node = ContentNode::new(field, value);
            if field == "dmap.itemkind" {
                children.insert(0, node);
            } else {
                children.push(node);
            }
        }
        ContentNode::container("dmap.listingitem", children)
    }

    /// Renders the track as an entry of a playlist listing.
    #[must_use]
    pub fn to_playlist_item(&self, container_item_id: ContainerItemId) -> ContentNode {
        ContentNode::container(
            "dmap.listingitem",
            vec![
                ContentNode::new("dmap.itemkind", ITEM_KIND_AUDIO),
                ContentNode::new("daap.songdatakind", 0u8),
                ContentNode::new("dmap.itemid", self.id.raw()),
                ContentNode::new("dmap.containeritemid", container_item_id.raw()),
                ContentNode::new("dmap.itemname", self.title.as_str()),
            ],
        )
    }

    /// Reads a track back from a `dmap.listingitem`. Unknown fields are ignored.
    #[must_use]
    pub fn from_listing_item(node: &ContentNode) -> Self {
        let mut track = Self::default();
        for field in node.children() {
            let short = || field.as_integer().and_then(|v| i16::try_from(v).ok());
            match field.name.as_str() {
                "dmap.itemid" => track.id = field.as_i32().map(TrackId::new).unwrap_or_default(),
                "dmap.itemname" => track.title = text(field),
                "daap.songartist" => track.artist = text(field),
                "daap.songalbum" => track.album = text(field),
                "daap.songgenre" => track.genre = text(field),
                "daap.songformat" => track.format = text(field),
                "daap.songtime" => {
                    let millis = field.as_integer().unwrap_or(0);
                    track.duration = Duration::from_millis(u64::try_from(millis).unwrap_or(0));
                }
                "daap.songsize" => {
                    track.size = field
                        .as_integer()
                        .and_then(|v| u64::try_from(v).ok())
                        .unwrap_or(0);
                }
                "daap.songyear" => track.year = short().unwrap_or(0),
                "daap.songtracknumber" => track.track_number = short().unwrap_or(0),
                "daap.songtrackcount" => track.track_count = short().unwrap_or(0),
                "daap.songdiscnumber" => track.disc_number = short().unwrap_or(0),
                "daap.songdisccount" => track.disc_count = short().unwrap_or(0),
                "daap.songbitrate" => track.bitrate = short().unwrap_or(0),
                "daap.songdateadded" => track.date_added = field.as_date(),
                "daap.songdatemodified" => track.date_modified = field.as_date(),
                _ => {}
            }
        }
        track
    }
}

/// Clamps a date into the 32-bit second range DMAP dates carry.
fn wire_date(date: DateTime<Utc>) -> DateTime<Utc> {
    let secs = date.timestamp();
    let clamped = secs.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    if clamped == secs {
        return date;
    }
    Utc.timestamp_opt(clamped, 0).single().unwrap_or(date)
}

fn text(node: &ContentNode) -> String {
    node.as_str().unwrap_or_default().to_owned()
}

/// Splits a `meta` query value into field names.
///
/// Accepts raw commas and the `%2C` escape some clients send.
pub fn parse_meta(raw: &str) -> Vec<String> {
    raw.replace("%2C", ",")
        .replace("%2c", ",")
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect()
}
