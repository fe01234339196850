use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use wire::{decode, encode, ContentCodeBag, ContentNode, Limits};

fn track_listing(tracks: i32) -> ContentNode {
    let items = (1..=tracks)
        .map(|id| {
            ContentNode::container(
                "dmap.listingitem",
                vec![
                    ContentNode::new("dmap.itemkind", 2u8),
                    ContentNode::new("dmap.itemid", id),
                    ContentNode::new("dmap.itemname", format!("Track {id}")),
                    ContentNode::new("daap.songartist", "Artist"),
                    ContentNode::new("daap.songalbum", "Album"),
                    ContentNode::new("daap.songtime", 215_000),
                    ContentNode::new("daap.songtracknumber", 3i16),
                ],
            )
        })
        .collect();
    ContentNode::container(
        "daap.databasesongs",
        vec![
            ContentNode::new("dmap.status", 200),
            ContentNode::new("dmap.updatetype", 0u8),
            ContentNode::new("dmap.specifiedtotalcount", tracks),
            ContentNode::new("dmap.returnedcount", tracks),
            ContentNode::container("dmap.listing", items),
        ],
    )
}

fn bench_listing(c: &mut Criterion) {
    let bag = ContentCodeBag::builtin();
    let listing = track_listing(10_000);
    let bytes = encode(&bag, &listing).expect("encode listing");
    let limits = Limits::default();

    c.bench_function("encode_10k_tracks", |b| {
        b.iter(|| encode(&bag, black_box(&listing)).expect("encode"));
    });
    c.bench_function("decode_10k_tracks", |b| {
        b.iter(|| decode(&bag, black_box(&bytes), &limits).expect("decode"));
    });
}

criterion_group!(benches, bench_listing);
criterion_main!(benches);
