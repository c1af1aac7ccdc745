//! End-to-end pipeline tests: two sources feeding a join, a filter, a
//! window aggregate, and a file sink — the reference social-network
//! topology.

use std::io::Write as _;
use std::sync::Arc;

use tempfile::NamedTempFile;

use eventide_runtime::social::{self, PhotoLike, PhotoLikeCount, PhotoTag};
use eventide_runtime::{
    channel, read_events, spawn_replay, spawn_sink, Event, FileSink, FilterOperator, Metrics,
    WindowAggregateOperator, WindowJoinOperator, WindowSpec,
};

fn tag(ts: i64, photo_id: i32, user_id: i32) -> Event {
    Event::encode(ts, &PhotoTag { photo_id, user_id }).unwrap()
}

fn like(ts: i64, user_id: i32, photo_id: i32) -> Event {
    Event::encode(ts, &PhotoLike { user_id, photo_id }).unwrap()
}

fn read_counts(path: &std::path::Path) -> Vec<PhotoLikeCount> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let event: Event = serde_json::from_str(line).unwrap();
            event.decode().unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_tag_like_pipeline_counts_matched_likes() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let spec = WindowSpec::new(10, 20).unwrap();
    let metrics = Metrics::new();

    let (tags_tx, tags_rx) = channel("tags", 64);
    let (likes_tx, likes_rx) = channel("likes", 64);
    let (joined_tx, joined_rx) = channel("joined", 64);
    let (filtered_tx, filtered_rx) = channel("filtered", 64);
    let (counts_tx, counts_rx) = channel("counts", 64);

    let join = WindowJoinOperator::new(
        "tag_like_join",
        spec,
        Arc::new(social::tag_like_join),
        joined_tx,
    )
    .with_metrics(metrics.clone());
    let filter = FilterOperator::new(
        "liked_after_tagged",
        Arc::new(social::liked_after_tagged),
        filtered_tx,
    )
    .with_metrics(metrics.clone());
    let aggregate = WindowAggregateOperator::new(
        "photo_like_count",
        spec,
        Arc::new(social::photo_like_counts),
        counts_tx,
    )
    .with_metrics(metrics.clone());

    let result_file = NamedTempFile::new().unwrap();
    let sink = FileSink::new("results", result_file.path()).unwrap();

    let join_handle = join.spawn(tags_rx, likes_rx);
    let filter_handle = filter.spawn(joined_rx);
    let aggregate_handle = aggregate.spawn(filtered_rx);
    let sink_handle = spawn_sink(counts_rx, Box::new(sink));

    // user 9 is tagged on photo 3 and likes it afterwards: one match.
    // user 4 likes photo 3 without being tagged: no match.
    tags_tx.send(tag(5, 3, 9)).await.unwrap();
    likes_tx.send(like(12, 9, 3)).await.unwrap();
    likes_tx.send(like(14, 4, 3)).await.unwrap();
    tags_tx.send(Event::watermark(60)).await.unwrap();
    likes_tx.send(Event::watermark(60)).await.unwrap();
    drop(tags_tx);
    drop(likes_tx);

    join_handle.await.unwrap().unwrap();
    filter_handle.await.unwrap().unwrap();
    aggregate_handle.await.unwrap().unwrap();
    sink_handle.await.unwrap().unwrap();

    // the single match lands at ts 19 (window 0 close), which the aggregate
    // places in windows 0 and 10; both close under watermark 60
    let counts = read_counts(result_file.path());
    assert_eq!(counts.len(), 2);
    assert!(counts.iter().all(|c| c.photo_id == 3 && c.count == 1));

    let text = metrics.gather();
    assert!(text.contains("eventide_join_matches_total"));
    assert!(text.contains("eventide_windows_closed_total"));
}

#[tokio::test]
async fn test_pipeline_filter_drops_likes_before_tags() {
    let spec = WindowSpec::new(10, 10).unwrap();

    let (tags_tx, tags_rx) = channel("tags", 64);
    let (likes_tx, likes_rx) = channel("likes", 64);
    let (joined_tx, joined_rx) = channel("joined", 64);
    let (filtered_tx, mut filtered_rx) = channel("filtered", 64);

    let join = WindowJoinOperator::new(
        "tag_like_join",
        spec,
        Arc::new(social::tag_like_join),
        joined_tx,
    );
    let filter = FilterOperator::new(
        "liked_after_tagged",
        Arc::new(social::liked_after_tagged),
        filtered_tx,
    );

    let join_handle = join.spawn(tags_rx, likes_rx);
    let filter_handle = filter.spawn(joined_rx);

    // the like precedes the tag in event time: joined, then filtered out
    likes_tx.send(like(2, 9, 3)).await.unwrap();
    tags_tx.send(tag(6, 3, 9)).await.unwrap();
    tags_tx.send(Event::watermark(30)).await.unwrap();
    likes_tx.send(Event::watermark(30)).await.unwrap();
    drop(tags_tx);
    drop(likes_tx);

    join_handle.await.unwrap().unwrap();
    filter_handle.await.unwrap().unwrap();

    let mut regulars = 0;
    let mut watermarks = Vec::new();
    while let Some(event) = filtered_rx.next().await {
        if event.is_watermark() {
            watermarks.push(event.timestamp);
        } else {
            regulars += 1;
        }
    }
    assert_eq!(regulars, 0);
    // the filter forwards the join's combined watermark untouched
    assert_eq!(watermarks, vec![30]);
}

#[tokio::test]
async fn test_pipeline_from_replayed_event_files() {
    let mut tag_file = NamedTempFile::new().unwrap();
    writeln!(
        tag_file,
        r#"{{"timestamp": 5, "kind": "regular", "payload": {{"photo_id": 3, "user_id": 9}}}}"#
    )
    .unwrap();
    writeln!(tag_file, r#"{{"timestamp": 40, "kind": "watermark"}}"#).unwrap();
    tag_file.flush().unwrap();

    let mut like_file = NamedTempFile::new().unwrap();
    writeln!(
        like_file,
        r#"{{"timestamp": 12, "kind": "regular", "payload": {{"user_id": 9, "photo_id": 3}}}}"#
    )
    .unwrap();
    writeln!(like_file, r#"{{"timestamp": 40, "kind": "watermark"}}"#).unwrap();
    like_file.flush().unwrap();

    let spec = WindowSpec::new(10, 20).unwrap();
    let (tags_tx, tags_rx) = channel("tags", 64);
    let (likes_tx, likes_rx) = channel("likes", 64);
    let (joined_tx, mut joined_rx) = channel("joined", 64);

    let join = WindowJoinOperator::new(
        "tag_like_join",
        spec,
        Arc::new(social::tag_like_join),
        joined_tx,
    );
    let join_handle = join.spawn(tags_rx, likes_rx);

    let tag_events = read_events(tag_file.path()).unwrap();
    let like_events = read_events(like_file.path()).unwrap();
    spawn_replay(tag_events, tags_tx).await.unwrap().unwrap();
    spawn_replay(like_events, likes_tx).await.unwrap().unwrap();

    join_handle.await.unwrap().unwrap();

    let mut matches = 0;
    while let Some(event) = joined_rx.next().await {
        if event.is_regular() {
            matches += 1;
            assert_eq!(event.timestamp, 19);
        }
    }
    assert_eq!(matches, 1);
}
