//! Sink implementations for terminal pipeline outputs.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use eventide_core::{Event, EventKind};

use crate::stream::Stream;

/// Trait for event sinks.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name of this sink
    fn name(&self) -> &str;

    /// Send an event to this sink
    async fn send(&self, event: &Event) -> Result<()>;

    /// Flush any buffered data
    async fn flush(&self) -> Result<()>;

    /// Close the sink
    async fn close(&self) -> Result<()>;
}

/// Console sink - prints to stdout.
pub struct ConsoleSink {
    name: String,
    pretty: bool,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: &Event) -> Result<()> {
        if self.pretty {
            let clock = DateTime::from_timestamp_millis(event.timestamp)
                .map(|t| t.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| event.timestamp.to_string());
            let payload = serde_json::from_slice::<serde_json::Value>(&event.payload)
                .unwrap_or(serde_json::Value::Null);
            println!("[{}] {:?} | {}", clock, event.kind, payload);
        } else {
            println!("{}", serde_json::to_string(event)?);
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// File sink - appends result events as JSON lines.
///
/// Only Regular events are recorded; watermarks are progress signals, not
/// results.
#[allow(dead_code)]
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: &Event) -> Result<()> {
        if event.kind != EventKind::Regular {
            return Ok(());
        }
        let json = serde_json::to_string(event)?;
        let mut file = self.file.lock().await;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush()?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.flush().await
    }
}

/// Multi-sink that broadcasts to multiple sinks.
pub struct MultiSink {
    name: String,
    sinks: Vec<Box<dyn Sink>>,
}

impl MultiSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sinks: Vec::new(),
        }
    }

    pub fn add(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl Sink for MultiSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: &Event) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event).await {
                error!("Sink {} error: {}", sink.name(), e);
            }
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.flush().await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for sink in &self.sinks {
            sink.close().await?;
        }
        Ok(())
    }
}

/// Drain a stream into a sink, flushing and closing at end-of-stream.
pub fn spawn_sink(mut stream: Stream, sink: Box<dyn Sink>) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            sink.send(&event).await?;
        }
        debug!(sink = sink.name(), "stream exhausted, closing sink");
        sink.close().await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::channel;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_console_sink() {
        let sink = ConsoleSink::new("test");
        let event = Event::encode(42, &(7i32, 2i32)).unwrap();
        assert!(sink.send(&event).await.is_ok());
    }

    #[tokio::test]
    async fn test_console_sink_compact() {
        let sink = ConsoleSink::new("test").compact();
        assert!(!sink.pretty);
        let event = Event::regular(42, vec![]);
        assert!(sink.send(&event).await.is_ok());
        assert!(sink.flush().await.is_ok());
        assert!(sink.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_sink_records_regular_events() {
        let temp_file = NamedTempFile::new().unwrap();
        let sink = FileSink::new("results", temp_file.path()).unwrap();

        let event = Event::encode(42, &(7i32, 2i32)).unwrap();
        sink.send(&event).await.unwrap();
        sink.flush().await.unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(contents.contains("\"timestamp\":42"));
    }

    #[tokio::test]
    async fn test_file_sink_skips_watermarks() {
        let temp_file = NamedTempFile::new().unwrap();
        let sink = FileSink::new("results", temp_file.path()).unwrap();

        sink.send(&Event::watermark(100)).await.unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn test_multi_sink_broadcasts() {
        let temp_file = NamedTempFile::new().unwrap();
        let file_sink = FileSink::new("file", temp_file.path()).unwrap();
        let multi = MultiSink::new("multi")
            .add(Box::new(ConsoleSink::new("console")))
            .add(Box::new(file_sink));

        let event = Event::regular(7, b"{}".to_vec());
        multi.send(&event).await.unwrap();
        multi.flush().await.unwrap();
        multi.close().await.unwrap();

        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(contents.contains("\"timestamp\":7"));
    }

    #[tokio::test]
    async fn test_spawn_sink_drains_and_closes() {
        let temp_file = NamedTempFile::new().unwrap();
        let sink = FileSink::new("results", temp_file.path()).unwrap();
        let (tx, rx) = channel("results", 16);
        let handle = spawn_sink(rx, Box::new(sink));

        tx.send(Event::regular(1, b"1".to_vec())).await.unwrap();
        tx.send(Event::watermark(5)).await.unwrap();
        tx.send(Event::regular(2, b"2".to_vec())).await.unwrap();
        drop(tx);

        handle.await.unwrap().unwrap();
        let contents = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
