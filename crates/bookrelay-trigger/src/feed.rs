//! Change-feed listener — streams booking writes from the realtime database
//! over SSE (`text/event-stream`) and pairs each write with its previous
//! value.
//!
//! The upstream stream only carries *new* values, so the listener keeps an
//! in-process mirror of the watched subtree; the mirror survives reconnects
//! within one process. The initial snapshot frame primes the mirror without
//! emitting events — restarting the relay must not re-notify old bookings.

use bookrelay_core::config::FeedConfig;
use bookrelay_core::error::{RelayError, Result};
use bookrelay_core::types::{Booking, ChangeEvent};
use futures::stream::Stream;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Streaming listener over the booking tree.
pub struct BookingFeed {
    client: reqwest::Client,
    stream_url: String,
    reconnect_secs: u64,
}

impl BookingFeed {
    /// `fallback_base` is used when the feed has no base URL of its own
    /// (the common case: feed and registry live in the same database).
    pub fn new(config: &FeedConfig, fallback_base: &str) -> Self {
        let base = if config.base_url.is_empty() {
            fallback_base
        } else {
            &config.base_url
        };
        Self {
            client: reqwest::Client::new(),
            stream_url: format!(
                "{}/{}.json",
                base.trim_end_matches('/'),
                config.bookings_path
            ),
            reconnect_secs: config.reconnect_secs,
        }
    }

    /// Spawn the listener loop — returns a stream of change events.
    pub fn start(self) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut mirror = BookingMirror::default();
            tracing::info!("📡 Booking feed listener started: {}", self.stream_url);

            loop {
                match self.listen_once(&mut mirror, &tx).await {
                    Ok(()) => tracing::warn!("📡 Feed stream ended, reconnecting"),
                    Err(e) => tracing::error!("📡 Feed error: {e}, reconnecting"),
                }
                if tx.is_closed() {
                    tracing::info!("📡 Feed listener stopped (receiver dropped)");
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_secs(self.reconnect_secs)).await;
            }
        });

        ChangeStream { rx }
    }

    /// One connection lifetime: read SSE frames until the stream closes.
    async fn listen_once(
        &self,
        mirror: &mut BookingMirror,
        tx: &mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<()> {
        let response = self
            .client
            .get(&self.stream_url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| RelayError::Feed(format!("Feed connect failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RelayError::Feed(format!(
                "Feed stream returned {}",
                response.status()
            )));
        }

        let mut bytes = response.bytes_stream();
        let mut parser = SseParser::default();
        let mut lines = LineBuffer::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| RelayError::Feed(format!("Feed read failed: {e}")))?;
            for line in lines.push_chunk(&chunk) {
                if let Some(message) = parser.push_line(&line) {
                    for event in handle_message(mirror, message) {
                        if tx.send(event).is_err() {
                            return Ok(());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Stream of change events from the listener task.
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Stream for ChangeStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for ChangeStream {}

// --- SSE framing ---

/// Splits the raw byte stream into lines. A multi-byte character can
/// straddle a network chunk boundary, so bytes stay undecoded until a
/// complete line is buffered (`\n` never occurs inside a UTF-8 sequence).
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }
}

/// One complete SSE message.
#[derive(Debug, PartialEq, Eq)]
struct SseMessage {
    event: String,
    data: String,
}

/// Incremental SSE line parser. Frames end on a blank line.
#[derive(Default)]
struct SseParser {
    event: String,
    data: String,
}

impl SseParser {
    fn push_line(&mut self, line: &str) -> Option<SseMessage> {
        if line.is_empty() {
            if self.event.is_empty() && self.data.is_empty() {
                return None;
            }
            return Some(SseMessage {
                event: std::mem::take(&mut self.event),
                data: std::mem::take(&mut self.data),
            });
        }
        if let Some(rest) = line.strip_prefix("event:") {
            self.event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // Comment lines (":…") and unknown fields are ignored.
        None
    }
}

/// Interpret one SSE message against the mirror.
fn handle_message(mirror: &mut BookingMirror, message: SseMessage) -> Vec<ChangeEvent> {
    match message.event.as_str() {
        "put" | "patch" => {
            let frame: serde_json::Value = match serde_json::from_str(&message.data) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("⚠️ Malformed feed frame, skipping: {e}");
                    return Vec::new();
                }
            };
            let path = frame["path"].as_str().unwrap_or("/").to_string();
            let data = frame.get("data").cloned().unwrap_or(serde_json::Value::Null);
            if message.event == "put" {
                mirror.apply_put(&path, data)
            } else {
                mirror.apply_patch(&path, data)
            }
        }
        "keep-alive" => Vec::new(),
        "cancel" | "auth_revoked" => {
            tracing::warn!("📡 Feed sent '{}', stream will drop", message.event);
            Vec::new()
        }
        other => {
            tracing::debug!("📡 Ignoring feed event '{other}'");
            Vec::new()
        }
    }
}

// --- Mirror ---

/// Local copy of the watched booking tree: provider → booking → record.
#[derive(Default)]
struct BookingMirror {
    tree: serde_json::Value,
}

impl BookingMirror {
    /// Apply a `put` (replace at path). Returns the change events the write
    /// implies. A root-level put is the initial snapshot: it primes the
    /// mirror silently.
    fn apply_put(&mut self, path: &str, data: serde_json::Value) -> Vec<ChangeEvent> {
        let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segs.as_slice() {
            &[] => {
                self.tree = data;
                tracing::info!("📡 Feed snapshot primed");
                Vec::new()
            }
            &[provider] => {
                // Whole-provider write: every booking that exists on either
                // side of the write is affected, including ones it removes.
                let mut affected: BTreeSet<String> = child_keys(value_at(&self.tree, &[provider]));
                affected.extend(child_keys(Some(&data)));

                let previous: Vec<(String, Option<Booking>)> = affected
                    .iter()
                    .map(|b| {
                        (
                            b.clone(),
                            to_booking(value_at(&self.tree, &[provider, b.as_str()])),
                        )
                    })
                    .collect();

                set_path(&mut self.tree, &segs, data);

                previous
                    .into_iter()
                    .map(|(booking_id, prev)| ChangeEvent {
                        provider_id: provider.to_string(),
                        booking_id: booking_id.clone(),
                        previous: prev,
                        current: to_booking(value_at(&self.tree, &[provider, booking_id.as_str()])),
                    })
                    .collect()
            }
            &[provider, booking, ..] => {
                let previous = to_booking(value_at(&self.tree, &[provider, booking]));
                set_path(&mut self.tree, &segs, data);
                vec![ChangeEvent {
                    provider_id: provider.to_string(),
                    booking_id: booking.to_string(),
                    previous,
                    current: to_booking(value_at(&self.tree, &[provider, booking])),
                }]
            }
        }
    }

    /// Apply a `patch` (merge at path): each entry is a put of one child.
    fn apply_patch(&mut self, path: &str, data: serde_json::Value) -> Vec<ChangeEvent> {
        let Some(entries) = data.as_object() else {
            tracing::warn!("⚠️ Patch frame without an object body, skipping");
            return Vec::new();
        };
        let base = path.trim_end_matches('/');
        entries
            .iter()
            .flat_map(|(key, value)| self.apply_put(&format!("{base}/{key}"), value.clone()))
            .collect()
    }
}

fn value_at<'a>(tree: &'a serde_json::Value, segs: &[&str]) -> Option<&'a serde_json::Value> {
    segs.iter().try_fold(tree, |v, s| v.get(*s))
}

fn child_keys(value: Option<&serde_json::Value>) -> BTreeSet<String> {
    value
        .and_then(|v| v.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

/// Replace the subtree at `segs` with `data`; null deletes the node.
fn set_path(tree: &mut serde_json::Value, segs: &[&str], data: serde_json::Value) {
    let Some((first, rest)) = segs.split_first() else {
        *tree = data;
        return;
    };
    if !tree.is_object() {
        *tree = serde_json::Value::Object(serde_json::Map::new());
    }
    let Some(obj) = tree.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        if data.is_null() {
            obj.remove(*first);
        } else {
            obj.insert(first.to_string(), data);
        }
    } else {
        let child = obj
            .entry(first.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        set_path(child, rest, data);
    }
}

/// Parse a mirror node into a booking; null, empty, or malformed records
/// are treated as absent.
fn to_booking(value: Option<&serde_json::Value>) -> Option<Booking> {
    let value = value?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value::<Booking>(value.clone()) {
        Ok(booking) if !booking.is_blank() => Some(booking),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("⚠️ Malformed booking record, treating as absent: {e}");
            None
        }
    }
}
