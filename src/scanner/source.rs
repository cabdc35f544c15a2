//! Scan sources + triage.
//! -----------------------------------------------------------------------------
//! A **source** produces raw decoded payloads (one string per QR read) and
//! hands them to a small **triage** task that turns them into `ScanEvent`s:
//!   • blank payloads are dropped;
//!   • `>` / `<` switch the selected ticket type forward / backward;
//!   • anything else is a code to check in, trimmed.
//!
//! The camera itself lives outside this crate; `ChannelSource` is fed by
//! whatever decodes frames (the CLI feeds it stdin lines).

use std::sync::Arc;
use async_trait::async_trait;
use crossbeam::channel::Receiver as CbReceiver;
use tokio::{sync::mpsc, task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Payload(String),
    NextTicket,
    PrevTicket,
}

#[async_trait]
pub trait ScanSource: Send + Sync + 'static {
    /// Display name for logs.
    fn name(&self) -> &'static str;

    /// Capacity of the per-source raw and triaged queues.
    fn capacity(&self) -> usize { 64 }

    /// Pull payloads from the device and push them into `tx` until the
    /// device closes or nobody listens any more.
    async fn ingest(self: Arc<Self>, tx: mpsc::Sender<String>);

    fn triage(&self, raw: String) -> Option<ScanEvent> {
        match raw.trim() {
            ""      => None,
            ">"     => Some(ScanEvent::NextTicket),
            "<"     => Some(ScanEvent::PrevTicket),
            payload => Some(ScanEvent::Payload(payload.to_owned())),
        }
    }

    /// Launches *ingest* + *triage* and returns the triaged stream.
    fn spawn(self: Arc<Self>) -> mpsc::Receiver<ScanEvent> {
        let name = self.name();
        let cap  = self.capacity();

        let (raw_tx, mut raw_rx) = mpsc::channel::<String>(cap);
        let (out_tx, out_rx) = mpsc::channel::<ScanEvent>(cap);
        let ingest_self = Arc::clone(&self);
        let triage_self = self;

        // ── Task 1: ingest (device-specific) ─────────────────────────────
        task::spawn(async move {
            log::info!("scan source '{name}' started");
            ingest_self.ingest(raw_tx).await;
            log::info!("scan source '{name}' exited");
        });

        // ── Task 2: triage & forward ────────────────────────────────────
        task::spawn(async move {
            while let Some(raw) = raw_rx.recv().await {
                if let Some(ev) = triage_self.triage(raw) {
                    if out_tx.send(ev).await.is_err() {
                        break;
                    }
                }
            }
            log::debug!("triage for '{name}' terminated – chan closed");
        });

        out_rx
    }
}

/// A source that pulls payloads from a crossbeam channel, standing in for the
/// camera's decode callback.
pub struct ChannelSource {
    rx: CbReceiver<String>,
}

impl ChannelSource {
    pub fn new(rx: CbReceiver<String>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl ScanSource for ChannelSource {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn ingest(self: Arc<Self>, tx: mpsc::Sender<String>) {
        // Offload the blocking recv loop to a dedicated OS thread
        let rx = self.rx.clone();
        let joined = task::spawn_blocking(move || {
            while let Ok(payload) = rx.recv() {
                // blocking_send() will block _this_ thread only, never a Tokio worker
                if tx.blocking_send(payload).is_err() {
                    break;
                }
            }
        })
        .await;
        if let Err(e) = joined {
            log::error!("channel ingest task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[tokio::test]
    async fn triage_drops_blanks_and_maps_controls() {
        let (tx, rx) = unbounded();
        let mut events = Arc::new(ChannelSource::new(rx)).spawn();

        for raw in ["  AB12C \n", "", "   ", ">", "<", "zz"] {
            tx.send(raw.to_owned()).unwrap();
        }
        drop(tx);

        let mut got = Vec::new();
        while let Some(ev) = events.recv().await {
            got.push(ev);
        }
        assert_eq!(
            got,
            vec![
                ScanEvent::Payload("AB12C".into()),
                ScanEvent::NextTicket,
                ScanEvent::PrevTicket,
                ScanEvent::Payload("zz".into()),
            ]
        );
    }
}
