// src/scanner/session.rs

//! # Scanner Session
//!
//! Drives check-ins from a stream of `ScanEvent`s for one scanner.
//!
//! **Behaviour:**
//! - At most one check-in is in flight; `scan` takes `&mut self`.
//! - With `pause_while_busy`, payloads that arrived during a lookup are
//!   discarded afterwards, like a camera that stops capturing until the
//!   operator has seen the result. Ticket switches are still applied.
//! - Each lookup is bounded by `lookup_timeout`; running out is reported as
//!   `StoreUnavailable` and the session carries on.
//! - Every scan produces exactly one `ScanReport`.

use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::checkin::{CheckIn, CheckInEngine, CheckInError};
use crate::checkin_log;
use crate::config::ScannerConfig;
use crate::db::{ParticipantStore, StoreError};
use crate::model::TicketType;
use crate::scanner::source::ScanEvent;
use log::Level;

/// Outcome of one scan, as shown to the operator.
#[derive(Debug)]
pub struct ScanReport {
    pub code: String,
    pub ticket: TicketType,
    pub outcome: Result<CheckIn, CheckInError>,
}

impl ScanReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct ScannerSession<S: ParticipantStore> {
    engine: Arc<CheckInEngine<S>>,
    ticket: TicketType,
    lookup_timeout: Duration,
    pause_while_busy: bool,
}

impl<S: ParticipantStore + 'static> ScannerSession<S> {
    pub fn new(engine: Arc<CheckInEngine<S>>, cfg: &ScannerConfig) -> Self {
        Self {
            engine,
            ticket: cfg.ticket,
            lookup_timeout: cfg.lookup_timeout,
            pause_while_busy: cfg.pause_while_busy,
        }
    }

    pub fn ticket(&self) -> TicketType {
        self.ticket
    }

    pub fn select(&mut self, ticket: TicketType) {
        self.ticket = ticket;
        checkin_log!(Level::Info, "scanner", "scanning for {} ({})", ticket, ticket.color());
    }

    pub fn next_ticket(&mut self) -> TicketType {
        self.select(self.ticket.next());
        self.ticket
    }

    pub fn prev_ticket(&mut self) -> TicketType {
        self.select(self.ticket.prev());
        self.ticket
    }

    /// One check-in for the selected ticket type, bounded by the lookup timeout.
    pub async fn scan(&mut self, code: &str) -> ScanReport {
        let ticket = self.ticket;
        let outcome = match tokio::time::timeout(self.lookup_timeout, self.engine.check_in(code, ticket)).await {
            Ok(result) => result,
            Err(_) => {
                checkin_log!(Level::Warn, "scanner", "lookup for {:?} timed out", code);
                Err(CheckInError::StoreUnavailable(StoreError::Timeout(self.lookup_timeout)))
            }
        };
        ScanReport { code: code.to_owned(), ticket, outcome }
    }

    fn apply_control(&mut self, ev: &ScanEvent) -> bool {
        match ev {
            ScanEvent::NextTicket => { self.next_ticket(); true }
            ScanEvent::PrevTicket => { self.prev_ticket(); true }
            ScanEvent::Payload(_) => false,
        }
    }

    /// Process events until the source closes or the report receiver goes
    /// away. Returns the session so its ticket selection survives.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ScanEvent>,
        reports: mpsc::Sender<ScanReport>,
    ) -> Self {
        checkin_log!(Level::Info, "scanner", "session ready, scanning for {}", self.ticket);

        while let Some(ev) = events.recv().await {
            let code = match ev {
                ScanEvent::Payload(code) => code,
                control => {
                    self.apply_control(&control);
                    continue;
                }
            };

            let report = self.scan(&code).await;

            if self.pause_while_busy {
                while let Ok(pending) = events.try_recv() {
                    if !self.apply_control(&pending) {
                        checkin_log!(Level::Debug, "scanner", "discarded {:?} read while busy", pending);
                    }
                }
            }

            if reports.send(report).await.is_err() {
                break;
            }
        }

        checkin_log!(Level::Info, "scanner", "session closed");
        self
    }
}
