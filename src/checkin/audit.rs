// src/checkin/audit.rs

//! Fire-and-forget destinations for transaction records.

use tokio::sync::mpsc;

use crate::model::Transaction;

/// Accepts an audit record without blocking the caller and without reporting
/// failure back; a lost record is logged, never retried.
pub trait AuditSink: Send + Sync {
    fn record(&self, tx: Transaction);
}

/// Hands records to the batched `DbWriter` through a bounded queue.
#[derive(Clone)]
pub struct ChannelAudit {
    tx: mpsc::Sender<Transaction>,
}

impl ChannelAudit {
    pub fn new(tx: mpsc::Sender<Transaction>) -> Self {
        Self { tx }
    }
}

impl AuditSink for ChannelAudit {
    fn record(&self, tx: Transaction) {
        if let Err(e) = self.tx.try_send(tx) {
            metrics::counter!("audit_dropped_total").increment(1);
            log::warn!("audit record dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketType;

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = ChannelAudit::new(tx);

        sink.record(Transaction::scan("Jo", TicketType::Entry));
        sink.record(Transaction::scan("Al", TicketType::Entry));

        assert_eq!(rx.try_recv().unwrap().participant_name, "Jo");
        assert!(rx.try_recv().is_err());
    }
}
