// src/checkin/engine.rs

//! # Check-in Engine
//!
//! The one state transition this system owns: a participant's ticket flag goes
//! from unset to set, exactly once, with one audit record per success.
//!
//! `check_in` steps:
//! 1. reject malformed codes before touching the store;
//! 2. fetch the participant (`NotFound` when absent);
//! 3. refuse when the flag is already set (`AlreadyCheckedIn`, no write);
//! 4. conditional update, then fire-and-forget audit append.
//!
//! If the audit append is lost after the flag write succeeded the two stay
//! out of step; nothing reconciles them.

use std::sync::Arc;

use crate::checkin::{
    code::{is_valid_code, IdSource, RandomIds},
    AuditSink, CheckInError,
};
use crate::checkin_log;
use crate::db::ParticipantStore;
use crate::model::{Participant, TicketType, Transaction};
use log::Level;

pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 20;

/// A completed check-in: the participant as stored after the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub participant: Participant,
    pub ticket: TicketType,
}

pub struct CheckInEngine<S: ParticipantStore> {
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
    ids: Box<dyn IdSource>,
    max_id_attempts: u32,
}

impl<S: ParticipantStore> CheckInEngine<S> {
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            ids: Box::new(RandomIds),
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }

    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_max_id_attempts(mut self, attempts: u32) -> Self {
        self.max_id_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn check_in(&self, code: &str, ticket: TicketType) -> Result<CheckIn, CheckInError> {
        let result = self.try_check_in(code, ticket).await;
        let outcome = match &result {
            Ok(_)  => "checked_in",
            Err(e) => e.kind(),
        };
        metrics::counter!("checkin_total", "ticket" => ticket.field(), "outcome" => outcome)
            .increment(1);
        result
    }

    async fn try_check_in(&self, code: &str, ticket: TicketType) -> Result<CheckIn, CheckInError> {
        if !is_valid_code(code) {
            checkin_log!(Level::Info, "engine", "rejected malformed code {:?}", code);
            return Err(CheckInError::InvalidCode(code.to_owned()));
        }

        let mut participant = self
            .store
            .get(code)
            .await?
            .ok_or_else(|| CheckInError::NotFound(code.to_owned()))?;

        let already = |p: &Participant| CheckInError::AlreadyCheckedIn {
            code: code.to_owned(),
            name: p.name.clone(),
            ticket,
        };

        if participant.is_checked_in(ticket) {
            checkin_log!(Level::Info, "engine", "{} already checked in for {}", code, ticket);
            return Err(already(&participant));
        }

        // Another scanner may have won between the read and this write.
        if !self.store.mark_checked_in(code, ticket).await? {
            checkin_log!(Level::Warn, "engine", "{} lost a concurrent check-in for {}", code, ticket);
            return Err(already(&participant));
        }
        participant.mark_checked_in(ticket);

        self.audit.record(Transaction::scan(participant.name.clone(), ticket));
        checkin_log!(Level::Info, "engine", "{} ({}) checked in for {}", participant.name, code, ticket);

        Ok(CheckIn { participant, ticket })
    }

    /// A fresh identifier not present in the store at the time of the call.
    pub async fn allocate_id(&self) -> Result<String, CheckInError> {
        let mut remaining = self.max_id_attempts;
        self.allocate_id_within(&mut remaining).await
    }

    /// Draws candidates until one is free, spending from `remaining`.
    async fn allocate_id_within(&self, remaining: &mut u32) -> Result<String, CheckInError> {
        while *remaining > 0 {
            *remaining -= 1;
            let candidate = self.ids.candidate();
            if !self.store.exists(&candidate).await? {
                checkin_log!(Level::Debug, "engine", "allocated {} ({} attempt(s) left)", candidate, remaining);
                return Ok(candidate);
            }
        }
        checkin_log!(Level::Error, "engine", "id allocation gave up after {} attempts", self.max_id_attempts);
        Err(CheckInError::AllocationExhausted(self.max_id_attempts))
    }

    /// Add-participant flow: unique name, freshly allocated id, all flags unset.
    /// Ids lost to a concurrent insert count against the same attempt budget.
    pub async fn register(&self, name: &str) -> Result<Participant, CheckInError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CheckInError::InvalidName);
        }
        if !self.store.find_by_name(name).await?.is_empty() {
            return Err(CheckInError::DuplicateName(name.to_owned()));
        }

        let mut remaining = self.max_id_attempts;
        loop {
            let participant = Participant::new(self.allocate_id_within(&mut remaining).await?, name);
            if self.store.insert(&participant).await? {
                checkin_log!(Level::Info, "engine", "registered {} as {}", participant.name, participant.id);
                return Ok(participant);
            }
            checkin_log!(Level::Debug, "engine", "id {} taken before insert, retrying", participant.id);
        }
    }
}
