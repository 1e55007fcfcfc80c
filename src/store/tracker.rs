// src/store/tracker.rs

use serde::Serialize;

/// Fetch lifecycle status of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Finished,
    Error,
}

/// Handle for one in-flight fetch. Consumed on completion so a fetch can
/// settle exactly once.
#[derive(Debug)]
#[must_use = "a fetch ticket must be settled with finish or fail"]
pub struct FetchTicket {
    seq: u64,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Status state machine wrapping a collection's fetches.
///
/// `begin` always moves to `Loading`; each settled fetch moves to `Finished` or
/// `Error`. With overlapping fetches the last one to settle decides the status.
#[derive(Debug, Clone, Default)]
pub struct AsyncOperationTracker {
    status: Status,
    error: Option<String>,
    issued: u64,
    in_flight: u32,
}

impl AsyncOperationTracker {
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.in_flight += 1;
        self.status = Status::Loading;
        FetchTicket { seq: self.issued }
    }

    pub fn finish(&mut self, ticket: FetchTicket) {
        self.settle(ticket);
        self.status = Status::Finished;
        self.error = None;
    }

    pub fn fail(&mut self, ticket: FetchTicket, message: impl Into<String>) {
        self.settle(ticket);
        self.status = Status::Error;
        self.error = Some(message.into());
    }

    fn settle(&mut self, ticket: FetchTicket) {
        debug_assert!(ticket.seq <= self.issued);
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }
}
