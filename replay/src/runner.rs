//! Drives a [`Scenario`] against an [`EngagementLedger`] on a manual clock.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use engage_core::{
    EngagementLedger, EngagementSnapshot, EngagementTag, EntityId, LedgerConfig, ManualClock,
    TagError, Timestamp,
};
use engage_types::formatting::{decimal_seconds_left, whole_seconds_left};
use serde::Serialize;
use uuid::Uuid;

use crate::scenario::{Action, Scenario};

/// One `report` step as printed on stdout.
#[derive(Debug, Serialize)]
struct ReportLine<'a> {
    at_ms: u64,
    subject: &'a str,
    current_opponent: Option<&'a str>,
    opponents: Vec<&'a str>,
    /// Whole seconds until the subject leaves combat
    time_left: u64,
    /// Same, with one decimal
    time_left_decimal: String,
    snapshot: EngagementSnapshot,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub reports: usize,
    pub rejected: usize,
}

pub struct Replay {
    ledger: EngagementLedger,
    clock: Arc<ManualClock>,
    start: Timestamp,
    ids: HashMap<String, EntityId>,
    names: HashMap<EntityId, String>,
}

impl Replay {
    pub fn new(config: LedgerConfig, start: Timestamp) -> Self {
        let clock = Arc::new(ManualClock::new(start));
        Self {
            ledger: EngagementLedger::new(config, clock.clone()),
            clock,
            start,
            ids: HashMap::new(),
            names: HashMap::new(),
        }
    }

    fn id_for(&mut self, name: &str) -> EntityId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.ids.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        id
    }

    /// Run every step in time order, writing report lines to `out`.
    ///
    /// Rejected tags are logged and counted; they do not stop the replay.
    pub fn run(
        &mut self,
        scenario: &Scenario,
        out: &mut impl Write,
    ) -> std::io::Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for step in scenario.ordered_steps() {
            self.clock.set(self.start);
            self.clock.advance(Duration::from_millis(step.at_ms));
            summary.steps += 1;

            match &step.action {
                Action::Tag {
                    subject,
                    opponent,
                    tag_type,
                    duration_ms,
                } => {
                    let subject = self.id_for(subject);
                    let opponent = opponent.as_deref().map(|name| self.id_for(name));
                    let result = match duration_ms {
                        Some(ms) => EngagementTag::lasting(
                            opponent,
                            *tag_type,
                            self.clock_now(),
                            Duration::from_millis(*ms),
                        )
                        .and_then(|tag| self.ledger.add_tag(subject, tag)),
                        None => self.ledger.tag(subject, opponent, *tag_type).map(|_| ()),
                    };
                    if let Err(err) = result {
                        self.log_rejection(step.at_ms, &err);
                        summary.rejected += 1;
                    }
                }
                Action::Remove { subject, opponent } => {
                    let subject = self.id_for(subject);
                    let opponent = self.id_for(opponent);
                    self.ledger.remove_opponent(&subject, &opponent);
                }
                Action::Untag { subject } => {
                    let subject = self.id_for(subject);
                    self.ledger.untag(&subject);
                }
                Action::Evict => {
                    self.ledger.evict_idle();
                }
                Action::Report { subject } => {
                    self.report(step.at_ms, subject, out)?;
                    summary.reports += 1;
                }
            }
        }

        tracing::info!(
            steps = summary.steps,
            reports = summary.reports,
            rejected = summary.rejected,
            "Replay finished"
        );
        Ok(summary)
    }

    fn clock_now(&self) -> Timestamp {
        self.ledger.now()
    }

    fn log_rejection(&self, at_ms: u64, err: &TagError) {
        tracing::warn!(at_ms, error = %err, "Scenario tag rejected");
    }

    fn report(&mut self, at_ms: u64, subject: &str, out: &mut impl Write) -> std::io::Result<()> {
        let id = self.id_for(subject);
        let snapshot = self.ledger.snapshot(&id);

        // Names stand in for live objects; every named entity resolves.
        let resolve = |opponent: EntityId| self.names.get(&opponent).map(String::as_str);
        let opponents: Vec<&str> = snapshot
            .tags
            .iter()
            .filter_map(|view| view.opponent)
            .filter_map(resolve)
            .collect();

        let remaining = snapshot.remaining();
        let line = ReportLine {
            at_ms,
            subject,
            current_opponent: opponents.first().copied(),
            opponents: opponents.clone(),
            time_left: whole_seconds_left(remaining),
            time_left_decimal: decimal_seconds_left(remaining, 1, false),
            snapshot,
        };
        serde_json::to_writer(&mut *out, &line)?;
        writeln!(out)
    }
}
