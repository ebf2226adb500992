//! Batch run: mailbox to reservations
//!
//! Every message is handled in isolation. Only failing to list the mailbox
//! aborts a run; anything that goes wrong with one message is recorded in the
//! [`BatchReport`] and the batch moves on.

use crate::decoder::decode_body;
use crate::error::{IntakeError, Result};
use crate::ledger::ProcessedLedger;
use crate::mail::MailSource;
use crate::parser::extract_booking;
use crate::reservation::{PropertyTarget, ReservationRequest, ReservationSink};
use crate::types::{BookingRecord, MessageId};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// What happened to one message
#[derive(Debug)]
pub enum MessageOutcome {
    /// Reservation accepted
    Submitted,
    /// Reservation built but not sent
    DryRun(Box<ReservationRequest>),
    /// Already submitted in an earlier run
    Duplicate,
    /// Payload had no plain-text body
    NoBody,
    /// Mail provider could not return the message
    FetchFailed(IntakeError),
    /// Body could not be decoded
    DecodeFailed(IntakeError),
    /// Body decoded but held no recognizable booking
    ExtractionFailed(IntakeError),
    /// Reservation API refused or could not be reached
    SubmissionFailed(IntakeError),
}

impl MessageOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed(_)
                | Self::DecodeFailed(_)
                | Self::ExtractionFailed(_)
                | Self::SubmissionFailed(_)
        )
    }
}

/// One processed message
#[derive(Debug)]
pub struct MessageReport {
    pub id: MessageId,
    pub record: Option<BookingRecord>,
    pub outcome: MessageOutcome,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub messages: Vec<MessageReport>,
}

impl BatchReport {
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.count(|o| matches!(o, MessageOutcome::Submitted))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(MessageOutcome::is_failure)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MessageOutcome::Duplicate | MessageOutcome::NoBody))
    }

    fn count(&self, predicate: impl Fn(&MessageOutcome) -> bool) -> usize {
        self.messages.iter().filter(|m| predicate(&m.outcome)).count()
    }
}

/// Sequential intake run over a mail source and a reservation sink
pub struct Pipeline<M, S> {
    mail: M,
    sink: S,
    query: String,
    target: PropertyTarget,
    ledger: ProcessedLedger,
    dry_run: bool,
}

impl<M: MailSource, S: ReservationSink> Pipeline<M, S> {
    pub fn new(mail: M, sink: S, query: impl Into<String>, target: PropertyTarget) -> Self {
        Self {
            mail,
            sink,
            query: query.into(),
            target,
            ledger: ProcessedLedger::in_memory(),
            dry_run: false,
        }
    }

    /// Skip messages recorded in `ledger` and record new submissions in it
    ///
    /// A file-backed ledger is saved after every accepted submission.
    #[must_use]
    pub fn with_ledger(mut self, ledger: ProcessedLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Build reservations without sending them
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub const fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    #[must_use]
    pub fn into_ledger(self) -> ProcessedLedger {
        self.ledger
    }

    /// Process every message matching the query
    pub async fn run(&mut self) -> Result<BatchReport> {
        let ids = self.mail.list_matching_message_ids(&self.query).await?;
        info!(
            source = self.mail.source_name(),
            sink = self.sink.sink_name(),
            count = ids.len(),
            dry_run = self.dry_run,
            "Processing matching messages"
        );

        let mut report = BatchReport::default();
        for id in ids {
            let span = info_span!("message", message_id = %id);
            let message = self.process(id).instrument(span).await;
            report.messages.push(message);
        }

        info!(
            submitted = report.submitted(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Batch finished"
        );
        Ok(report)
    }

    async fn process(&mut self, id: MessageId) -> MessageReport {
        let (record, outcome) = self.process_inner(&id).await;
        MessageReport {
            id,
            record,
            outcome,
        }
    }

    async fn process_inner(&mut self, id: &MessageId) -> (Option<BookingRecord>, MessageOutcome) {
        if self.ledger.contains(id) {
            debug!("Already submitted, skipping");
            return (None, MessageOutcome::Duplicate);
        }

        let payload = match self.mail.get_message(id).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, category = %e.category(), "Failed to fetch message");
                return (None, MessageOutcome::FetchFailed(e));
            }
        };

        let body = match decode_body(&payload) {
            Ok(Some(body)) => body,
            Ok(None) => {
                warn!("Message has no plain-text body, skipping");
                return (None, MessageOutcome::NoBody);
            }
            Err(e) => {
                warn!(error = %e, "Failed to decode message, skipping");
                return (None, MessageOutcome::DecodeFailed(e));
            }
        };

        let record = match extract_booking(&body) {
            Ok(record) => record.with_source(id.clone()),
            Err(e) => {
                warn!(error = %e, %body, "No booking in message body, skipping");
                return (None, MessageOutcome::ExtractionFailed(e));
            }
        };

        let missing = record.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "Booking extracted with missing fields");
        }

        let request = ReservationRequest::from_record(&record, &self.target);

        if self.dry_run {
            return (Some(record), MessageOutcome::DryRun(Box::new(request)));
        }

        match self.sink.create_reservation(&request).await {
            Ok(()) => {
                self.ledger.record(id.clone());
                if let Err(e) = self.ledger.save().await {
                    error!(error = %e, "Failed to save ledger after submission");
                }
                info!(layout = %record.layout, "Booking submitted");
                (Some(record), MessageOutcome::Submitted)
            }
            Err(e) => {
                error!(error = %e, category = %e.category(), "Reservation submission failed");
                (Some(record), MessageOutcome::SubmissionFailed(e))
            }
        }
    }
}
