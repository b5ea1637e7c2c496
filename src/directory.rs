//! The directory's client-side state and every transition on it.
//!
//! [`Directory`] is synchronous: async callers take a ticket with a
//! `begin_*` method, release their lock while the store call runs, then hand
//! the result to the matching `finish_*` method.

use serde::Serialize;

use crate::cache::RecordCache;
use crate::error::{DirectoryError, StoreError};
use crate::filter::filter;
use crate::form::{validate, FormController, FormView};
use crate::popover::{DetailPopover, Placement, Position};
use crate::render::{render, CardKey, RenderedList};
use crate::status::{self, StatusIndicator, StatusMessage};
use crate::types::{AddressSuggestion, FormFields, NewRecord, Record, Theme};

/// Why a full load was started. Decides the status shown on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
    /// First load of the session. Success clears the status.
    Startup,
    /// User asked for a refresh.
    Reload,
    /// A write was confirmed without an echoed row.
    AfterWrite,
}

/// Issued by [`Directory::begin_load`]. Carries the load's place in issue
/// order and how many creates the cache had seen when it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    creates_seen: u64,
    trigger: LoadTrigger,
}

impl LoadTicket {
    pub fn trigger(&self) -> LoadTrigger {
        self.trigger
    }
}

/// Issued by [`Directory::begin_suggestion`] for one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionTicket {
    seq: u64,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The echoed row was prepended to the cache.
    Created,
    /// No row came back; the caller must run this reload.
    Reload(LoadTicket),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopoverView {
    pub anchor: CardKey,
    pub record: Record,
    pub position: Position,
}

/// Everything the presentation surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryView {
    pub query: String,
    pub list: RenderedList,
    pub status: Option<StatusMessage>,
    pub form: FormView,
    pub popover: Option<PopoverView>,
    pub suggestion: Option<AddressSuggestion>,
    pub theme: Theme,
}

pub struct Directory {
    cache: RecordCache,
    /// Last applied filter, reapplied after every cache mutation.
    query: String,
    /// Records behind the current cards, index-aligned with `list.cards`.
    visible: Vec<Record>,
    list: RenderedList,
    status: StatusIndicator,
    form: FormController,
    popover: DetailPopover,
    suggestion: Option<AddressSuggestion>,
    theme: Theme,
    /// Sequence number of the newest load issued.
    loads_issued: u64,
    /// Sequence number of the newest load applied. Older answers are dropped.
    load_applied: u64,
    creates: u64,
    /// Echoed creates a pending load may not contain, tagged with their
    /// position in `creates`.
    unconfirmed: Vec<(u64, Record)>,
    /// Bumped per lookup and whenever the form is cleared.
    suggestions_issued: u64,
}

impl Directory {
    pub fn new(theme: Theme) -> Self {
        Self {
            cache: RecordCache::new(),
            query: String::new(),
            visible: Vec::new(),
            list: render(&[], 0),
            status: StatusIndicator::default(),
            form: FormController::default(),
            popover: DetailPopover::default(),
            suggestion: None,
            theme,
            loads_issued: 0,
            load_applied: 0,
            creates: 0,
            unconfirmed: Vec::new(),
            suggestions_issued: 0,
        }
    }

    pub fn records(&self) -> &[Record] {
        self.cache.records()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn list(&self) -> &RenderedList {
        &self.list
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.current()
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn view(&self) -> DirectoryView {
        DirectoryView {
            query: self.query.clone(),
            list: self.list.clone(),
            status: self.status.current().cloned(),
            form: self.form.view(),
            popover: self.popover_view(),
            suggestion: self.suggestion.clone(),
            theme: self.theme,
        }
    }

    fn popover_view(&self) -> Option<PopoverView> {
        let anchor = self.popover.anchor()?;
        let position = self.popover.position()?;
        let record = self.visible.get(anchor.index)?.clone();
        Some(PopoverView {
            anchor,
            record,
            position,
        })
    }

    /// Route a failure to the status banner.
    pub fn report(&mut self, error: &DirectoryError) {
        self.status.error(&error.to_string());
    }

    // ─── Search ────────────────────────────────────────────────────────────────

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.rerender();
    }

    /// Filter the cache with the stored query and replace the rendered list.
    /// The popover is closed first: its anchor may not survive the render.
    fn rerender(&mut self) {
        self.popover.close();
        self.visible = filter(self.cache.records(), &self.query).into_owned();
        self.list = render(&self.visible, self.list.generation + 1);
    }

    // ─── Loading ───────────────────────────────────────────────────────────────

    pub fn begin_load(&mut self, trigger: LoadTrigger) -> LoadTicket {
        self.status.info(status::LOADING);
        self.loads_issued += 1;
        LoadTicket {
            seq: self.loads_issued,
            creates_seen: self.creates,
            trigger,
        }
    }

    /// Apply a load result.
    ///
    /// An answer is dropped once a load issued after it has been applied.
    /// Otherwise it replaces the cache, and records created after the ticket
    /// was issued are put back in front when the snapshot lacks them. A
    /// failed load empties the cache apart from those records.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Record>, StoreError>,
    ) -> Result<(), DirectoryError> {
        if ticket.seq < self.load_applied {
            tracing::debug!(
                "Dropping stale {:?} load #{} (#{} already applied)",
                ticket.trigger,
                ticket.seq,
                self.load_applied
            );
            return Ok(());
        }
        self.load_applied = ticket.seq;

        let (records, outcome) = match result {
            Ok(records) => {
                tracing::info!("Loaded {} businesses", records.len());
                (records, Ok(()))
            }
            Err(e) => (Vec::new(), Err(DirectoryError::Fetch(e.to_string()))),
        };

        self.unconfirmed.retain(|(n, _)| *n > ticket.creates_seen);
        let mut kept: Vec<Record> = self
            .unconfirmed
            .iter()
            .rev()
            .map(|(_, record)| record)
            .filter(|record| !records.iter().any(|row| same_record(row, record)))
            .cloned()
            .collect();
        if !kept.is_empty() {
            tracing::debug!("Keeping {} record(s) created after load #{}", kept.len(), ticket.seq);
        }
        kept.extend(records);
        if self.load_applied == self.loads_issued {
            self.unconfirmed.clear();
        }

        self.cache.replace_all(kept);
        self.rerender();
        match &outcome {
            // A create confirmed meanwhile keeps its own status.
            Ok(()) if self.creates > ticket.creates_seen => {}
            Ok(()) => match ticket.trigger {
                LoadTrigger::Startup => self.status.clear(),
                LoadTrigger::Reload => self.status.info(status::REFRESHED),
                LoadTrigger::AfterWrite => self.status.info(status::CREATED),
            },
            Err(error) => self.report(error),
        }
        outcome
    }

    // ─── Form ──────────────────────────────────────────────────────────────────

    pub fn open_form(&mut self) {
        self.form.open();
    }

    pub fn close_form(&mut self) {
        self.form.close();
    }

    pub fn toggle_form(&mut self) {
        self.form.toggle();
    }

    pub fn reset_form(&mut self) {
        self.form.reset();
        self.drop_suggestion();
    }

    pub fn update_fields(&mut self, fields: FormFields) {
        if !self.form.is_submitting() {
            self.form.set_fields(fields);
        }
    }

    /// Validate and normalize a submission, then mark it in flight.
    ///
    /// `Ok(None)` means a submission is already in flight and this one is
    /// ignored. Validation runs before the configuration check so a user
    /// without a store still sees which fields are missing.
    pub fn begin_submit(
        &mut self,
        fields: FormFields,
        store_configured: bool,
    ) -> Result<Option<NewRecord>, DirectoryError> {
        if self.form.is_submitting() {
            tracing::debug!("Ignoring submit while another is in flight");
            return Ok(None);
        }
        self.form.set_fields(fields.clone());

        let record = match validate(&fields) {
            Ok(record) => record,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        if !store_configured {
            let error = DirectoryError::Configuration("the record store is unavailable".to_string());
            self.report(&error);
            return Err(error);
        }

        self.form.begin_submit(fields);
        self.status.info(status::SAVING);
        Ok(Some(record))
    }

    /// Reconcile an insert result into the cache.
    ///
    /// An echoed row is prepended. A confirmation without a row hands back a
    /// reload ticket: the client-built payload is never trusted for identity.
    pub fn finish_submit(
        &mut self,
        result: Result<Option<Record>, StoreError>,
    ) -> Result<SubmitOutcome, DirectoryError> {
        match result {
            Ok(Some(record)) => {
                tracing::info!("Created business {:?}", record.id);
                self.creates += 1;
                if self.loads_issued > self.load_applied {
                    self.unconfirmed.push((self.creates, record.clone()));
                }
                self.cache.record_created(record);
                self.rerender();
                self.status.info(status::CREATED);
                self.form.submit_succeeded();
                self.drop_suggestion();
                Ok(SubmitOutcome::Created)
            }
            Ok(None) => {
                self.form.submit_succeeded();
                self.drop_suggestion();
                Ok(SubmitOutcome::Reload(self.begin_load(LoadTrigger::AfterWrite)))
            }
            Err(e) => {
                self.form.submit_failed();
                let error = DirectoryError::Write(e.to_string());
                self.report(&error);
                Err(error)
            }
        }
    }

    // ─── Address suggestions ───────────────────────────────────────────────────

    /// Start a lookup for `text`. Any lookup still in flight is superseded.
    pub fn begin_suggestion(&mut self, text: &str) -> SuggestionTicket {
        self.suggestions_issued += 1;
        SuggestionTicket {
            seq: self.suggestions_issued,
            text: text.to_string(),
        }
    }

    /// Show a lookup result, unless a newer lookup was started, the form was
    /// cleared, or the location field no longer holds the text looked up.
    /// Returns whether the result was applied.
    pub fn finish_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        suggestion: Option<AddressSuggestion>,
    ) -> bool {
        if ticket.seq != self.suggestions_issued || self.form.fields().location != ticket.text {
            tracing::debug!("Dropping stale suggestion for {:?}", ticket.text);
            return false;
        }
        self.suggestion = suggestion;
        true
    }

    fn drop_suggestion(&mut self) {
        self.suggestion = None;
        self.suggestions_issued += 1;
    }

    /// Copy the pending suggestion into the location field.
    pub fn apply_suggestion(&mut self) {
        if let Some(suggestion) = self.suggestion.take() {
            self.form.set_location(suggestion.formatted_address);
        }
    }

    // ─── Detail popover ────────────────────────────────────────────────────────

    /// Open the popover on a card. Keys from an older render are ignored.
    pub fn open_popover(&mut self, key: CardKey, placement: Placement) {
        if self.list.contains(key) {
            self.popover.open(key, placement);
        } else {
            tracing::debug!("Ignoring activation of stale card {key:?}");
        }
    }

    pub fn close_popover(&mut self) {
        self.popover.close();
    }

    pub fn popover_anchor(&self) -> Option<CardKey> {
        self.popover.anchor()
    }

    pub fn reposition_popover(&mut self, placement: Placement) {
        self.popover.reposition(placement);
    }

    // ─── Theme ─────────────────────────────────────────────────────────────────

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}

/// Rows match by id; rows without one only match an identical row.
fn same_record(a: &Record, b: &Record) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
