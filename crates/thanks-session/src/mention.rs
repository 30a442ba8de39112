//! Mention resolver: candidate search and the committed mention set.
//!
//! Users are searched server-side per query; departments are loaded once and
//! filtered locally. Every lookup carries a ticket from the resolver's
//! generation counter, and only the latest generation may write candidates,
//! so a late response for a superseded query is dropped.

use tracing::{debug, debug_span, warn};

use thanks_core::draft::{DraftError, MentionSet};
use thanks_core::model::{Candidate, MentionKind, MentionRef};
use thanks_core::settings::settings;
use thanks_core::unicode::{char_len, contains_normalized};

use crate::input::{CompositionInput, InputEvent};
use crate::types::{Completion, Generation, LookupRequest, Ticket};

enum DepartmentCache {
    NotLoaded,
    Loading(Ticket),
    Loaded(Vec<Candidate>),
}

/// Search and selection limits. Defaults come from `settings()`.
#[derive(Debug, Clone, Copy)]
pub struct ResolverLimits {
    pub min_query_chars: usize,
    pub max_candidates: usize,
    pub max_mentions: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        let s = settings();
        Self {
            min_query_chars: s.search.min_query_chars,
            max_candidates: s.search.max_candidates,
            max_mentions: s.draft.max_mentions,
        }
    }
}

pub struct MentionResolver {
    kind: MentionKind,
    input: CompositionInput,
    /// Last normalized query passed to `search`.
    query: String,
    candidates: Vec<Candidate>,
    error: Option<String>,
    committed: MentionSet,
    search_gen: Generation,
    departments: DepartmentCache,
    department_gen: Generation,
    limits: ResolverLimits,
}

impl Default for MentionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionResolver {
    pub fn new() -> Self {
        Self::with_limits(ResolverLimits::default())
    }

    pub fn with_limits(limits: ResolverLimits) -> Self {
        Self {
            kind: MentionKind::User,
            input: CompositionInput::new(),
            query: String::new(),
            candidates: Vec::new(),
            error: None,
            committed: MentionSet::new(limits.max_mentions),
            search_gen: Generation::default(),
            departments: DepartmentCache::NotLoaded,
            department_gen: Generation::default(),
            limits,
        }
    }

    pub fn kind(&self) -> MentionKind {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn input_text(&self) -> &str {
        self.input.text()
    }

    pub fn is_composing(&self) -> bool {
        self.input.is_composing()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn committed(&self) -> &MentionSet {
        &self.committed
    }

    pub fn departments_loaded(&self) -> bool {
        matches!(self.departments, DepartmentCache::Loaded(_))
    }

    /// Switch between user and department search. Clears the query,
    /// candidates and error and starts the department load if needed.
    pub fn set_kind(&mut self, kind: MentionKind) -> Option<LookupRequest> {
        let _span = debug_span!("set_kind", ?kind).entered();
        self.kind = kind;
        self.reset_search();
        self.error = None;
        match kind {
            MentionKind::User => None,
            MentionKind::Department => self.ensure_departments(),
        }
    }

    /// Feed a text field event through the composition controller and
    /// search when it yields a committed query.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<Option<LookupRequest>, DraftError> {
        let outcome = self.input.handle(event);
        if let Some(err) = outcome.error {
            self.error = Some(err.to_string());
            return Err(err);
        }
        Ok(outcome.query.and_then(|q| self.search(&q)))
    }

    /// Search for an already-normalized query. Short queries clear the
    /// candidate list without issuing anything.
    pub fn search(&mut self, normalized_query: &str) -> Option<LookupRequest> {
        let _span = debug_span!("search", kind = ?self.kind, query = normalized_query).entered();
        self.query = normalized_query.to_string();
        self.error = None;
        // Anything still in flight is superseded by this query.
        let ticket = self.search_gen.next();

        if char_len(&self.query) < self.limits.min_query_chars {
            self.candidates.clear();
            return None;
        }

        match self.kind {
            MentionKind::User => Some(LookupRequest::Users {
                ticket,
                query: self.query.clone(),
            }),
            MentionKind::Department => {
                if let DepartmentCache::Loaded(_) = self.departments {
                    self.filter_departments();
                    None
                } else {
                    // Applied once the list arrives.
                    self.candidates.clear();
                    self.ensure_departments()
                }
            }
        }
    }

    /// Deliver user search results. Returns `false` when the ticket is stale
    /// and nothing changed.
    pub fn receive_candidates(&mut self, ticket: Ticket, result: Completion<Vec<Candidate>>) -> bool {
        if self.kind != MentionKind::User || ticket != self.search_gen.current() {
            debug!(?ticket, "dropping stale candidates");
            return false;
        }
        match result {
            Ok(list) => {
                self.candidates = self.visible(list.into_iter().filter(|c| c.kind == MentionKind::User));
                self.error = None;
            }
            Err(msg) => {
                warn!(%msg, "candidate search failed");
                self.error = Some(msg);
            }
        }
        true
    }

    /// Deliver the department list. Returns `false` when the ticket is stale.
    pub fn receive_departments(&mut self, ticket: Ticket, result: Completion<Vec<Candidate>>) -> bool {
        match self.departments {
            DepartmentCache::Loading(expected) if expected == ticket => {}
            _ => {
                debug!(?ticket, "dropping stale department list");
                return false;
            }
        }
        match result {
            Ok(list) => {
                self.departments = DepartmentCache::Loaded(list);
                if self.kind == MentionKind::Department
                    && char_len(&self.query) >= self.limits.min_query_chars
                {
                    self.filter_departments();
                }
            }
            Err(msg) => {
                warn!(%msg, "department list failed");
                self.departments = DepartmentCache::NotLoaded;
                if self.kind == MentionKind::Department {
                    self.error = Some(msg);
                }
            }
        }
        true
    }

    /// Commit a candidate. Rejected when already mentioned or the set is
    /// full; the set and the search state are untouched in that case.
    pub fn select(&mut self, candidate: &Candidate) -> bool {
        match self.committed.insert(candidate.to_ref()) {
            Ok(()) => {
                self.reset_search();
                self.error = None;
                true
            }
            Err(err) => {
                debug!(%err, "selection rejected");
                false
            }
        }
    }

    pub fn deselect(&mut self, kind: MentionKind, id: u64) -> bool {
        let removed = self.committed.remove(kind, id);
        if removed && self.kind == kind {
            self.refilter();
        }
        removed
    }

    /// Block submission while the search box holds free text.
    pub fn ensure_committed(&mut self) -> Result<(), DraftError> {
        if self.input.has_uncommitted_text() {
            let err = DraftError::UncommittedMention;
            self.error = Some(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    pub fn mentions(&self) -> &[MentionRef] {
        self.committed.as_slice()
    }

    /// Drop the committed set and search state; the department cache stays.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.reset_search();
        self.error = None;
    }

    fn reset_search(&mut self) {
        self.input.clear();
        self.query.clear();
        self.candidates.clear();
        self.search_gen.invalidate();
    }

    fn ensure_departments(&mut self) -> Option<LookupRequest> {
        match self.departments {
            DepartmentCache::NotLoaded => {
                let ticket = self.department_gen.next();
                self.departments = DepartmentCache::Loading(ticket);
                Some(LookupRequest::Departments { ticket })
            }
            DepartmentCache::Loading(_) | DepartmentCache::Loaded(_) => None,
        }
    }

    fn filter_departments(&mut self) {
        let DepartmentCache::Loaded(ref all) = self.departments else {
            return;
        };
        let matching: Vec<Candidate> = all
            .iter()
            .filter(|d| contains_normalized(&d.name, &self.query))
            .cloned()
            .collect();
        self.candidates = self.visible(matching);
    }

    /// Recompute the visible list after the committed set changed.
    fn refilter(&mut self) {
        if self.kind == MentionKind::Department
            && char_len(&self.query) >= self.limits.min_query_chars
        {
            self.filter_departments();
        }
    }

    /// Hide already-committed refs and cap the list.
    fn visible(&self, list: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
        list.into_iter()
            .filter(|c| !self.committed.contains(c.kind, c.id))
            .take(self.limits.max_candidates)
            .collect()
    }
}
