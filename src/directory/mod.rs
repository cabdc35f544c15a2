// src/directory/mod.rs

//! # Participant Directory
//!
//! In-memory list/search/filter over the full participant set, for one
//! selected ticket type.
//!
//! `Directory` owns the data and the current settings; every mutation
//! recomputes an immutable `DirectoryView` snapshot that callers hold through
//! an `Arc`. Rules:
//! - search text, when non-empty, wins over the flag filter and matches the
//!   name or the id case-insensitively as a substring;
//! - rows are sorted by name, ties broken by id;
//! - counts always describe the unfiltered set.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use crate::model::{Participant, TicketType};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    All,
    CheckedIn,
    NotCheckedIn,
}

impl FilterMode {
    /// `All → CheckedIn → NotCheckedIn → All`
    pub fn next(self) -> Self {
        match self {
            FilterMode::All          => FilterMode::CheckedIn,
            FilterMode::CheckedIn    => FilterMode::NotCheckedIn,
            FilterMode::NotCheckedIn => FilterMode::All,
        }
    }

    fn admits(self, checked_in: bool) -> bool {
        match self {
            FilterMode::All          => true,
            FilterMode::CheckedIn    => checked_in,
            FilterMode::NotCheckedIn => !checked_in,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FilterMode::All          => "all",
            FilterMode::CheckedIn    => "checked-in",
            FilterMode::NotCheckedIn => "not-checked-in",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all"                                => Ok(FilterMode::All),
            "checked-in" | "checked" | "true"    => Ok(FilterMode::CheckedIn),
            "not-checked-in" | "pending" | "false" => Ok(FilterMode::NotCheckedIn),
            other => Err(format!("unknown filter '{other}' (all, checked-in, not-checked-in)")),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub checked_in: usize,
    pub not_checked_in: usize,
}

/// What a list screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
    pub ticket: TicketType,
    pub filter: FilterMode,
    pub search: Option<String>,
    pub rows: Vec<Participant>,
    pub counts: Counts,
}

impl DirectoryView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct Directory {
    /// Sorted by (name, id), one entry per id.
    participants: Vec<Participant>,
    ticket: TicketType,
    filter: FilterMode,
    search: Option<String>,
    view: Arc<DirectoryView>,
}

impl Directory {
    pub fn new(ticket: TicketType) -> Self {
        let mut dir = Self {
            participants: Vec::new(),
            ticket,
            filter: FilterMode::All,
            search: None,
            view: Arc::new(DirectoryView {
                ticket,
                filter: FilterMode::All,
                search: None,
                rows: Vec::new(),
                counts: Counts::default(),
            }),
        };
        dir.recompute();
        dir
    }

    pub fn view(&self) -> Arc<DirectoryView> {
        Arc::clone(&self.view)
    }

    /// Swap in a freshly loaded set. A repeated id keeps its last record.
    pub fn replace(&mut self, participants: impl IntoIterator<Item = Participant>) {
        let by_id: HashMap<String, Participant> = participants
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let mut all: Vec<Participant> = by_id.into_values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        self.participants = all;
        self.recompute();
    }

    /// Advance the filter and return the new mode.
    pub fn cycle_filter(&mut self) -> FilterMode {
        self.filter = self.filter.next();
        self.recompute();
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
        self.recompute();
    }

    /// Empty text clears the search.
    pub fn set_search(&mut self, text: &str) {
        self.search = (!text.is_empty()).then(|| text.to_owned());
        self.recompute();
    }

    pub fn clear_search(&mut self) {
        self.set_search("");
    }

    pub fn set_ticket(&mut self, ticket: TicketType) {
        self.ticket = ticket;
        self.recompute();
    }

    fn recompute(&mut self) {
        let ticket = self.ticket;

        let rows: Vec<Participant> = match &self.search {
            Some(text) => {
                let needle = text.to_lowercase();
                self.participants
                    .iter()
                    .filter(|p| {
                        p.name.to_lowercase().contains(&needle)
                            || p.id.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            }
            None => self
                .participants
                .iter()
                .filter(|p| self.filter.admits(p.is_checked_in(ticket)))
                .cloned()
                .collect(),
        };

        let checked_in = self.participants.iter().filter(|p| p.is_checked_in(ticket)).count();
        let counts = Counts {
            total: self.participants.len(),
            checked_in,
            not_checked_in: self.participants.len() - checked_in,
        };

        self.view = Arc::new(DirectoryView {
            ticket,
            filter: self.filter,
            search: self.search.clone(),
            rows,
            counts,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str, entry: bool) -> Participant {
        Participant { entry, ..Participant::new(id, name) }
    }

    fn sample() -> Directory {
        let mut dir = Directory::new(TicketType::Entry);
        dir.replace([
            person("CC333", "bea", false),
            person("AB12C", "Jo", true),
            person("ZZ999", "Al", false),
            person("AA111", "Jo", false),
        ]);
        dir
    }

    fn ids(view: &DirectoryView) -> Vec<&str> {
        view.rows.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn rows_sorted_by_name_then_id() {
        let view = sample().view();
        assert_eq!(ids(&view), ["ZZ999", "AA111", "AB12C", "CC333"]);
    }

    #[test]
    fn filter_cycle_is_closed_and_keeps_order() {
        let mut dir = sample();
        assert_eq!(dir.cycle_filter(), FilterMode::CheckedIn);
        assert_eq!(ids(&dir.view()), ["AB12C"]);

        assert_eq!(dir.cycle_filter(), FilterMode::NotCheckedIn);
        assert_eq!(ids(&dir.view()), ["ZZ999", "AA111", "CC333"]);

        assert_eq!(dir.cycle_filter(), FilterMode::All);
        assert_eq!(dir.view().rows.len(), 4);
    }

    #[test]
    fn search_overrides_filter_and_ignores_case() {
        let mut dir = sample();
        dir.set_filter(FilterMode::CheckedIn);

        dir.set_search("JO");
        assert_eq!(ids(&dir.view()), ["AA111", "AB12C"]);

        dir.set_search("cc3");
        assert_eq!(ids(&dir.view()), ["CC333"]);

        dir.clear_search();
        assert_eq!(ids(&dir.view()), ["AB12C"]);
        assert_eq!(dir.view().filter, FilterMode::CheckedIn);
    }

    #[test]
    fn counts_ignore_filter_and_search() {
        let mut dir = sample();
        dir.set_search("zz");
        dir.set_filter(FilterMode::CheckedIn);
        let counts = dir.view().counts;
        assert_eq!(counts, Counts { total: 4, checked_in: 1, not_checked_in: 3 });

        dir.set_ticket(TicketType::Snack);
        assert_eq!(dir.view().counts.checked_in, 0);
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_changes() {
        let mut dir = sample();
        let before = dir.view();
        dir.replace([person("NEW01", "Zed", true)]);
        assert_eq!(before.rows.len(), 4);
        assert_eq!(ids(&dir.view()), ["NEW01"]);
    }

    #[test]
    fn repeated_id_keeps_one_record() {
        let mut dir = Directory::new(TicketType::Entry);
        dir.replace([person("AB12C", "Jo", false), person("AB12C", "Jo", true)]);
        assert_eq!(dir.view().counts.total, 1);
        assert!(dir.view().rows[0].entry);
    }

    #[test]
    fn filter_mode_parses_cli_spellings() {
        assert_eq!("checked-in".parse::<FilterMode>(), Ok(FilterMode::CheckedIn));
        assert_eq!("Not-Checked-In".parse::<FilterMode>(), Ok(FilterMode::NotCheckedIn));
        assert!("some".parse::<FilterMode>().is_err());
    }
}
