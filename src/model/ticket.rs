// src/model/ticket.rs

//! # Ticket Categories
//!
//! The four things a participant can be checked in for. The set is closed:
//! every variant maps to exactly one participant flag, one store column and
//! one key in a transaction's details map.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketType {
    #[default]
    ParticipantKit,
    Entry,
    MainFood,
    Snack,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown ticket type '{0}'")]
pub struct ParseTicketError(pub String);

impl TicketType {
    /// Scanner order; cycling walks this array with wrap-around.
    pub const ALL: [TicketType; 4] = [
        TicketType::ParticipantKit,
        TicketType::Entry,
        TicketType::MainFood,
        TicketType::Snack,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Key used in transaction details and exports.
    pub const fn field(self) -> &'static str {
        match self {
            TicketType::ParticipantKit => "participantKit",
            TicketType::Entry          => "entry",
            TicketType::MainFood       => "mainFood",
            TicketType::Snack          => "snack",
        }
    }

    /// Column in the `participants` table.
    pub const fn column(self) -> &'static str {
        match self {
            TicketType::ParticipantKit => "participant_kit",
            TicketType::Entry          => "entry",
            TicketType::MainFood       => "main_food",
            TicketType::Snack          => "snack",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            TicketType::ParticipantKit => "Participant Kit",
            TicketType::Entry          => "Entry",
            TicketType::MainFood       => "Main Food",
            TicketType::Snack          => "Snack",
        }
    }

    /// Background colour of the scanner screen, as a hex string.
    pub const fn color(self) -> &'static str {
        match self {
            TicketType::ParticipantKit => "#17233F",
            TicketType::Entry          => "#1B7F3B",
            TicketType::MainFood       => "#B5541C",
            TicketType::Snack          => "#7B2D8E",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.field() == field)
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Accepts the field name, the title, or any kebab/snake spelling of either:
/// `mainFood`, `Main Food`, `main-food` and `main_food` are all `MainFood`.
impl FromStr for TicketType {
    type Err = ParseTicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "participantkit" | "kit" => Ok(TicketType::ParticipantKit),
            "entry"                  => Ok(TicketType::Entry),
            "mainfood"               => Ok(TicketType::MainFood),
            "snack"                  => Ok(TicketType::Snack),
            _                        => Err(ParseTicketError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_wraps_in_both_directions() {
        assert_eq!(TicketType::Snack.next(), TicketType::ParticipantKit);
        assert_eq!(TicketType::ParticipantKit.prev(), TicketType::Snack);

        let mut t = TicketType::Entry;
        for _ in 0..TicketType::ALL.len() {
            t = t.next();
        }
        assert_eq!(t, TicketType::Entry);
        assert_eq!(TicketType::MainFood.next().prev(), TicketType::MainFood);
    }

    #[test]
    fn parses_every_spelling() {
        for s in ["mainFood", "Main Food", "main-food", "MAIN_FOOD"] {
            assert_eq!(s.parse::<TicketType>(), Ok(TicketType::MainFood), "{s}");
        }
        assert_eq!("kit".parse::<TicketType>(), Ok(TicketType::ParticipantKit));
        assert!("dessert".parse::<TicketType>().is_err());
    }

    #[test]
    fn field_names_round_trip() {
        for t in TicketType::ALL {
            assert_eq!(TicketType::from_field(t.field()), Some(t));
        }
        assert_eq!(TicketType::from_field("Entry"), None);
    }
}
