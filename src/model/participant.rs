// src/model/participant.rs

use serde::{Deserialize, Serialize};

use super::TicketType;

/// One registered attendee. `id` is the code printed in the QR and never
/// changes once assigned; the four flags only ever go from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub participant_kit: bool,
    pub entry: bool,
    pub main_food: bool,
    pub snack: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            participant_kit: false,
            entry: false,
            main_food: false,
            snack: false,
        }
    }

    pub fn is_checked_in(&self, ticket: TicketType) -> bool {
        match ticket {
            TicketType::ParticipantKit => self.participant_kit,
            TicketType::Entry          => self.entry,
            TicketType::MainFood       => self.main_food,
            TicketType::Snack          => self.snack,
        }
    }

    pub fn mark_checked_in(&mut self, ticket: TicketType) {
        let flag = match ticket {
            TicketType::ParticipantKit => &mut self.participant_kit,
            TicketType::Entry          => &mut self.entry,
            TicketType::MainFood       => &mut self.main_food,
            TicketType::Snack          => &mut self.snack,
        };
        *flag = true;
    }

    /// Flags in `TicketType::ALL` order.
    pub fn flags(&self) -> [bool; 4] {
        TicketType::ALL.map(|t| self.is_checked_in(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_touches_only_one_flag() {
        let mut p = Participant::new("AB12C", "Jo");
        p.mark_checked_in(TicketType::MainFood);
        assert_eq!(p.flags(), [false, false, true, false]);
        assert!(p.is_checked_in(TicketType::MainFood));
        assert!(!p.is_checked_in(TicketType::Entry));
    }
}
