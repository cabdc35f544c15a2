// src/export/mod.rs

//! # Delimited Exports
//!
//! Participant and transaction tables as delimited text, plus the reverse
//! parse for pre-loading participants from a participant export.
//!
//! Column order is fixed. Participants use `;`, transactions use `,`.
//! A field containing the delimiter, a quote or a line break is quoted, with
//! inner quotes doubled.

use chrono::TimeZone;
use std::{
    borrow::Cow,
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::checkin::is_valid_code;
use crate::model::{Participant, TicketType, Transaction};

pub const PARTICIPANT_DELIMITER: char = ';';
pub const TRANSACTION_DELIMITER: char = ',';

pub const PARTICIPANT_HEADER: [&str; 6] =
    ["ID", "Name", "Participant Kit", "Entry", "Main Food", "Snack"];
pub const TRANSACTION_HEADER: [&str; 8] =
    ["Name", "Date", "Time", "Type", "ParticipantKit", "Entry", "Main Food", "Snack"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not move export into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

fn escape(field: &str, delimiter: char) -> Cow<'_, str> {
    if field.contains([delimiter, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>, delimiter: char) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&escape(field, delimiter));
    }
    out.push('\n');
}

/// Header, then one row per participant in the given order.
pub fn participants_table(participants: &[Participant]) -> String {
    let mut out = String::new();
    push_row(&mut out, PARTICIPANT_HEADER, PARTICIPANT_DELIMITER);
    for p in participants {
        let flags = p.flags().map(|f| if f { "true" } else { "false" });
        let fields = [p.id.as_str(), p.name.as_str()].into_iter().chain(flags);
        push_row(&mut out, fields, PARTICIPANT_DELIMITER);
    }
    out
}

/// Header, then one row per transaction. Date and time are rendered in `tz`;
/// a ticket type missing from the details map is an empty cell.
pub fn transactions_table<Tz>(transactions: &[Transaction], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    push_row(&mut out, TRANSACTION_HEADER, TRANSACTION_DELIMITER);
    for t in transactions {
        let local = t.timestamp.with_timezone(tz);
        let date = local.format("%-d %b %Y").to_string();
        let time = local.format("%H:%M:%S").to_string();
        let details = TicketType::ALL.map(|ticket| match t.detail(ticket) {
            Some(true)  => "true",
            Some(false) => "false",
            None        => "",
        });
        let fields = [
            t.participant_name.as_str(),
            date.as_str(),
            time.as_str(),
            t.transaction_type.as_str(),
        ]
        .into_iter()
        .chain(details);
        push_row(&mut out, fields, TRANSACTION_DELIMITER);
    }
    out
}

/// Write `contents` to `dir/file_name` through a temporary file in the same
/// directory, so readers never see a half-written export.
pub fn write_export(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    let path = dir.join(file_name);
    tmp.persist(&path)?;
    log::info!("Export written to {}", path.display());
    Ok(path)
}

/// Split one line on `delimiter`, honouring quoted fields.
fn split_row(line: &str, delimiter: char) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' if quoted => quoted = false,
            '"' if field.is_empty() => quoted = true,
            c if c == delimiter && !quoted => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    if quoted {
        return Err("unterminated quote".into());
    }
    fields.push(field);
    Ok(fields)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1"  => Some(true),
        "false" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Parse a participant export back into records. The header row is required;
/// blank lines are skipped.
pub fn parse_participants_table(text: &str) -> Result<Vec<Participant>, ExportError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let malformed = |line: usize, reason: String| ExportError::Malformed { line: line + 1, reason };

    match lines.next() {
        Some((n, header)) => {
            let cols = split_row(header, PARTICIPANT_DELIMITER).map_err(|r| malformed(n, r))?;
            if cols != PARTICIPANT_HEADER {
                return Err(malformed(n, format!("unexpected header {cols:?}")));
            }
        }
        None => return Ok(Vec::new()),
    }

    lines
        .map(|(n, line)| {
            let cols = split_row(line, PARTICIPANT_DELIMITER).map_err(|r| malformed(n, r))?;
            if cols.len() != PARTICIPANT_HEADER.len() {
                return Err(malformed(n, format!("expected 6 columns, found {}", cols.len())));
            }
            let id = cols[0].trim();
            if !is_valid_code(id) {
                return Err(malformed(n, format!("invalid participant id '{id}'")));
            }
            let mut participant = Participant::new(id, cols[1].trim());
            for (ticket, raw) in TicketType::ALL.into_iter().zip(&cols[2..]) {
                match parse_flag(raw) {
                    Some(true)  => participant.mark_checked_in(ticket),
                    Some(false) => {}
                    None => return Err(malformed(n, format!("invalid flag '{raw}'"))),
                }
            }
            Ok(participant)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn participant_table_layout() {
        let mut jo = Participant::new("AB12C", "Jo");
        jo.mark_checked_in(TicketType::Entry);
        let table = participants_table(&[jo, Participant::new("ZZ999", "Smith; Al")]);

        assert_eq!(
            table,
            "ID;Name;Participant Kit;Entry;Main Food;Snack\n\
             AB12C;Jo;false;true;false;false\n\
             ZZ999;\"Smith; Al\";false;false;false;false\n"
        );
    }

    #[test]
    fn transaction_table_layout() {
        let ts: DateTime<Utc> = DateTime::from_timestamp(1_717_236_005, 0).unwrap(); // 2024-06-01 10:00:05Z
        let scan = Transaction {
            timestamp: ts,
            ..Transaction::scan("Jo", TicketType::MainFood)
        };
        let mixed = Transaction {
            timestamp: ts,
            transaction_details: BTreeMap::from([("entry".to_owned(), false)]),
            ..Transaction::scan("Doe, Jane", TicketType::Entry)
        };

        let table = transactions_table(&[scan, mixed], &Utc);
        assert_eq!(
            table,
            "Name,Date,Time,Type,ParticipantKit,Entry,Main Food,Snack\n\
             Jo,1 Jun 2024,10:00:05,scan,,,true,\n\
             \"Doe, Jane\",1 Jun 2024,10:00:05,scan,,false,,\n"
        );
    }

    #[test]
    fn transaction_times_follow_the_given_zone() {
        let ts: DateTime<Utc> = DateTime::from_timestamp(1_717_282_800, 0).unwrap(); // 2024-06-01 23:00Z
        let t = Transaction { timestamp: ts, ..Transaction::scan("Jo", TicketType::Snack) };
        let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
        let table = transactions_table(&[t], &jakarta);
        assert!(table.contains("Jo,2 Jun 2024,06:00:00,scan"), "{table}");
    }

    #[test]
    fn parses_quoted_fields_and_flags() {
        let text = "ID;Name;Participant Kit;Entry;Main Food;Snack\n\
                    \n\
                    AB12C;\"Jo \"\"JJ\"\"; Smith\";1;true;0;\n";
        let parsed = parse_participants_table(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Jo \"JJ\"; Smith");
        assert_eq!(parsed[0].flags(), [true, true, false, false]);
    }

    #[test]
    fn rejects_bad_rows_with_line_numbers() {
        let header = "ID;Name;Participant Kit;Entry;Main Food;Snack\n";

        let err = parse_participants_table(&format!("{header}ab12c;Jo;false;false;false;false\n"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Malformed { line: 2, .. }), "{err}");

        let err = parse_participants_table(&format!("{header}AB12C;Jo;maybe;false;false;false\n"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid flag"), "{err}");

        let err = parse_participants_table("Name;ID\n").unwrap_err();
        assert!(matches!(err, ExportError::Malformed { line: 1, .. }));
    }

    #[test]
    fn writes_into_the_export_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "participants.csv", "ID\n").unwrap();
        assert_eq!(path, dir.path().join("participants.csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ID\n");

        // second export replaces the first
        write_export(dir.path(), "participants.csv", "ID\nAB12C\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ID\nAB12C\n");
    }
}
