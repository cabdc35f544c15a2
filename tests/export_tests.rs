// tests/export_tests.rs

use std::sync::Arc;
use chrono::Utc;

use ticket_scanner::{
    checkin::CheckInEngine,
    db::{ParticipantStore, SqliteStore},
    export::{self, parse_participants_table, participants_table, transactions_table},
    model::{Participant, TicketType},
};

#[tokio::test]
async fn participant_export_loads_into_a_fresh_store() {
    let source = Arc::new(SqliteStore::in_memory().unwrap());
    source.insert(&Participant::new("AB12C", "Jo")).await.unwrap();
    source.insert(&Participant::new("ZZ999", "Doe; Jane")).await.unwrap();

    let engine = CheckInEngine::new(source.clone(), source.clone());
    engine.check_in("AB12C", TicketType::Snack).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let table = participants_table(&source.list_by_name().await.unwrap());
    let path = export::write_export(dir.path(), "participants.csv", &table).unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    let target = SqliteStore::in_memory().unwrap();
    for p in parse_participants_table(&text).unwrap() {
        assert!(target.insert(&p).await.unwrap());
    }

    assert_eq!(target.list_by_name().await.unwrap(), source.list_by_name().await.unwrap());
    assert!(target.get("AB12C").await.unwrap().unwrap().snack);
}

#[tokio::test]
async fn transaction_export_lists_newest_first() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    store.insert(&Participant::new("AB12C", "Jo")).await.unwrap();
    let engine = CheckInEngine::new(store.clone(), store.clone());

    engine.check_in("AB12C", TicketType::Entry).await.unwrap();
    engine.check_in("AB12C", TicketType::MainFood).await.unwrap();

    let table = transactions_table(&store.transactions().await.unwrap(), &Utc);
    let rows: Vec<&str> = table.lines().collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], "Name,Date,Time,Type,ParticipantKit,Entry,Main Food,Snack");
    assert!(rows[1].starts_with("Jo,") && rows[1].ends_with(",scan,,,true,"), "{}", rows[1]);
    assert!(rows[2].ends_with(",scan,,true,,"), "{}", rows[2]);
}
