use std::fs;
use stmtchat::chatstore::store::ChatStore;
use stmtchat::models::{CacheState, ChartKind, ChartPoint, ChartSpec, ChatRecord, Message, Role};
use tempfile::tempdir;

#[test]
fn test_save_and_reload_preserves_message_order() {
    let temp = tempdir().unwrap();
    let store = ChatStore::new(temp.path().to_path_buf());

    let mut record = ChatRecord::new("FY 2024-2025 1", "documents/demo3/doc1.pdf".into());
    record.messages.push(Message::user("What is the date range?"));
    record
        .messages
        .push(Message::assistant("01-Apr-2024 to 31-Mar-2025."));
    record.messages.push(
        Message::chart(&ChartSpec {
            title: "P&L".into(),
            kind: ChartKind::Bar,
            x_axis: "item".into(),
            y_axis: "value".into(),
            points: vec![ChartPoint {
                label: "Equity".into(),
                value: 12.5,
            }],
        })
        .unwrap(),
    );
    record.cache = CacheState::Cached {
        name: "cachedContents/abc".into(),
        model: Some("models/gemini-test".into()),
    };

    store.save("demo3", "FY 2024-2025 1", &record).unwrap();
    let loaded = store.load("demo3").unwrap();

    let back = &loaded["FY 2024-2025 1"];
    assert_eq!(back, &record);
    assert_eq!(back.messages[0].role, Role::User);
    assert!(back.messages[2].is_chart());
}

#[test]
fn test_special_characters_in_title_survive_reload() {
    let temp = tempdir().unwrap();
    let store = ChatStore::new(temp.path().to_path_buf());

    let record = ChatRecord::new("Q1/2024: P&L", "a.pdf".into());
    store.save("demo1", "Q1/2024: P&L", &record).unwrap();

    assert!(
        temp.path()
            .join("demo1")
            .join("Q1_2024_ P_L.json")
            .exists()
    );
    let loaded = store.load("demo1").unwrap();
    assert!(loaded.contains_key("Q1/2024: P&L"));
}

#[test]
fn test_malformed_and_foreign_files_are_skipped() {
    let temp = tempdir().unwrap();
    let store = ChatStore::new(temp.path().to_path_buf());
    let dir = store.profile_dir("demo1");
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("broken.json"), "{ not json").unwrap();
    fs::write(dir.join("notes.txt"), "hello").unwrap();
    fs::write(
        dir.join("Legacy.json"),
        r#"{"pdf_path": "documents/demo1/doc1.pdf", "messages": []}"#,
    )
    .unwrap();

    let loaded = store.load("demo1").unwrap();
    assert_eq!(loaded.len(), 1);
    let legacy = &loaded["Legacy"];
    assert_eq!(legacy.cache, CacheState::NoCache);
    assert_eq!(legacy.title.as_deref(), Some("Legacy"));
}

#[test]
fn test_remove_missing_file_is_not_an_error() {
    let temp = tempdir().unwrap();
    let store = ChatStore::new(temp.path().to_path_buf());

    store.remove("demo1", "never saved").unwrap();

    let record = ChatRecord::new("t", "a.pdf".into());
    store.save("demo1", "t", &record).unwrap();
    store.remove("demo1", "t").unwrap();
    assert!(store.load("demo1").unwrap().is_empty());
}

#[test]
fn test_titles_sharing_a_file_name_are_detected() {
    let temp = tempdir().unwrap();
    let store = ChatStore::new(temp.path().to_path_buf());

    // "Q1/2024" and "Q1:2024" both sanitize to "Q1_2024.json".
    assert_eq!(
        store.chat_path("demo1", "Q1/2024"),
        store.chat_path("demo1", "Q1:2024")
    );
    assert!(store.conflicting_title("demo1", "Q1/2024").is_none());

    store
        .save("demo1", "Q1/2024", &ChatRecord::new("Q1/2024", "a.pdf".into()))
        .unwrap();
    assert!(store.conflicting_title("demo1", "Q1/2024").is_none());
    assert_eq!(
        store.conflicting_title("demo1", "Q1:2024").as_deref(),
        Some("Q1/2024")
    );

    store
        .save("demo1", "Q1:2024", &ChatRecord::new("Q1:2024", "b.pdf".into()))
        .unwrap();
    let chats = store.load("demo1").unwrap();
    assert_eq!(chats.len(), 1);
    assert!(chats.contains_key("Q1:2024"));
}
