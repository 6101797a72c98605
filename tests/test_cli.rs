mod common;

use common::{stmtchat, write_profiles};
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_profiles_lists_builtin_table() {
    let temp = tempdir().unwrap();
    stmtchat(temp.path())
        .env_remove("STMTCHAT_PROFILES")
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo1"))
        .stdout(predicate::str::contains("demo4"));
}

#[test]
fn test_chats_lists_only_readable_documents() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .arg("chats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Statements"))
        .stdout(predicate::str::contains("Q1 2024"))
        .stdout(predicate::str::contains("Q2 2024"))
        .stdout(predicate::str::contains("Q3 2024").not());

    assert!(temp.path().join("chats/acme/Q1 2024.json").is_file());
}

#[test]
fn test_questions_are_numbered_from_one() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .arg("questions")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. What is the date range of the statement?"))
        .stdout(predicate::str::contains("2. What is the net P&L?"));
}

#[test]
fn test_unknown_profile_fails() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .args(["--profile", "nobody", "chats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile 'nobody'"));
}

#[test]
fn test_ask_without_key_fails_before_recording() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .args(["ask", "What is the net P&L?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY not found"));

    let saved = fs::read_to_string(temp.path().join("chats/acme/Q1 2024.json")).unwrap();
    assert!(!saved.contains("net P&L"));
}

#[test]
fn test_ask_out_of_range_chat_fails() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .args(["ask", "--chat", "5", "hello"])
        .env("GEMINI_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_ask_suggested_question_through_gemini() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());
    let mut server = Server::new();

    server
        .mock("POST", "/upload/v1beta/files")
        .with_status(200)
        .with_body(
            json!({"file": {"name": "files/f1", "uri": "https://example.invalid/files/f1", "mimeType": "application/pdf", "state": "ACTIVE"}})
                .to_string(),
        )
        .create();
    server
        .mock("DELETE", "/v1beta/files/f1")
        .with_status(200)
        .with_body("{}")
        .create();
    server
        .mock("POST", "/v1beta/cachedContents")
        .with_status(200)
        .with_body(json!({"name": "cachedContents/c1", "model": "models/gemini-test"}).to_string())
        .create();
    let generate = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::Regex("What is the net P&L\\?".into()))
        .with_status(200)
        .with_body(
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "The net P&L is 1,200."}]}, "finishReason": "STOP"}]})
                .to_string(),
        )
        .expect(1)
        .create();

    stmtchat(temp.path())
        .args(["--model", "gemini/gemini-test", "ask", "--chat", "-1", "--question", "2"])
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("The net P&L is 1,200."));
    generate.assert();

    let saved: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("chats/acme/Q2 2024.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["messages"][0]["content"], "What is the net P&L?");
    assert_eq!(saved["messages"][1]["content"], "The net P&L is 1,200.");
    assert_eq!(saved["gemini_cache_name"], "cachedContents/c1");

    stmtchat(temp.path())
        .args(["history", "--chat", "Q2 2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The net P&L is 1,200."));
}

#[test]
fn test_ask_reads_question_from_stdin() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());
    let mut server = Server::new();

    server
        .mock("POST", "/upload/v1beta/files")
        .with_status(200)
        .with_body(
            json!({"file": {"name": "files/f1", "uri": "https://example.invalid/files/f1", "state": "ACTIVE"}})
                .to_string(),
        )
        .create();
    server
        .mock("DELETE", "/v1beta/files/f1")
        .with_status(200)
        .with_body("{}")
        .create();
    server
        .mock("POST", "/v1beta/cachedContents")
        .with_status(200)
        .with_body(json!({"name": "cachedContents/c1", "model": "models/gemini-test"}).to_string())
        .create();
    server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_body(Matcher::Regex("Total brokerage paid".into()))
        .with_status(200)
        .with_body(
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Brokerage was 410."}]}}]})
                .to_string(),
        )
        .create();

    stmtchat(temp.path())
        .args(["--model", "gemini/gemini-test", "ask"])
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.url())
        .write_stdin("Total brokerage paid?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Brokerage was 410."));
}

#[test]
fn test_clear_removes_chat_file() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path()).arg("chats").assert().success();
    assert!(temp.path().join("chats/acme/Q2 2024.json").is_file());

    stmtchat(temp.path())
        .args(["clear", "--chat", "Q2 2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared chat 'Q2 2024'."));
    assert!(!temp.path().join("chats/acme/Q2 2024.json").exists());
}

#[test]
fn test_invalid_model_string_fails() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    stmtchat(temp.path())
        .args(["--model", "gpt-4o", "chats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected 'provider/model'"));
}

#[test]
fn test_chat_repl_handles_commands_from_stdin() {
    let temp = tempdir().unwrap();
    write_profiles(temp.path());

    // Slash commands never reach the model, so the key only has to be present.
    stmtchat(temp.path())
        .arg("chat")
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", "http://127.0.0.1:9")
        .write_stdin("/questions\n/switch 1\n/chats\n/bogus\n/ask 9\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2. What is the net P&L?"))
        .stdout(predicate::str::contains("Switched to 'Q2 2024'."))
        .stdout(predicate::str::contains("*  1  Q2 2024"))
        .stderr(predicate::str::contains("Unknown command '/bogus'"))
        .stderr(predicate::str::contains("Question 9 does not exist"));
}
