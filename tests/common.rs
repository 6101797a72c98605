use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use stmtchat::config::Credentials;
use stmtchat::profiles::{Profile, ProfileSet};

#[allow(dead_code)]
pub const QUESTION: &str = "What is the net P&L?";

/// Writes a small file that passes the PDF readability check.
#[allow(dead_code)]
pub fn write_pdf(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"%PDF-1.4\n%test document\n").unwrap();
    path.to_path_buf()
}

/// Profile `acme` with three predefined chats; `docs/q3.pdf` is never created.
#[allow(dead_code)]
pub fn write_profiles(root: &Path) -> PathBuf {
    let path = root.join("profiles.toml");
    fs::write(
        &path,
        r#"
[profiles.acme]
label = "Acme Capital"
page_title = "Acme Statements"
questions = ["What is the date range of the statement?", "What is the net P&L?"]

[[profiles.acme.chats]]
title = "Q1 2024"
document = "docs/q1.pdf"

[[profiles.acme.chats]]
title = "Q2 2024"
document = "docs/q2.pdf"

[[profiles.acme.chats]]
title = "Q3 2024"
document = "docs/q3.pdf"
"#,
    )
    .unwrap();
    write_pdf(&root.join("docs/q1.pdf"));
    write_pdf(&root.join("docs/q2.pdf"));
    path
}

#[allow(dead_code)]
pub fn acme_profile(root: &Path) -> Profile {
    let path = write_profiles(root);
    ProfileSet::load(&path).unwrap().get("acme").unwrap().clone()
}

#[allow(dead_code)]
pub fn credentials(url: &str) -> Credentials {
    Credentials {
        api_key: "test-key".into(),
        base_url: url.trim_end_matches('/').to_string(),
    }
}

/// The binary, isolated from the caller's environment and `.env` file.
#[allow(dead_code)]
pub fn stmtchat(root: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("stmtchat");
    cmd.current_dir(root)
        .env("STMTCHAT_CHATS_DIR", root.join("chats"))
        .env("STMTCHAT_PROFILES", root.join("profiles.toml"))
        .env("STMTCHAT_PROFILE", "acme")
        .env("COLUMNS", "100")
        .env_remove("STMTCHAT_MODEL")
        .env_remove("STMTCHAT_LOG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_BASE_URL")
        .env_remove("OPENAI_API_KEY")
        .env_remove("DEEPSEEK_API_KEY");
    cmd
}

/// A Yahoo chart payload with one bar per `(unix timestamp, close)` pair, in IST.
#[allow(dead_code)]
pub fn yahoo_chart(bars: &[(i64, f64)]) -> serde_json::Value {
    let timestamps: Vec<i64> = bars.iter().map(|b| b.0).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.1).collect();
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {"gmtoffset": 19800, "timezone": "IST"},
                "timestamp": timestamps,
                "indicators": {"quote": [{
                    "open": closes,
                    "high": closes,
                    "low": closes,
                    "close": closes,
                    "volume": vec![1000; bars.len()]
                }]}
            }],
            "error": null
        }
    })
}
