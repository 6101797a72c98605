pub mod chatstore;
pub mod commands;
pub mod config;
pub mod console;
pub mod consts;
pub mod exceptions;
pub mod fs;
pub mod llm;
pub mod models;
pub mod profiles;
pub mod session;
pub mod tools;
pub mod utils;
