pub mod ask;
pub mod chat;
pub mod chats;
pub mod clear;
pub mod profiles;
pub mod shared;
pub mod view;
