pub mod access;
pub mod checkin;
pub mod config;
pub mod cycle;
pub mod draft;
pub mod error;
pub mod hierarchy;
pub mod io;
pub mod link;
pub mod notification;
pub mod objective;
pub mod paths;
pub mod progress;
pub mod scoreboard;
pub mod state;
pub mod team;
pub mod text;
pub mod types;

pub use error::{OkrError, Result};
