pub mod answer;
pub mod choose;
pub mod complete;
pub mod completions;
pub mod egg;
pub mod grant;
pub mod init;
pub mod notes;
pub mod open;
pub mod reset;
pub mod sound;
pub mod status;
pub mod sync;
pub mod timelock;
