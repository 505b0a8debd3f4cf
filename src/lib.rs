//! Triage desk for an agency inbox: threads the mail snapshot, sorts conversations
//! into Now / Waiting / FYI and ranks what needs a reply first.

pub mod config;
pub mod logging;
pub mod store;
pub mod triage;
