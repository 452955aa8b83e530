//! Application services orchestrating domain rules over the repository and
//! adapter seams.

pub mod analytics;
pub mod auth;
pub mod blog;
pub mod chatbot;
pub mod contact;
pub mod events;
pub mod journey;
pub mod media;
pub mod notify;
pub mod pagination;
pub mod projects;
pub mod repos;
pub mod skills;
pub mod stats;
