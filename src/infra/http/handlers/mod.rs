pub mod analytics;
pub mod auth;
pub mod blog;
pub mod chatbot;
pub mod contact;
pub mod forms;
pub mod health;
pub mod journey;
pub mod projects;
pub mod skills;
pub mod stats;
pub mod uploads;
