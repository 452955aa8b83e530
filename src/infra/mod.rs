pub mod db;
pub mod github;
pub mod http;
pub mod mailer;
pub mod telemetry;
pub mod uploads;
