pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod run;
