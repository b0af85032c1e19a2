pub mod api;
pub mod config;
pub mod data_models;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod poller;
pub mod sender;
pub mod telegram;
