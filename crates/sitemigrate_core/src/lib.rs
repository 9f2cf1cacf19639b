pub mod config;
pub mod content;
pub mod convert;
pub mod import;
pub mod layout;
pub mod links;
pub mod media;
pub mod pipeline;
pub mod resolve;
pub mod rewrite;
pub mod snapshot;
