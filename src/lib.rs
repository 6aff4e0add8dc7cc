#![forbid(unsafe_code)]

pub mod assets;
pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod content_tree;
pub mod document;
pub mod formats;
pub mod listing;
pub mod logging;
pub mod markdown;
pub mod metadata;
pub mod navigation;
pub mod notebook;
pub mod posts;
pub mod processor;
pub mod search_index;
pub mod sidebar;
pub mod template;
pub mod toc;
