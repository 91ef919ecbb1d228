pub mod autosave;
pub mod board;
pub mod codec;
pub mod column;
pub mod config;
pub mod history;
pub mod session;
pub mod storage;
pub mod sync;
pub mod timeline;
pub mod types;
