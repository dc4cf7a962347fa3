pub mod config;
pub mod convert;
pub mod exists;
pub mod frontmatter;
pub mod init;
pub mod milestone;
pub mod model;
pub mod phase;
pub mod progress;
pub mod roadmap;
pub mod scaffold;
pub mod slug;
pub mod state;
pub mod summary;
pub mod template;
pub mod timestamp;
pub mod todo;
pub mod validate;
pub mod verify;
