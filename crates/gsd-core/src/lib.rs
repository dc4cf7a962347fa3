pub mod config;
pub mod convert;
pub mod digest;
pub mod error;
pub mod frontmatter;
pub mod io;
pub mod jsonc;
pub mod milestone;
pub mod musthaves;
pub mod paths;
pub mod phase;
pub mod roadmap;
pub mod state;
pub mod template;
pub mod todo;
pub mod toolmap;
pub mod verify;

pub use error::{GsdError, Result};
