//! Pending/completed todo tracking under `.planning/todos/`.
//!
//! Todo files are bare `key: value` headers (title, area, created), no
//! frontmatter delimiters. Completing one moves it to `completed/` and
//! stamps the completion time as the first line.

use crate::error::{GsdError, Result};
use crate::io;
use crate::paths;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct Todo {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodoList {
    pub count: usize,
    pub todos: Vec<Todo>,
}

fn header_value(text: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}:");
    text.lines().find_map(|line| {
        line.strip_prefix(&prefix)
            .map(|rest| rest.trim().to_string())
    })
}

/// List pending todos, optionally filtered by area. A missing todos
/// directory is an empty list.
pub fn list(root: &Path, area: Option<&str>) -> Result<TodoList> {
    let dir = paths::todos_pending_dir(root);
    let mut todos = Vec::new();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TodoList { count: 0, todos })
        }
        Err(e) => return Err(e.into()),
    };
    let mut files: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".md") {
            files.push(name);
        }
    }
    files.sort();
    for file in files {
        let text = std::fs::read_to_string(dir.join(&file))?;
        let todo = Todo {
            title: header_value(&text, "title"),
            area: header_value(&text, "area"),
            created: header_value(&text, "created"),
            file,
        };
        if let Some(filter) = area {
            if todo.area.as_deref() != Some(filter) {
                continue;
            }
        }
        todos.push(todo);
    }
    Ok(TodoList {
        count: todos.len(),
        todos,
    })
}

#[derive(Debug, Serialize)]
pub struct CompletedTodo {
    pub completed: bool,
    pub file: String,
}

/// Move a pending todo to `completed/`, stamping the completion time as the
/// first header line. A missing file is a hard failure.
pub fn complete(root: &Path, file: &str) -> Result<CompletedTodo> {
    let from = paths::todos_pending_dir(root).join(file);
    let Some(text) = io::read_optional(&from)? else {
        return Err(GsdError::NotFound(format!("todo {file}")));
    };
    let stamped = format!("completed: {}\n{text}", Utc::now().to_rfc3339());
    let to = paths::todos_completed_dir(root).join(file);
    io::atomic_write(&to, stamped)?;
    std::fs::remove_file(&from)?;
    Ok(CompletedTodo {
        completed: true,
        file: file.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
