//! Tool-name translation tables for the OpenCode and Gemini runtimes.
//!
//! Static data, no shared state. Both translators are total: unknown names
//! fall back to lowercase rather than erroring.

/// MCP server tools keep their namespaced names everywhere.
pub const MCP_PREFIX: &str = "mcp__";

/// Claude tool name -> OpenCode tool name.
const OPENCODE_TOOLS: &[(&str, &str)] = &[
    ("Read", "read"),
    ("Write", "write"),
    ("Edit", "edit"),
    ("Bash", "bash"),
    ("Grep", "grep"),
    ("Glob", "glob"),
    ("Task", "task"),
    ("WebFetch", "webfetch"),
    ("WebSearch", "websearch"),
    ("TodoWrite", "todowrite"),
];

/// Claude tool name -> Gemini tool name. `Task` is absent on purpose: Gemini
/// has no subagent dispatch, so it translates to the excluded signal instead.
const GEMINI_TOOLS: &[(&str, &str)] = &[
    ("Read", "read_file"),
    ("Write", "write_file"),
    ("Edit", "replace"),
    ("Bash", "run_shell_command"),
    ("Grep", "search_file_content"),
    ("Glob", "glob"),
    ("WebFetch", "web_fetch"),
    ("WebSearch", "google_web_search"),
    ("TodoWrite", "write_todos"),
];

/// The Claude-side vocabulary, used for bare-word rewrites in body prose.
pub fn claude_tool_names() -> impl Iterator<Item = &'static str> {
    OPENCODE_TOOLS.iter().map(|(claude, _)| *claude)
}

/// Translate a Claude tool name for OpenCode. MCP-prefixed names pass
/// through unchanged; unknown names lowercase.
pub fn convert_tool_name(name: &str) -> String {
    if name.starts_with(MCP_PREFIX) {
        return name.to_string();
    }
    match OPENCODE_TOOLS.iter().find(|(claude, _)| *claude == name) {
        Some((_, opencode)) => (*opencode).to_string(),
        None => name.to_lowercase(),
    }
}

/// Translate a Claude tool name for Gemini. `None` is the excluded signal:
/// callers omit the tool rather than emit a null entry. MCP tools and `Task`
/// are excluded; unknown names lowercase.
pub fn convert_gemini_tool_name(name: &str) -> Option<String> {
    if name.starts_with(MCP_PREFIX) || name == "Task" {
        return None;
    }
    match GEMINI_TOOLS.iter().find(|(claude, _)| *claude == name) {
        Some((_, gemini)) => Some((*gemini).to_string()),
        None => Some(name.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opencode_table_hits() {
        assert_eq!(convert_tool_name("Read"), "read");
        assert_eq!(convert_tool_name("Write"), "write");
        assert_eq!(convert_tool_name("Bash"), "bash");
        assert_eq!(convert_tool_name("Task"), "task");
    }

    #[test]
    fn opencode_unknown_lowercases() {
        assert_eq!(convert_tool_name("SomeNewTool"), "somenewtool");
        assert_eq!(convert_tool_name("already_lower"), "already_lower");
    }

    #[test]
    fn opencode_mcp_passthrough() {
        assert_eq!(
            convert_tool_name("mcp__linear__create_issue"),
            "mcp__linear__create_issue"
        );
    }

    #[test]
    fn gemini_table_hits() {
        assert_eq!(convert_gemini_tool_name("Read").as_deref(), Some("read_file"));
        assert_eq!(convert_gemini_tool_name("Write").as_deref(), Some("write_file"));
        assert_eq!(
            convert_gemini_tool_name("Bash").as_deref(),
            Some("run_shell_command")
        );
    }

    #[test]
    fn gemini_excludes_task_and_mcp() {
        assert_eq!(convert_gemini_tool_name("Task"), None);
        assert_eq!(convert_gemini_tool_name("mcp__linear__create_issue"), None);
    }

    #[test]
    fn gemini_unknown_lowercases() {
        assert_eq!(
            convert_gemini_tool_name("SomeNewTool").as_deref(),
            Some("somenewtool")
        );
    }
}
