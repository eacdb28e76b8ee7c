//! Slash-command addressing (`/research what happened today`).

/// Split `/command remainder` into `(command, remainder)`.
///
/// Returns `None` when the content does not start with a slash or the
/// command word is empty.
pub fn parse_command(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start().strip_prefix('/')?;
    let (command, remainder) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    if command.is_empty() {
        return None;
    }
    Some((command, remainder))
}
