/// Splits a message into the command name and its free-text argument.
/// Returns `None` if `input` does not start with `prefix` or names no
/// command.
pub fn parse_command<'a>(input: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let input = input.trim_start().strip_prefix(prefix)?;

    // The command name must follow the prefix directly.
    if input.starts_with(char::is_whitespace) {
        return None;
    }

    let (name, args) = match input.find(char::is_whitespace) {
        Some(i) => (&input[..i], &input[i..]),
        None => (input, ""),
    };

    if name.is_empty() {
        return None;
    }

    Some((name, args.trim()))
}
