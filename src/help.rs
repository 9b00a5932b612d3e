use crate::core::command::Command;

use std::fmt::Write;

/// Returns the help message listing every command with its usage.
pub(crate) fn global(commands: &[Command], prefix: &str) -> String {
    let mut string = String::new();

    let _ = writeln!(string, "__**Commandes :**__");

    for command in commands {
        let _ = write!(string, "- `{}{}", prefix, command.name);
        if !command.usage.is_empty() {
            let _ = write!(string, " {}", command.usage);
        }
        let _ = writeln!(string, "` : {}", command.description);
    }

    let _ = writeln!(
        string,
        "\n*`<>` : argument obligatoire. Les noms d'archis ignorent la casse.*"
    );

    string
}

/// Returns the help message of a single command. Used when a command is
/// called with invalid arguments.
pub(crate) fn command(command: &Command, prefix: &str) -> String {
    let mut string = String::new();

    let _ = writeln!(string, "**Nom** : {}", command.name);
    let _ = writeln!(string, "**Description** : {}", command.description);
    let _ = writeln!(
        string,
        "**Utilisation** : `{}{} {}`",
        prefix, command.name, command.usage
    );

    if !command.example.is_empty() {
        let _ = writeln!(
            string,
            "**Exemple** : `{}{} {}`",
            prefix, command.name, command.example
        );
    }

    if command.restricted {
        let _ = writeln!(string, "**Réservée aux admins**");
    }

    string
}
