use super::executor::Executor;
use crate::bot::MessageContext;

use std::collections::HashMap;
use std::error;
use std::fmt::{self, Display, Formatter};
use std::sync::RwLock;

/// An error returned when loading a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// A command with the same name already exists.
    DuplicateName(String),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "duplicate command name `{}`", name),
        }
    }
}

impl error::Error for LoadError {}

#[derive(Clone, Debug)]
pub struct Command {
    pub name: String,
    /// Description of the command. Shown to the user in the help command.
    pub description: String,
    /// Usage of the command. Use `<>` for required arguments and `[]` for
    /// optional arguments. Only write the arguments, **not** the command name.
    /// Example: `<Archimonster>`
    pub usage: String,
    /// Example arguments shown in the help command.
    pub example: String,
    /// Restricted commands can only be run by the admins from the config.
    pub restricted: bool,
    pub executor: Option<Executor<MessageContext>>,
}

impl Command {
    pub fn new<T>(name: T) -> Self
    where
        T: ToString,
    {
        Self {
            name: name.to_string(),
            description: String::new(),
            usage: String::new(),
            example: String::new(),
            restricted: false,
            executor: None,
        }
    }
}

/// All loaded text commands, by name.
#[derive(Debug, Default)]
pub struct CommandHandler {
    commands: RwLock<HashMap<String, Command>>,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a new command. Command names are case-insensitive.
    pub fn load_command(&self, mut command: Command) -> Result<(), LoadError> {
        command.name = command.name.to_lowercase();

        let mut commands = self.commands.write().unwrap();

        if commands.contains_key(&command.name) {
            return Err(LoadError::DuplicateName(command.name));
        }

        log::debug!("[CORE] Loaded command '{}'", command.name);
        commands.insert(command.name.clone(), command);
        Ok(())
    }

    pub fn get_command(&self, name: &str) -> Option<Command> {
        let commands = self.commands.read().unwrap();
        commands.get(&name.to_lowercase()).cloned()
    }

    /// Returns all commands sorted by name.
    pub fn list_commands(&self) -> Vec<Command> {
        let commands = self.commands.read().unwrap();

        let mut list: Vec<_> = commands.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }
}
