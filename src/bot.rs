use crate::core::state::State;

use serenity::client::Context as RawContext;
use serenity::model::channel::Message;

use std::error;
use std::fmt::{self, Debug, Display, Formatter};
use std::result;
use std::sync::Arc;

pub type Result<T = ()> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The command was called with missing or invalid arguments. The caller
    /// is shown the usage of the command.
    InvalidCommandUsage,
    /// Indicates that the executor dropped before sending a response. This
    /// likely means that the executing task panicked.
    NoResponse,
    BoxError(Box<dyn error::Error + Send + Sync + 'static>),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidCommandUsage => write!(f, "invalid command usage"),
            Self::NoResponse => write!(f, "no response"),
            Self::BoxError(err) => Display::fmt(err, f),
        }
    }
}

impl<T> From<T> for Error
where
    T: error::Error + Send + Sync + 'static,
{
    fn from(err: T) -> Self {
        Self::BoxError(Box::new(err))
    }
}

/// An alias for `Context<Message>`. This context is received by command
/// handlers.
pub type MessageContext = Context<Message>;

/// An alias for `Context<()>`. This context is received by tasks.
pub type TaskContext = Context<()>;

#[derive(Clone)]
pub struct Context<T> {
    pub raw_ctx: RawContext,
    pub state: Arc<State>,
    /// Everything following the command name, trimmed.
    pub args: String,
    pub event: T,
}

impl<T> Context<T> {
    pub fn new(raw_ctx: RawContext, state: Arc<State>, event: T) -> Self {
        Self {
            raw_ctx,
            state,
            args: String::new(),
            event,
        }
    }
}

impl Context<Message> {
    /// Sends `content` into the channel of the message.
    pub async fn respond<S>(&self, content: S) -> Result<Message>
    where
        S: Display,
    {
        let message = self
            .event
            .channel_id
            .say(&self.raw_ctx, content)
            .await?;

        Ok(message)
    }

    /// Sends an embed into the channel of the message.
    pub async fn respond_embed<T, D>(&self, title: T, description: D) -> Result<Message>
    where
        T: ToString,
        D: ToString,
    {
        let message = self
            .event
            .channel_id
            .send_message(&self.raw_ctx, |m| {
                m.embed(|e| {
                    e.color(crate::EMBED_COLOR);
                    e.title(title);
                    e.description(description);
                    e
                });
                m
            })
            .await?;

        Ok(message)
    }

    /// Returns the argument string, failing with
    /// [`Error::InvalidCommandUsage`] if it is empty.
    pub fn required_args(&self) -> Result<&str> {
        match self.args.is_empty() {
            true => Err(Error::InvalidCommandUsage),
            false => Ok(&self.args),
        }
    }

    /// Returns the server nickname of the author, falling back to the
    /// account name.
    pub fn author_name(&self) -> String {
        self.event
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .unwrap_or_else(|| self.event.author.name.clone())
    }
}

impl<T> Debug for Context<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context {{ raw_ctx: ???, args: {:?}, event: {:?} }}",
            self.args, self.event
        )
    }
}

pub mod prelude {
    pub use crate::bot::{Error::InvalidCommandUsage, MessageContext, Result, TaskContext};
}
