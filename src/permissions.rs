use crate::bot::MessageContext;
use crate::config::Config;
use crate::core::command::Command;

/// Returns whether the author of the message may run `command`.
pub fn has_permission(ctx: &MessageContext, command: &Command) -> bool {
    is_allowed(&ctx.state.config, command, ctx.event.author.id.0)
}

fn is_allowed(config: &Config, command: &Command, user_id: u64) -> bool {
    // Without configured admins restricted commands are open to everyone.
    !command.restricted || config.admins.is_empty() || config.admins.contains(&user_id)
}
