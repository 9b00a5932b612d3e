use crate::bot::prelude::*;
use crate::core::{command::Command, state::State};
use crate::{command, help};

/// Loads all builtin commands into the [`State`].
pub fn init(state: &State) -> Result {
    const COMMANDS: &[fn() -> Command] = &[archihelp];

    for f in COMMANDS {
        state.commands().load_command(f())?;
    }

    Ok(())
}

command!(
    archihelp,
    description: "Affiche la liste des commandes.",
    executor: _archihelp,
);
async fn _archihelp(ctx: MessageContext) -> Result {
    let description = help::global(
        &ctx.state.commands().list_commands(),
        &ctx.state.config.prefix,
    );

    ctx.respond_embed("📖 Aide ArchiBot", description).await?;
    Ok(())
}
