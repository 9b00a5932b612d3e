use super::{actions, format, LEADERBOARD_SIZE};
use crate::archi::{Capturer, TimerError};
use crate::bot::prelude::*;
use crate::command;
use crate::core::command::Command;

pub(super) const COMMANDS: &[fn() -> Command] = &[
    archi,
    archipasmoi,
    timer,
    repop,
    deletearchi,
    classement,
    totalarchi,
];

command!(
    archi,
    description: "Enregistre la capture d'un archi et te donne les points.",
    usage: "<Archimonstre>",
    example: "Bulgig",
    executor: _archi,
);
async fn _archi(ctx: MessageContext) -> Result {
    let name = ctx.required_args()?;
    let captured_by = Capturer::member(ctx.event.author.id.0, ctx.author_name());

    let registered = actions::register(ctx.state.store(), name, captured_by, ctx.state.now())?;

    log::info!(
        "[BOT] {} captured '{}'",
        registered.timer.captured_by.name(),
        registered.timer.display_name
    );

    ctx.respond(format::registered(
        &registered.timer,
        registered.points,
        registered.previous.as_ref(),
    ))
    .await?;

    Ok(())
}

command!(
    archipasmoi,
    description: "Enregistre un archi capturé par quelqu'un d'autre, sans points.",
    usage: "<Archimonstre>",
    example: "Bulgig",
    executor: _archipasmoi,
);
async fn _archipasmoi(ctx: MessageContext) -> Result {
    let name = ctx.required_args()?;

    let registered = actions::register(ctx.state.store(), name, Capturer::External, ctx.state.now())?;

    ctx.respond(format::registered(
        &registered.timer,
        None,
        registered.previous.as_ref(),
    ))
    .await?;

    Ok(())
}

command!(
    timer,
    description: "Affiche le timer d'un archi.",
    usage: "<Archimonstre>",
    example: "Bulgig",
    executor: _timer,
);
async fn _timer(ctx: MessageContext) -> Result {
    let name = ctx.required_args()?;
    let now = ctx.state.now();

    let content = match actions::query(ctx.state.store(), name, now) {
        Ok(timer) => format::timer_status(&timer, now),
        Err(err) => format::timer_error(name, err),
    };

    ctx.respond(content).await?;
    Ok(())
}

command!(
    repop,
    description: "Liste les archis en repop et ceux à venir.",
    executor: _repop,
);
async fn _repop(ctx: MessageContext) -> Result {
    let now = ctx.state.now();
    let (active, upcoming) = actions::repops(ctx.state.store(), now);

    ctx.respond(format::repops(&active, &upcoming, now)).await?;
    Ok(())
}

command!(
    deletearchi,
    description: "Supprime le timer d'un archi et retire les points de sa capture.",
    usage: "<Archimonstre>",
    example: "Bulgig",
    restricted: true,
    executor: _deletearchi,
);
async fn _deletearchi(ctx: MessageContext) -> Result {
    let name = ctx.required_args()?;

    let content = match actions::delete(ctx.state.store(), name)? {
        Some(deleted) => {
            log::info!(
                "[BOT] {} deleted the timer of '{}'",
                ctx.event.author.name,
                deleted.timer.display_name
            );
            format::deleted(&deleted.timer, deleted.revoked)
        }
        None => format::timer_error(name, TimerError::NotFound),
    };

    ctx.respond(content).await?;
    Ok(())
}

command!(
    classement,
    description: "Affiche le classement de la semaine.",
    executor: _classement,
);
async fn _classement(ctx: MessageContext) -> Result {
    let entries = actions::leaderboard(ctx.state.store(), LEADERBOARD_SIZE);

    ctx.respond_embed("🏆 Classement de la semaine", format::leaderboard(&entries))
        .await?;
    Ok(())
}

command!(
    totalarchi,
    description: "Affiche le total de points d'archis du jour.",
    executor: _totalarchi,
);
async fn _totalarchi(ctx: MessageContext) -> Result {
    let total = actions::daily_total(ctx.state.store(), ctx.state.now());

    ctx.respond(format::daily_total(total)).await?;
    Ok(())
}
