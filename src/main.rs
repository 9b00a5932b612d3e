mod archi;
mod bot;
mod builtin;
mod config;
mod core;
mod help;
mod logger;
mod macros;
#[cfg(feature = "permissions")]
mod permissions;
mod plugins;
mod signal;

use crate::bot::Error;
use crate::config::{Config, TOKEN_VAR};
use crate::core::{router::parse_command, state::State, store::Store};

use async_trait::async_trait;
use clap::Parser;
use serenity::{
    client::{bridge::gateway::GatewayIntents, Client, Context, EventHandler},
    model::{channel::Message, gateway::Ready},
    utils::Color,
};
use tokio::select;

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Path of the default config.toml file.
const DEFAULT_CONFIG: &str = "./config.toml";

/// The color of all embeds sent by the bot.
pub(crate) const EMBED_COLOR: Color = Color::from_rgb(0xFF, 0xA6, 0x00);

#[derive(Debug, Parser)]
#[clap(name = "archibot", version, about)]
struct Args {
    /// Provide a path to the config file
    #[clap(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load {}: {}", args.config.display(), err);
            process::exit(1);
        }
    };

    if let Err(err) = config.resolve_token(env::var(TOKEN_VAR).ok()) {
        eprintln!("{}", err);
        process::exit(1);
    }

    if let Err(err) = logger::init(&config) {
        eprintln!("Failed to initialize logger: {}", err);
    }

    signal::init();

    // Validated while loading the config.
    let tz = match config.tz() {
        Ok(tz) => tz,
        Err(err) => {
            log::error!("[CORE] {}", err);
            process::exit(1);
        }
    };

    let store = match Store::open(&config.state_file) {
        Ok(store) => store,
        Err(err) => {
            log::error!("[CORE] Failed to open state file: {}", err);
            log::error!("[CORE] Fatal error, exiting");
            process::exit(1);
        }
    };
    store.configure(config.points.policy(), &config.points.rare_archis);

    let gateway_intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES;

    let token = config.token.clone();
    let state = Arc::new(State::new(config, tz, store));

    log::info!("[CORE] Loading builtin commands");

    if let Err(err) = builtin::init(&state) {
        log::error!("[CORE] Failed to load builtin functions: {}", err);
        log::error!("[CORE] Fatal error, exiting");
        process::exit(1);
    }

    if let Err(err) = plugins::init(&state).await {
        log::error!("[CORE] Failed to load plugin: {}", err);
        log::error!("[CORE] Fatal error, exiting");
        process::exit(1);
    }

    log::info!("[BOT] Connecting");

    let mut client = match Client::builder(&token)
        .intents(gateway_intents)
        .event_handler(Handler {
            state: state.clone(),
        })
        .await
    {
        Ok(client) => client,
        Err(err) => {
            log::error!("[BOT] Failed to create client: {}", err);
            process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();

    select! {
        res = client.start() => {
            if let Err(err) = res {
                log::error!("[BOT] Client stopped: {}", err);
            }
        }
        _ = signal::subscribe() => {
            log::info!("[CORE] Shutting down");
            shard_manager.lock().await.shutdown_all().await;
        }
    }

    if let Err(err) = state.store().persist() {
        log::error!("[STORE] Failed to save state: {}", err);
    }
}

pub struct Handler {
    state: Arc<State>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, raw_ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }

        let (cmd, args) = match parse_command(&message.content, &self.state.config.prefix) {
            Some((name, args)) => match self.state.commands().get_command(name) {
                Some(cmd) => (cmd, args.to_owned()),
                None => return,
            },
            None => return,
        };

        let mut ctx = bot::Context::new(raw_ctx, self.state.clone(), message);
        ctx.args = args;

        let prefix = &self.state.config.prefix;

        #[cfg(feature = "permissions")]
        {
            if !permissions::has_permission(&ctx, &cmd) {
                let _ = ctx
                    .respond(":no_entry_sign: Tu n'as pas le droit d'utiliser cette commande.")
                    .await;

                return;
            }
        }

        let executor = match &cmd.executor {
            Some(executor) => executor,
            None => {
                let _ = ctx
                    .respond_embed(
                        format!("Aide : {}", cmd.name),
                        help::command(&cmd, prefix),
                    )
                    .await;
                return;
            }
        };

        match executor.send(ctx.clone()).await {
            Ok(()) => (),
            // Display command help message.
            Err(Error::InvalidCommandUsage) => {
                let _ = ctx
                    .respond_embed(
                        format!("Aide : {}", cmd.name),
                        help::command(&cmd, prefix),
                    )
                    .await;
            }
            Err(err) => {
                let _ = ctx
                    .respond(":warning: Une erreur interne est survenue.")
                    .await;
                log::error!("[BOT] Command '{}' returned an error: {}", cmd.name, err);
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("[BOT] Bot online as {}", ready.user.name);

        let ctx = bot::Context::new(ctx, self.state.clone(), ());
        self.state.tasks().update_context(Some(ctx)).await;
    }
}
