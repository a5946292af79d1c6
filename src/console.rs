//! Stdin console standing in for a game server.
//!
//! Each line is one command acting on behalf of a named player, e.g.
//! `say Steve hello` or `msg Steve Alex hi`. Rendered messages come out of
//! the sink drained in `main`.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use herald::chat::{ChatCore, DeliveryOutcome, DeliveryReport, MuteSource};
use herald::common::types::{Location, PlayerHandle, UserId};
use herald::config::load_and_validate;
use herald::hook::VanishHook;
use herald::user::ChatUser;

const HELP: &str = r#"Commands:
  join <player> [<world> <x> <y> <z>]   connect a player
  quit <player>                         disconnect a player
  move <player> <world> <x> <y> <z>     set a player's location
  say <player> <text>                   chat in the current channel
  ch <player> <channel> <text>          chat in another channel
  switch <player> <channel>             change current channel
  msg <player> <to> <text>              private message
  reply <player> <text>                 answer the last private message
  ignore <player> <target>              ignore a player
  unignore <player> <target>            stop ignoring a player
  ignores <player>                      list who a player ignores
  nick <player> [<name>]                set or clear a display name
  toggle <player> chat|mentions|pm|spy  flip a personal toggle
  grant <player> <permission>           give a permission
  revoke <player> <permission>          take a permission
  vanish <player>                       hide or unhide a player
  format <player> <format> <text>       preview a format
  channels                              list channels
  who                                   list online players
  reload                                reload the config file
  help                                  show this text"#;

/// Vanish provider driven by the `vanish` command.
#[derive(Debug, Default)]
pub struct ConsoleVanish {
    vanished: RwLock<HashSet<UserId>>,
}

impl ConsoleVanish {
    /// Flip `id`'s vanish state. Returns whether it is now vanished.
    fn toggle(&self, id: UserId) -> bool {
        let mut vanished = self.vanished.write();
        if vanished.remove(&id) {
            false
        } else {
            vanished.insert(id);
            true
        }
    }
}

impl VanishHook for ConsoleVanish {
    fn name(&self) -> &str {
        "console"
    }

    fn is_vanished(&self, user: &ChatUser) -> bool {
        self.vanished.read().contains(&user.id())
    }
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join { player: String, location: Option<Location> },
    Quit { player: String },
    Move { player: String, location: Location },
    Say { player: String, text: String },
    Channel { player: String, channel: String, text: String },
    Switch { player: String, channel: String },
    Msg { player: String, to: String, text: String },
    Reply { player: String, text: String },
    Ignore { player: String, target: String },
    Unignore { player: String, target: String },
    Ignores { player: String },
    Nick { player: String, name: Option<String> },
    Toggle { player: String, toggle: String },
    Grant { player: String, permission: String },
    Revoke { player: String, permission: String },
    Vanish { player: String },
    Format { player: String, format: String, text: String },
    Channels,
    Who,
    Reload,
    Help,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (command, rest) = split_word(line);
        let command = command.to_lowercase();

        let parsed = match command.as_str() {
            "join" => {
                let (player, rest) = required_word(rest, "join <player>")?;
                let location = if rest.is_empty() {
                    None
                } else {
                    Some(parse_location(rest)?)
                };
                ConsoleCommand::Join { player, location }
            }
            "quit" => ConsoleCommand::Quit {
                player: required_word(rest, "quit <player>")?.0,
            },
            "move" => {
                let (player, rest) = required_word(rest, "move <player> <world> <x> <y> <z>")?;
                ConsoleCommand::Move {
                    player,
                    location: parse_location(rest)?,
                }
            }
            "say" => {
                let (player, text) = required_word(rest, "say <player> <text>")?;
                ConsoleCommand::Say {
                    player,
                    text: text.to_string(),
                }
            }
            "ch" => {
                let (player, rest) = required_word(rest, "ch <player> <channel> <text>")?;
                let (channel, text) = required_word(rest, "ch <player> <channel> <text>")?;
                ConsoleCommand::Channel {
                    player,
                    channel,
                    text: text.to_string(),
                }
            }
            "switch" => {
                let (player, rest) = required_word(rest, "switch <player> <channel>")?;
                ConsoleCommand::Switch {
                    player,
                    channel: required_word(rest, "switch <player> <channel>")?.0,
                }
            }
            "msg" | "tell" | "w" => {
                let (player, rest) = required_word(rest, "msg <player> <to> <text>")?;
                let (to, text) = required_word(rest, "msg <player> <to> <text>")?;
                ConsoleCommand::Msg {
                    player,
                    to,
                    text: text.to_string(),
                }
            }
            "reply" | "r" => {
                let (player, text) = required_word(rest, "reply <player> <text>")?;
                ConsoleCommand::Reply {
                    player,
                    text: text.to_string(),
                }
            }
            "ignore" | "unignore" => {
                let usage = "ignore <player> <target>";
                let (player, rest) = required_word(rest, usage)?;
                let target = required_word(rest, usage)?.0;
                if command == "ignore" {
                    ConsoleCommand::Ignore { player, target }
                } else {
                    ConsoleCommand::Unignore { player, target }
                }
            }
            "ignores" => ConsoleCommand::Ignores {
                player: required_word(rest, "ignores <player>")?.0,
            },
            "nick" => {
                let (player, rest) = required_word(rest, "nick <player> [<name>]")?;
                let name = rest.trim();
                ConsoleCommand::Nick {
                    player,
                    name: (!name.is_empty()).then(|| name.to_string()),
                }
            }
            "toggle" => {
                let usage = "toggle <player> chat|mentions|pm|spy";
                let (player, rest) = required_word(rest, usage)?;
                ConsoleCommand::Toggle {
                    player,
                    toggle: required_word(rest, usage)?.0.to_lowercase(),
                }
            }
            "grant" | "revoke" => {
                let usage = "grant <player> <permission>";
                let (player, rest) = required_word(rest, usage)?;
                let permission = required_word(rest, usage)?.0;
                if command == "grant" {
                    ConsoleCommand::Grant { player, permission }
                } else {
                    ConsoleCommand::Revoke { player, permission }
                }
            }
            "vanish" => ConsoleCommand::Vanish {
                player: required_word(rest, "vanish <player>")?.0,
            },
            "format" => {
                let usage = "format <player> <format> <text>";
                let (player, rest) = required_word(rest, usage)?;
                let (format, text) = required_word(rest, usage)?;
                ConsoleCommand::Format {
                    player,
                    format,
                    text: text.to_string(),
                }
            }
            "channels" => ConsoleCommand::Channels,
            "who" | "online" => ConsoleCommand::Who,
            "reload" => ConsoleCommand::Reload,
            "help" | "?" => ConsoleCommand::Help,
            other => bail!("Unknown command '{}', try 'help'", other),
        };
        Ok(parsed)
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

fn required_word<'a>(s: &'a str, usage: &str) -> Result<(String, &'a str)> {
    let (word, rest) = split_word(s);
    if word.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok((word.to_string(), rest))
}

fn parse_location(s: &str) -> Result<Location> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let [world, x, y, z] = parts.as_slice() else {
        bail!("Expected <world> <x> <y> <z>");
    };
    let coord = |v: &str| {
        v.parse::<f64>()
            .map_err(|_| anyhow!("'{}' is not a coordinate", v))
    };
    Ok(Location::new(*world, coord(*x)?, coord(*y)?, coord(*z)?))
}

/// Executes console commands against a [`ChatCore`].
pub struct Console {
    core: Arc<ChatCore>,
    config_path: String,
    vanish: Arc<ConsoleVanish>,
}

impl Console {
    pub fn new(core: Arc<ChatCore>, config_path: impl Into<String>) -> Self {
        let vanish = Arc::new(ConsoleVanish::default());
        core.hooks().register_vanish(vanish.clone());
        Self {
            core,
            config_path: config_path.into(),
            vanish,
        }
    }

    /// Run one line and describe the result.
    pub fn execute(&self, line: &str) -> String {
        debug!(line, "Console command");
        match ConsoleCommand::parse(line).and_then(|command| self.run(command)) {
            Ok(reply) => reply,
            Err(e) => format!("Error: {}", e),
        }
    }

    fn run(&self, command: ConsoleCommand) -> Result<String> {
        let core = &self.core;

        let reply = match command {
            ConsoleCommand::Join { player, location } => {
                if core.users().find_by_name(&player).is_some() {
                    bail!("{} is already online", player);
                }
                let user = core.join(&PlayerHandle::new(Uuid::new_v4(), player));
                user.set_location(location);
                format!("{} joined", user.name())
            }
            ConsoleCommand::Quit { player } => {
                let user = self.player(&player)?;
                core.quit(&user.id());
                format!("{} left", user.name())
            }
            ConsoleCommand::Move { player, location } => {
                let user = self.player(&player)?;
                user.set_location(Some(location));
                format!("{} moved", user.name())
            }
            ConsoleCommand::Say { player, text } => {
                let user = self.player(&player)?;
                describe(&core.chat(&user, &text))
            }
            ConsoleCommand::Channel {
                player,
                channel,
                text,
            } => {
                let user = self.player(&player)?;
                describe(&core.send_to_channel(&user, &channel, &text)?)
            }
            ConsoleCommand::Switch { player, channel } => {
                let user = self.player(&player)?;
                let channel = core.switch_channel(&user, &channel)?;
                format!("{} is now in {}", user.name(), channel.name())
            }
            ConsoleCommand::Msg { player, to, text } => {
                let user = self.player(&player)?;
                describe(&core.whisper(&user, &to, &text)?)
            }
            ConsoleCommand::Reply { player, text } => {
                let user = self.player(&player)?;
                describe(&core.reply(&user, &text)?)
            }
            ConsoleCommand::Ignore { player, target } => {
                let user = self.player(&player)?;
                let target = core.ignore(&user, &target)?;
                format!("{} now ignores {}", user.name(), target.name())
            }
            ConsoleCommand::Unignore { player, target } => {
                let user = self.player(&player)?;
                let target = core.unignore(&user, &target)?;
                format!("{} no longer ignores {}", user.name(), target.name())
            }
            ConsoleCommand::Ignores { player } => {
                let user = self.player(&player)?;
                let mut names: Vec<_> = user
                    .ignored()
                    .iter()
                    .map(|id| match core.users().get_optional_user(id) {
                        Some(ignored) => ignored.name().to_string(),
                        None => id.to_string(),
                    })
                    .collect();
                names.sort();
                if names.is_empty() {
                    format!("{} ignores nobody", user.name())
                } else {
                    format!("{} ignores: {}", user.name(), names.join(", "))
                }
            }
            ConsoleCommand::Nick { player, name } => {
                let user = self.player(&player)?;
                let reply = match &name {
                    Some(name) => format!("{} is now shown as {}", user.name(), name),
                    None => format!("{} is shown by name", user.name()),
                };
                user.set_display_name(name);
                reply
            }
            ConsoleCommand::Toggle { player, toggle } => {
                let user = self.player(&player)?;
                let enabled = match toggle.as_str() {
                    "chat" => {
                        let enabled = !user.chat_enabled();
                        user.set_chat_enabled(enabled);
                        enabled
                    }
                    "mentions" => {
                        let enabled = !user.mentions_enabled();
                        user.set_mentions_enabled(enabled);
                        enabled
                    }
                    "pm" => {
                        let enabled = !user.private_messages_enabled();
                        user.set_private_messages_enabled(enabled);
                        enabled
                    }
                    "spy" => {
                        let enabled = !user.social_spy();
                        user.set_social_spy(enabled);
                        enabled
                    }
                    other => bail!("Unknown toggle '{}' (use: chat, mentions, pm, spy)", other),
                };
                format!(
                    "{} {} for {}",
                    toggle,
                    if enabled { "on" } else { "off" },
                    user.name()
                )
            }
            ConsoleCommand::Grant { player, permission } => {
                let user = self.player(&player)?;
                user.grant(permission.as_str());
                format!("Granted {} to {}", permission, user.name())
            }
            ConsoleCommand::Revoke { player, permission } => {
                let user = self.player(&player)?;
                user.revoke(&permission);
                format!("Revoked {} from {}", permission, user.name())
            }
            ConsoleCommand::Vanish { player } => {
                let user = self.player(&player)?;
                let vanished = self.vanish.toggle(user.id());
                format!(
                    "{} is {}",
                    user.name(),
                    if vanished { "vanished" } else { "visible" }
                )
            }
            ConsoleCommand::Format {
                player,
                format,
                text,
            } => {
                let user = self.player(&player)?;
                core.format_test(&user, &format, &text)?
            }
            ConsoleCommand::Channels => {
                let state = core.state();
                state
                    .channels
                    .channels()
                    .iter()
                    .map(|c| {
                        format!(
                            "{} ({}) commands: {}",
                            c.name(),
                            c.kind().type_name(),
                            c.commands().join(", ")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ConsoleCommand::Who => {
                let users = core.users().users();
                let names: Vec<_> = users.iter().map(|u| u.name()).collect();
                format!("{} online: {}", names.len(), names.join(", "))
            }
            ConsoleCommand::Reload => {
                let config = load_and_validate(&self.config_path)?;
                core.reload(&config)?;
                info!("Reloaded {}", self.config_path);
                "Configuration reloaded".to_string()
            }
            ConsoleCommand::Help => HELP.to_string(),
        };
        Ok(reply)
    }

    fn player(&self, name: &str) -> Result<Arc<ChatUser>> {
        self.core
            .users()
            .find_by_name(name)
            .ok_or_else(|| anyhow!("{} is not online", name))
    }
}

fn describe(report: &DeliveryReport) -> String {
    match &report.outcome {
        DeliveryOutcome::Delivered => format!(
            "Delivered in {} to {} recipient(s), {} mentioned",
            report.channel, report.audience, report.mentioned
        ),
        DeliveryOutcome::Rejected(reason) => format!("Rejected: {}", reason),
        DeliveryOutcome::SenderMuted(MuteSource::SelfToggle) => {
            "Not sent: chat is turned off".to_string()
        }
        DeliveryOutcome::SenderMuted(MuteSource::Hook(hook)) => {
            format!("Not sent: muted by {}", hook)
        }
        DeliveryOutcome::NoPermission => {
            format!("Not sent: no permission for channel {}", report.channel)
        }
    }
}
