//! Inbound command parsing

use crate::messenger::{ChatId, UserId};

/// Commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `/start`: list the available commands
    Start,
    Status,
    GetIp,
    StartVm,
    StopVm,
    /// Any other `/command`
    Unknown,
}

impl CommandKind {
    /// Look up a command by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "start" => CommandKind::Start,
            "status" => CommandKind::Status,
            "get_ip" => CommandKind::GetIp,
            "start_vm" => CommandKind::StartVm,
            "stop_vm" => CommandKind::StopVm,
            _ => CommandKind::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Status => "status",
            CommandKind::GetIp => "get_ip",
            CommandKind::StartVm => "start_vm",
            CommandKind::StopVm => "stop_vm",
            CommandKind::Unknown => "unknown",
        }
    }

    /// Whether the command takes an instance ID argument
    pub fn requires_instance(&self) -> bool {
        matches!(
            self,
            CommandKind::Status | CommandKind::GetIp | CommandKind::StartVm | CommandKind::StopVm
        )
    }
}

/// A parsed `/command [arg ...]` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,

    /// First argument, if any
    pub arg: Option<String>,
}

impl Command {
    pub fn new(kind: CommandKind, arg: Option<&str>) -> Self {
        Self {
            kind,
            arg: arg.map(str::to_string),
        }
    }

    /// Parse a message text
    ///
    /// Returns `None` for text that is not a command. A `@botname` suffix on
    /// the command is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        if head.is_empty() {
            return None;
        }

        let name = head.split_once('@').map_or(head, |(name, _bot)| name);
        Some(Self::new(CommandKind::from_name(name), words.next()))
    }
}

/// One inbound command together with its requester context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Authenticated sender
    pub sender: UserId,

    /// Where replies go
    pub chat_id: ChatId,

    pub command: Command,
}
