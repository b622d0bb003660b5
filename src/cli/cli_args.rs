use clap::{Arg, ArgAction, ArgMatches, Args, Command};

pub const ROOT_NAME: &str = "zap";

pub const ROOT_ABOUT: &str = "Listen or publish to a MQTT broker";

pub const ROOT_LONG_ABOUT: &str = "zap - what happens when technology meets mosquito

zap is a little utility for publishing or subscribing to events for the
MQTT message bus";

pub const HELP_COMMAND: &str = "help";

/// Flags owned by the root command
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootArgs {
    /// Display version information
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = clap::value_parser!(bool)
    )]
    pub version: bool,
}

/// Whether `-h/--help` was passed to the matched command
pub fn help_requested(matches: &ArgMatches) -> bool {
    matches
        .try_get_one::<bool>("help")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// The `-h/--help` flag installed on every command in the tree
pub fn help_flag(command_name: &str) -> Arg {
    Arg::new("help")
        .short('h')
        .long("help")
        .action(ArgAction::SetTrue)
        .help(format!("help for {}", command_name))
}

/// `zap help [command]...`
pub fn help_command(root_name: &str) -> Command {
    Command::new(HELP_COMMAND)
        .about("Help about any command")
        .long_about(format!(
            "Help provides help for any command in the application.\nSimply type {} help [path to command] for full details.",
            root_name
        ))
        .disable_help_flag(true)
        .arg(help_flag(HELP_COMMAND))
        .arg(
            Arg::new("command")
                .value_name("command")
                .num_args(1..)
                .action(ArgAction::Append),
        )
}

/// Command path passed to `zap help`
pub fn help_path(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
