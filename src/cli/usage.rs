use clap::{Arg, Command};

use crate::cli::terminal::{flag_wrap_width, WidthSource};

/// Narrowest name column in the command listings
const MIN_NAME_PADDING: usize = 11;
/// Usage text narrower than this is not worth wrapping
const MIN_WRAP_COLUMNS: usize = 24;
/// Indent used when the usage column is too far right to wrap in place
const FALLBACK_INDENT: usize = 16;

/// One flag as it appears in a usage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagEntry {
    pub short: Option<char>,
    pub long: String,
    pub value_name: Option<String>,
    pub help: String,
    pub default: Option<String>,
}

impl FlagEntry {
    pub fn switch(short: Option<char>, long: &str, help: &str) -> Self {
        Self {
            short,
            long: long.to_string(),
            value_name: None,
            help: help.to_string(),
            default: None,
        }
    }

    fn from_arg(arg: &Arg) -> Self {
        let long = arg
            .get_long()
            .map(str::to_string)
            .unwrap_or_else(|| arg.get_id().as_str().to_string());

        // `--flag[=value]` switches read as plain switches in the listing
        let optional_value = arg
            .get_num_args()
            .map(|range| range.min_values() == 0)
            .unwrap_or(false);
        let takes_value = arg.get_action().takes_values() && !optional_value;
        let value_name = takes_value.then(|| {
            arg.get_value_names()
                .and_then(|names| names.first())
                .map(|name| name.to_string().to_lowercase())
                .unwrap_or_else(|| "string".to_string())
        });

        let defaults: Vec<String> = arg
            .get_default_values()
            .iter()
            .map(|v| v.to_string_lossy().into_owned())
            .collect();
        let default = (takes_value && !defaults.is_empty()).then(|| format_default(&defaults));

        Self {
            short: arg.get_short(),
            long,
            value_name,
            help: arg.get_help().map(|h| h.to_string()).unwrap_or_default(),
            default,
        }
    }

    /// `  -p, --port port` part of the line
    fn signature(&self) -> String {
        let mut line = match self.short {
            Some(short) => format!("  -{}, --{}", short, self.long),
            None => format!("      --{}", self.long),
        };
        if let Some(value_name) = &self.value_name {
            line.push(' ');
            line.push_str(value_name);
        }
        line
    }

    fn description(&self) -> String {
        match &self.default {
            Some(default) => format!("{} (default {})", self.help, default),
            None => self.help.clone(),
        }
    }
}

fn format_default(values: &[String]) -> String {
    let joined = values.join(",");
    let bare = joined.parse::<f64>().is_ok() || joined == "true" || joined == "false";
    if bare {
        joined
    } else {
        format!("{:?}", joined)
    }
}

/// A child command as listed by its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub name: String,
    pub path: String,
    pub short: String,
    pub available: bool,
    pub help_topic: bool,
}

/// Everything the renderer needs to know about one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageView {
    pub name: String,
    pub command_path: String,
    pub use_line: String,
    pub short: String,
    pub long: String,
    pub runnable: bool,
    pub aliases: Vec<String>,
    pub commands: Vec<CommandEntry>,
    pub local_flags: Vec<FlagEntry>,
    pub inherited_flags: Vec<FlagEntry>,
}

impl UsageView {
    /// Compute the view of `cmd`, where `ancestors` runs from the root down
    /// to the direct parent.
    pub fn from_command(cmd: &Command, ancestors: &[&Command]) -> Self {
        let command_path = ancestors
            .iter()
            .map(|c| c.get_name())
            .chain(std::iter::once(cmd.get_name()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut local_flags: Vec<FlagEntry> = cmd
            .get_arguments()
            .filter(|arg| !arg.is_positional() && !arg.is_hide_set())
            .map(FlagEntry::from_arg)
            .collect();
        local_flags.sort_by(|a, b| a.long.cmp(&b.long));

        let mut inherited_flags: Vec<FlagEntry> = ancestors
            .iter()
            .flat_map(|c| c.get_arguments())
            .filter(|arg| arg.is_global_set() && !arg.is_positional() && !arg.is_hide_set())
            .map(FlagEntry::from_arg)
            .filter(|flag| !local_flags.iter().any(|local| local.long == flag.long))
            .collect();
        inherited_flags.sort_by(|a, b| a.long.cmp(&b.long));
        inherited_flags.dedup_by(|a, b| a.long == b.long);

        let mut use_line = command_path.clone();
        for arg in cmd.get_arguments().filter(|arg| arg.is_positional()) {
            use_line.push(' ');
            use_line.push_str(&positional_usage(arg));
        }
        if !local_flags.is_empty() || !inherited_flags.is_empty() {
            use_line.push_str(" [flags]");
        }

        let mut commands: Vec<CommandEntry> = cmd
            .get_subcommands()
            .map(|child| CommandEntry {
                name: child.get_name().to_string(),
                path: format!("{} {}", command_path, child.get_name()),
                short: child.get_about().map(|s| s.to_string()).unwrap_or_default(),
                available: is_available(child),
                help_topic: is_help_topic(child),
            })
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            name: cmd.get_name().to_string(),
            command_path,
            use_line,
            short: cmd.get_about().map(|s| s.to_string()).unwrap_or_default(),
            long: cmd.get_long_about().map(|s| s.to_string()).unwrap_or_default(),
            runnable: is_runnable(cmd),
            aliases: cmd.get_visible_aliases().map(str::to_string).collect(),
            commands,
            local_flags,
            inherited_flags,
        }
    }

    pub fn has_available_subcommands(&self) -> bool {
        self.commands.iter().any(|c| c.available)
    }

    pub fn has_help_topics(&self) -> bool {
        self.commands.iter().any(|c| c.help_topic)
    }

    fn name_padding(&self) -> usize {
        self.commands
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(MIN_NAME_PADDING)
    }

    fn path_padding(&self) -> usize {
        self.commands
            .iter()
            .map(|c| c.path.chars().count())
            .max()
            .unwrap_or(0)
            .max(MIN_NAME_PADDING)
    }
}

/// A node is runnable unless it exists only to group subcommands
fn is_runnable(cmd: &Command) -> bool {
    !cmd.is_subcommand_required_set()
}

fn is_available(cmd: &Command) -> bool {
    if cmd.is_hide_set() || cmd.get_name() == "help" {
        return false;
    }
    is_runnable(cmd) || cmd.get_subcommands().any(is_available)
}

fn is_help_topic(cmd: &Command) -> bool {
    !cmd.is_hide_set() && !is_runnable(cmd) && !cmd.has_subcommands()
}

fn positional_usage(arg: &Arg) -> String {
    let name = arg
        .get_value_names()
        .and_then(|names| names.first())
        .map(|name| name.to_string().to_lowercase())
        .unwrap_or_else(|| arg.get_id().as_str().to_string());
    if arg.is_required_set() {
        format!("<{}>", name)
    } else {
        format!("[{}]", name)
    }
}

/// Format a flag block, wrapping usage text to `cols` columns (0 disables
/// wrapping).
pub fn flag_usages(flags: &[FlagEntry], cols: usize) -> String {
    let mut sorted: Vec<&FlagEntry> = flags.iter().collect();
    sorted.sort_by(|a, b| a.long.cmp(&b.long));

    let lines: Vec<(String, String)> = sorted
        .iter()
        .map(|flag| (flag.signature(), flag.description()))
        .collect();
    let widest = lines
        .iter()
        .map(|(sig, _)| sig.chars().count())
        .max()
        .unwrap_or(0);
    let indent = widest + 3;

    let mut out = String::new();
    for (sig, desc) in &lines {
        out.push_str(sig);
        out.push_str(&" ".repeat(indent - sig.chars().count()));
        out.push_str(&wrap_usage(indent, cols, desc));
        out.push('\n');
    }
    out
}

fn wrap_usage(indent: usize, cols: usize, text: &str) -> String {
    if cols == 0 {
        return reindent(text, indent);
    }
    if cols.saturating_sub(indent) >= MIN_WRAP_COLUMNS {
        return wrap_lines(text, cols - indent, indent);
    }
    if cols.saturating_sub(FALLBACK_INDENT) >= MIN_WRAP_COLUMNS {
        return format!(
            "\n{}{}",
            " ".repeat(FALLBACK_INDENT),
            wrap_lines(text, cols - FALLBACK_INDENT, FALLBACK_INDENT)
        );
    }
    reindent(text, indent)
}

fn wrap_lines(text: &str, width: usize, indent: usize) -> String {
    textwrap::wrap(text, width).join(&format!("\n{}", " ".repeat(indent)))
}

fn reindent(text: &str, indent: usize) -> String {
    text.replace('\n', &format!("\n{}", " ".repeat(indent)))
}

/// The local flag block wrapped to the current terminal width
pub fn wrapped_flag_usages(view: &UsageView, source: &dyn WidthSource) -> String {
    flag_usages(&view.local_flags, flag_wrap_width(source))
}

/// Render the usage text for a command, wrapping local flags to `cols`.
pub fn render_usage(view: &UsageView, cols: usize) -> String {
    let mut out = String::from("Usage:");
    let has_subcommands = view.has_available_subcommands();

    if view.runnable {
        out.push_str(&format!("\n  {}", view.use_line));
    }
    if has_subcommands {
        out.push_str(&format!("\n  {} [command]", view.command_path));
    }

    if !view.aliases.is_empty() {
        let mut names = vec![view.name.clone()];
        names.extend(view.aliases.iter().cloned());
        out.push_str(&format!("\n\nAliases:\n  {}", names.join(", ")));
    }

    if has_subcommands {
        out.push_str("\n\nAvailable Commands:");
        let padding = view.name_padding();
        for entry in view.commands.iter().filter(|c| c.available || c.name == "help") {
            out.push_str(&format!("\n  {:<width$} {}", entry.name, entry.short, width = padding));
        }
    }

    if !view.local_flags.is_empty() {
        out.push_str("\n\nFlags:\n");
        out.push_str(flag_usages(&view.local_flags, cols).trim_end());
    }

    if !view.inherited_flags.is_empty() {
        out.push_str("\n\nGlobal Flags:\n");
        out.push_str(flag_usages(&view.inherited_flags, 0).trim_end());
    }

    if view.has_help_topics() {
        out.push_str("\n\nAdditional help topics:");
        let padding = view.path_padding();
        for entry in view.commands.iter().filter(|c| c.help_topic) {
            out.push_str(&format!("\n  {:<width$} {}", entry.path, entry.short, width = padding));
        }
    }

    if has_subcommands {
        out.push_str(&format!(
            "\n\nUse \"{} [command] --help\" for more information about a command.",
            view.command_path
        ));
    }

    out.push('\n');
    out
}

/// Full help: the long description (or the short one), then the usage text.
pub fn render_help(view: &UsageView, cols: usize) -> String {
    let description = if view.long.trim().is_empty() {
        view.short.trim_end()
    } else {
        view.long.trim_end()
    };

    let mut out = String::new();
    if !description.is_empty() {
        out.push_str(description);
        out.push_str("\n\n");
    }
    if view.runnable || !view.commands.is_empty() {
        out.push_str(&render_usage(view, cols));
    }
    out
}
