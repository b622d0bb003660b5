use std::collections::HashSet;
use std::ffi::OsString;
use std::io::Write;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::cli::cli_args::{
    help_command, help_flag, help_path, help_requested, RootArgs, HELP_COMMAND, ROOT_ABOUT,
    ROOT_LONG_ABOUT, ROOT_NAME,
};
use crate::cli::subcommands::{default_subcommands, SubcommandHandler};
use crate::cli::terminal::{flag_wrap_width, TerminalWidth, WidthSource};
use crate::cli::usage::{render_help, render_usage, UsageView};
use crate::utils::config::BuildInfo;
use crate::utils::error::ZapResult;
use crate::utils::logging::setup_logging;

/// The fully wired `zap` command tree
pub struct CommandTree {
    root: Command,
    build_info: BuildInfo,
    handlers: Vec<(String, Box<dyn SubcommandHandler>)>,
    width: Box<dyn WidthSource>,
}

impl CommandTree {
    /// Build the tree with the subscribe, publish and stats commands
    pub fn new(build_info: BuildInfo) -> Self {
        Self::with_subcommands(build_info, default_subcommands())
    }

    /// Build the tree around an explicit list of subcommands.
    ///
    /// Panics if two subcommands share a name or one is called `help`.
    pub fn with_subcommands(
        build_info: BuildInfo,
        subcommands: Vec<Box<dyn SubcommandHandler>>,
    ) -> Self {
        // augment_args copies the struct docs into about/long_about, so the
        // real texts go on afterwards.
        let mut root = RootArgs::augment_args(Command::new(ROOT_NAME))
            .about(ROOT_ABOUT)
            .long_about(ROOT_LONG_ABOUT)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .arg(help_flag(ROOT_NAME));

        let mut seen = HashSet::from([HELP_COMMAND.to_string()]);
        let mut handlers = Vec::with_capacity(subcommands.len());
        for handler in subcommands {
            let cmd = handler.command();
            let name = cmd.get_name().to_string();
            assert!(seen.insert(name.clone()), "subcommand '{}' registered twice", name);

            root = root.subcommand(cmd.disable_help_flag(true).arg(help_flag(&name)));
            handlers.push((name, handler));
        }
        root = root.subcommand(help_command(ROOT_NAME));

        setup_logging();

        Self {
            root,
            build_info,
            handlers,
            width: Box::new(TerminalWidth),
        }
    }

    /// Replace the width source used when rendering help
    pub fn with_width_source(mut self, source: impl WidthSource + 'static) -> Self {
        self.width = Box::new(source);
        self
    }

    /// Names of every child of the root, including `help`
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.root.get_subcommands().map(|c| c.get_name()).collect()
    }

    /// Parse `args` (program name first) and run the matched command.
    pub fn execute<I, T>(&self, args: I, out: &mut dyn Write) -> ZapResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.root.clone().try_get_matches_from(args)?;

        match matches.subcommand() {
            None => {
                if help_requested(&matches) {
                    return self.write_help(&[], out);
                }
                let root_args = RootArgs::from_arg_matches(&matches)?;
                self.run_root(&root_args, out)
            }
            Some((HELP_COMMAND, sub)) => self.run_help(sub, out),
            Some((name, sub)) => {
                if help_requested(sub) {
                    return self.write_help(&[name], out);
                }
                match self.handlers.iter().find(|(registered, _)| registered == name) {
                    Some((_, handler)) => {
                        tracing::debug!(command = name, "dispatching");
                        handler.run(sub, out)
                    }
                    None => Err(self.root.clone().error(
                        ErrorKind::InvalidSubcommand,
                        format!("unknown command \"{}\" for \"{}\"", name, ROOT_NAME),
                    )
                    .into()),
                }
            }
        }
    }

    /// `zap` with no subcommand: version line or the root help
    fn run_root(&self, args: &RootArgs, out: &mut dyn Write) -> ZapResult<()> {
        if args.version {
            writeln!(out, "{}", self.build_info.version_line())?;
            return Ok(());
        }
        self.write_help(&[], out)
    }

    fn run_help(&self, matches: &ArgMatches, out: &mut dyn Write) -> ZapResult<()> {
        if help_requested(matches) {
            return self.write_help(&[HELP_COMMAND], out);
        }

        let path = help_path(matches);
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        let known = self.resolve(&path);
        if known.is_empty() && !path.is_empty() {
            let topic = path
                .iter()
                .map(|p| format!("`{}`", p))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "Unknown help topic [{}]", topic)?;
            out.write_all(self.usage_text(&[]).as_bytes())?;
            return Ok(());
        }
        self.write_help(known, out)
    }

    fn write_help(&self, path: &[&str], out: &mut dyn Write) -> ZapResult<()> {
        out.write_all(self.help_text(path).as_bytes())?;
        Ok(())
    }

    /// Help for the command at `path` below the root. Names past the
    /// deepest known command are ignored.
    pub fn help_text(&self, path: &[&str]) -> String {
        render_help(&self.view(path), flag_wrap_width(self.width.as_ref()))
    }

    /// Usage for the command at `path` below the root
    pub fn usage_text(&self, path: &[&str]) -> String {
        render_usage(&self.view(path), flag_wrap_width(self.width.as_ref()))
    }

    /// Longest prefix of `path` naming commands in the tree
    fn resolve<'a, 'p>(&self, path: &'p [&'a str]) -> &'p [&'a str] {
        let mut node = &self.root;
        let mut depth = 0;
        for name in path {
            match node.find_subcommand(name) {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => break,
            }
        }
        &path[..depth]
    }

    fn view(&self, path: &[&str]) -> UsageView {
        let mut ancestors: Vec<&Command> = Vec::new();
        let mut node = &self.root;
        for name in self.resolve(path) {
            if let Some(child) = node.find_subcommand(name) {
                ancestors.push(node);
                node = child;
            }
        }
        UsageView::from_command(node, &ancestors)
    }
}

/// Build the tree and run it against the process arguments
pub fn run_cli(build_info: BuildInfo) -> anyhow::Result<()> {
    let tree = CommandTree::new(build_info);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    tree.execute(std::env::args_os(), &mut out)?;
    out.flush().context("failed to flush standard output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::terminal::FixedWidth;
    use crate::utils::error::ZapError;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Recording {
        name: &'static str,
        calls: Rc<Cell<usize>>,
    }

    impl SubcommandHandler for Recording {
        fn command(&self) -> Command {
            Command::new(self.name).about("records calls")
        }

        fn run(&self, _matches: &ArgMatches, _out: &mut dyn Write) -> ZapResult<()> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    fn tree() -> CommandTree {
        CommandTree::new(BuildInfo::new("1.2.3", "abc123")).with_width_source(FixedWidth(None))
    }

    fn run(tree: &CommandTree, args: &[&str]) -> (ZapResult<()>, String) {
        let mut out = Vec::new();
        let result = tree.execute(args.iter().copied(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_version_output() {
        let (result, out) = run(&tree(), &["zap", "--version"]);
        assert!(result.is_ok());
        assert_eq!(out, "zap version 1.2.3, Revision: abc123\n");
    }

    #[test]
    fn test_version_output_with_empty_build_info() {
        let tree = CommandTree::new(BuildInfo::new("", ""));
        let (result, out) = run(&tree, &["zap", "--version"]);
        assert!(result.is_ok());
        assert_eq!(out, "zap version , Revision: \n");
    }

    #[test]
    fn test_version_flag_with_explicit_value() {
        let tree = tree();
        let (result, out) = run(&tree, &["zap", "--version=true"]);
        assert!(result.is_ok());
        assert_eq!(out, "zap version 1.2.3, Revision: abc123\n");

        let (result, out) = run(&tree, &["zap", "--version=false"]);
        let (_, help) = run(&tree, &["zap", "--help"]);
        assert!(result.is_ok());
        assert_eq!(out, help);
    }

    #[test]
    fn test_root_help_shows_command_summaries() {
        let (_, out) = run(&tree(), &["zap"]);

        assert!(out.starts_with(ROOT_LONG_ABOUT));
        assert!(out.contains("\n  subscribe   Subscribe to topics on a MQTT broker\n"));
        assert!(!out.contains("Flags of"));
        assert!(!out.contains("Flags owned"));
    }

    #[test]
    fn test_help_path_ignores_trailing_names() {
        let tree = tree();
        let (result, out) = run(&tree, &["zap", "help", "subscribe", "extra"]);
        let (_, direct) = run(&tree, &["zap", "subscribe", "--help"]);

        assert!(result.is_ok());
        assert_eq!(out, direct);
        assert_eq!(tree.help_text(&["subscribe", "extra"]), tree.help_text(&["subscribe"]));
    }

    #[test]
    fn test_bare_root_prints_help() {
        let tree = tree();
        let (bare_result, bare) = run(&tree, &["zap"]);
        let (flag_result, flag) = run(&tree, &["zap", "--help"]);
        let (short_result, short) = run(&tree, &["zap", "-h"]);
        let (cmd_result, cmd) = run(&tree, &["zap", "help"]);

        assert!(bare_result.is_ok() && flag_result.is_ok() && short_result.is_ok() && cmd_result.is_ok());
        assert_eq!(bare, flag);
        assert_eq!(bare, short);
        assert_eq!(bare, cmd);
        assert!(bare.starts_with("zap - what happens when technology meets mosquito\n"));
    }

    #[test]
    fn test_root_help_layout() {
        let help = tree().help_text(&[]);
        let expected_usage = "Usage:
  zap [flags]
  zap [command]

Available Commands:
  help        Help about any command
  publish     Publish a message to a MQTT broker
  stats       Show statistics published by a MQTT broker
  subscribe   Subscribe to topics on a MQTT broker

Flags:
  -h, --help      help for zap
      --version   Display version information

Use \"zap [command] --help\" for more information about a command.
";
        assert_eq!(help, format!("{}\n\n{}", ROOT_LONG_ABOUT, expected_usage));
    }

    #[test]
    fn test_help_is_rendered_identically_twice() {
        let tree = tree();
        assert_eq!(tree.help_text(&["publish"]), tree.help_text(&["publish"]));
    }

    #[test]
    fn test_tree_has_three_subcommands_and_help() {
        let tree = tree();
        let mut names = tree.subcommand_names();
        names.sort();
        assert_eq!(names, vec!["help", "publish", "stats", "subscribe"]);
    }

    #[test]
    fn test_positional_argument_is_rejected() {
        let (result, out) = run(&tree(), &["zap", "extra"]);
        assert!(matches!(result, Err(ZapError::Cli(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_command_invokes_no_handler() {
        let calls = Rc::new(Cell::new(0));
        let tree = CommandTree::with_subcommands(
            BuildInfo::new("1", "r"),
            vec![Box::new(Recording { name: "stats", calls: Rc::clone(&calls) })],
        );

        let (result, _) = run(&tree, &["zap", "bogus-command"]);
        assert!(result.unwrap_err().is_parse_error());
        assert_eq!(calls.get(), 0);

        let (result, _) = run(&tree, &["zap", "stats"]);
        assert!(result.is_ok());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_subcommand_help_does_not_run_handler() {
        let calls = Rc::new(Cell::new(0));
        let tree = CommandTree::with_subcommands(
            BuildInfo::new("1", "r"),
            vec![Box::new(Recording { name: "stats", calls: Rc::clone(&calls) })],
        )
        .with_width_source(FixedWidth(Some(100)));

        let (result, out) = run(&tree, &["zap", "stats", "--help"]);
        assert!(result.is_ok());
        assert_eq!(calls.get(), 0);
        assert!(out.starts_with("records calls\n\nUsage:\n  zap stats [flags]\n"));
        assert!(out.contains("  -h, --help   help for stats"));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_subcommand_panics() {
        let calls = Rc::new(Cell::new(0));
        CommandTree::with_subcommands(
            BuildInfo::default(),
            vec![
                Box::new(Recording { name: "stats", calls: Rc::clone(&calls) }),
                Box::new(Recording { name: "stats", calls }),
            ],
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_help_name_is_reserved() {
        CommandTree::with_subcommands(
            BuildInfo::default(),
            vec![Box::new(Recording { name: "help", calls: Rc::new(Cell::new(0)) })],
        );
    }

    #[test]
    fn test_help_command_for_subcommand() {
        let tree = tree();
        let (result, via_help) = run(&tree, &["zap", "help", "publish"]);
        let (_, via_flag) = run(&tree, &["zap", "publish", "--help"]);

        assert!(result.is_ok());
        assert_eq!(via_help, via_flag);
        assert!(via_help.contains("Usage:\n  zap publish [flags]\n"));
        assert!(via_help.contains("$HOME/.zap.toml"));
        assert!(via_help.contains("      --host host"));
        assert!(via_help.contains("(default \"localhost\")"));
        assert!(via_help.contains("(default 1883)"));
    }

    #[test]
    fn test_help_for_unknown_topic() {
        let tree = tree();
        let (result, out) = run(&tree, &["zap", "help", "bogus"]);

        assert!(result.is_ok());
        assert!(out.starts_with("Unknown help topic [`bogus`]\nUsage:\n  zap [flags]\n"));
    }

    #[test]
    fn test_help_command_own_help() {
        let (result, out) = run(&tree(), &["zap", "help", "--help"]);
        assert!(result.is_ok());
        assert!(out.starts_with("Help provides help for any command in the application.\n"));
        assert!(out.contains("Usage:\n  zap help [command] [flags]\n"));
    }

    #[test]
    fn test_handler_failure_is_propagated() {
        let (result, _) = run(&tree(), &["zap", "publish", "--topic", "a/b"]);
        assert!(matches!(result, Err(ZapError::InvalidArgument(_))));
    }

    #[test]
    fn test_subcommand_dispatch() {
        let (result, out) = run(&tree(), &["zap", "subscribe", "-t", "sensors/#"]);
        assert!(result.is_ok());
        assert_eq!(out, "subscribe localhost:1883 topics=sensors/# qos=0\n");
    }

    #[test]
    fn test_flags_wrap_to_terminal_width() {
        let narrow = CommandTree::new(BuildInfo::default()).with_width_source(FixedWidth(Some(50)));
        let help = narrow.help_text(&["subscribe"]);
        let flags = help.split("Flags:\n").nth(1).unwrap();
        for line in flags.lines() {
            assert!(line.chars().count() <= 49, "line too wide: {:?}", line);
        }
    }
}
