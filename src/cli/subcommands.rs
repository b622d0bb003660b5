use std::io::Write;

use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::utils::config::{BROKER_DEFAULTS, CONFIG_FILE_HELP};
use crate::utils::error::{ZapError, ZapResult};

/// A command composed into the zap tree.
///
/// The tree builder only needs the clap definition (name, help text and
/// flags) and a handler to call once the arguments are parsed.
pub trait SubcommandHandler {
    /// Definition of the command, including its flags
    fn command(&self) -> Command;

    /// Run the command with its parsed arguments
    fn run(&self, matches: &ArgMatches, out: &mut dyn Write) -> ZapResult<()>;
}

/// Connection flags shared by every command that talks to a broker
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BrokerArgs {
    /// Host name of the MQTT broker
    #[arg(long, value_name = "HOST", default_value = BROKER_DEFAULTS.host)]
    pub host: String,

    /// Port of the MQTT broker
    #[arg(short, long, value_name = "PORT", default_value_t = BROKER_DEFAULTS.port)]
    pub port: u16,

    /// Config file section to read broker settings from
    #[arg(long, value_name = "SECTION")]
    pub broker: Option<String>,

    /// Client identifier presented to the broker
    #[arg(short = 'i', long, value_name = "ID")]
    pub client_id: Option<String>,
}

impl BrokerArgs {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Flags of `zap subscribe`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SubscribeArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Topic filter to subscribe to, may be repeated
    #[arg(short, long, value_name = "TOPIC", default_value = "#")]
    pub topic: Vec<String>,

    /// Quality of service for the subscription
    #[arg(
        short,
        long,
        value_name = "QOS",
        default_value_t = BROKER_DEFAULTS.qos,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub qos: u8,
}

/// Flags of `zap publish`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PublishArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Topic to publish to
    #[arg(short, long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Message payload
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Ask the broker to retain the message
    #[arg(short, long)]
    pub retain: bool,

    /// Quality of service for the message
    #[arg(
        short,
        long,
        value_name = "QOS",
        default_value_t = BROKER_DEFAULTS.qos,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub qos: u8,
}

/// Flags of `zap stats`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatsArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Seconds between statistics reports
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,
}

/// Broker topic carrying the system statistics
pub const STATS_TOPIC: &str = "$SYS/#";

pub struct SubscribeCommand;

impl SubscribeCommand {
    /// Render the resolved request
    pub fn describe(args: &SubscribeArgs) -> String {
        format!(
            "subscribe {} topics={} qos={}",
            args.broker.address(),
            args.topic.join(","),
            args.qos
        )
    }
}

impl SubcommandHandler for SubscribeCommand {
    fn command(&self) -> Command {
        SubscribeArgs::augment_args(Command::new("subscribe"))
            .about("Subscribe to topics on a MQTT broker")
            .long_about(format!(
                "Subscribe to one or more topics on a MQTT broker and print each message received.\n\n{}",
                CONFIG_FILE_HELP
            ))
    }

    fn run(&self, matches: &ArgMatches, out: &mut dyn Write) -> ZapResult<()> {
        let args = SubscribeArgs::from_arg_matches(matches)?;
        tracing::debug!(?args, "resolved subscribe request");

        writeln!(out, "{}", Self::describe(&args))?;
        Ok(())
    }
}

pub struct PublishCommand;

impl PublishCommand {
    pub fn validate(args: &PublishArgs) -> ZapResult<(&str, &str)> {
        let topic = args
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ZapError::InvalidArgument("publish requires --topic".to_string()))?;

        if topic.contains(['+', '#']) {
            return Err(ZapError::InvalidArgument(format!(
                "cannot publish to wildcard topic '{}'",
                topic
            )));
        }

        let message = args
            .message
            .as_deref()
            .ok_or_else(|| ZapError::InvalidArgument("publish requires --message".to_string()))?;

        Ok((topic, message))
    }
}

impl SubcommandHandler for PublishCommand {
    fn command(&self) -> Command {
        PublishArgs::augment_args(Command::new("publish"))
            .about("Publish a message to a MQTT broker")
            .long_about(format!(
                "Publish a single message to a topic on a MQTT broker.\n\n{}",
                CONFIG_FILE_HELP
            ))
    }

    fn run(&self, matches: &ArgMatches, out: &mut dyn Write) -> ZapResult<()> {
        let args = PublishArgs::from_arg_matches(matches)?;
        let (topic, message) = Self::validate(&args)?;
        tracing::debug!(?args, "resolved publish request");

        writeln!(
            out,
            "publish {} topic={} qos={} retain={} bytes={}",
            args.broker.address(),
            topic,
            args.qos,
            args.retain,
            message.len()
        )?;
        Ok(())
    }
}

pub struct StatsCommand;

impl SubcommandHandler for StatsCommand {
    fn command(&self) -> Command {
        StatsArgs::augment_args(Command::new("stats"))
            .about("Show statistics published by a MQTT broker")
            .long_about(format!(
                "Report the statistics a MQTT broker publishes under {}.\n\n{}",
                STATS_TOPIC, CONFIG_FILE_HELP
            ))
    }

    fn run(&self, matches: &ArgMatches, out: &mut dyn Write) -> ZapResult<()> {
        let args = StatsArgs::from_arg_matches(matches)?;
        tracing::debug!(?args, "resolved stats request");

        writeln!(
            out,
            "stats {} topic={} interval={}s",
            args.broker.address(),
            STATS_TOPIC,
            args.interval
        )?;
        Ok(())
    }
}

pub fn new_subscribe_command() -> Box<dyn SubcommandHandler> {
    Box::new(SubscribeCommand)
}

pub fn new_publish_command() -> Box<dyn SubcommandHandler> {
    Box::new(PublishCommand)
}

pub fn new_stats_command() -> Box<dyn SubcommandHandler> {
    Box::new(StatsCommand)
}

/// The subscribe, publish and stats commands
pub fn default_subcommands() -> Vec<Box<dyn SubcommandHandler>> {
    vec![
        new_subscribe_command(),
        new_publish_command(),
        new_stats_command(),
    ]
}
