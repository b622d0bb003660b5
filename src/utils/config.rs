/// Version information reported by `zap --version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub revision: String,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            revision: revision.into(),
        }
    }

    /// Line printed by the root command when `--version` is set
    pub fn version_line(&self) -> String {
        format!("zap version {}, Revision: {}", self.version, self.revision)
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            revision: option_env!("ZAP_REVISION").unwrap_or("unknown").to_string(),
        }
    }
}

/// Location of the optional config file, as documented in the help text
pub const CONFIG_FILE_PATH: &str = "$HOME/.zap.toml";

/// Help paragraph describing the config file convention
pub const CONFIG_FILE_HELP: &str = "Many of the options for this command can be put in a config file.
You can create a config file at $HOME/.zap.toml.  Configs found in the config file will override built-in
defaults but can be overridden by explicit command-line options.

The format of the config file is written in Toml.  Sections in brackets (e.g. [broker]) can be
referenced with the --broker flag.  Values should be of the form qos = \"1\" and the keys will
have the same name as the option values listed above.";

/// Defaults shared by every subcommand that talks to a broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerDefaults {
    pub host: &'static str,
    pub port: u16,
    pub qos: u8,
}

pub const BROKER_DEFAULTS: BrokerDefaults = BrokerDefaults {
    host: "localhost",
    port: 1883,
    qos: 0,
};
