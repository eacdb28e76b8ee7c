//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for dispatch results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Response text followed by the routing summary
    #[default]
    Full,
    /// Only the response text
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for agent-relay
#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about = "Route tasks and recurring jobs to the best-suited agent")]
#[command(long_about = r#"
Agent Relay picks the best agent for each natural-language task, runs it, and
streams progress back. Recurring jobs fire on a schedule and avoid repeating
themselves by serving pre-generated batches or steering away from past answers.

Configuration files are loaded from (in priority order):
1. RELAY_* environment variables (RELAY_SELECTION__DEFAULT_AGENT=...)
2. --config <path>     Explicit config file
3. ./relay.toml        Project-level config
4. ~/.config/agent-relay/config.toml   Global config

Example:
  agent-relay ask "Find recent papers on retrieval-augmented generation"
  agent-relay ask --stream --identity alice "What's the weather in Lisbon?"
  agent-relay agents --identity alice
  agent-relay serve --bind 0.0.0.0:8787
  agent-relay poll
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP/SSE server (and the job poller)
    Serve {
        /// Address to bind, overriding [server].bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Do not fire recurring jobs in the background
        #[arg(long)]
        no_poll: bool,
    },

    /// Route a single task and print the result
    Ask {
        /// The task to route
        task: String,

        /// Caller identity (scopes external agents)
        #[arg(short, long)]
        identity: Option<String>,

        /// Preferred agents, tried in order before classification
        #[arg(short, long = "agent", value_name = "NAME")]
        agents: Vec<String>,

        /// Print content deltas as they arrive
        #[arg(short, long)]
        stream: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,
    },

    /// List the agents available to an identity
    Agents {
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Fire due recurring jobs on an interval
    Poll {
        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Fire one recurring job now, regardless of its schedule
    Fire {
        /// Job id from [[jobs]]
        job_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_preferences() {
        let cli = Cli::try_parse_from([
            "agent-relay",
            "-vv",
            "ask",
            "--identity",
            "alice",
            "-a",
            "research",
            "-a",
            "general",
            "find papers",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                task: "find papers".to_string(),
                identity: Some("alice".to_string()),
                agents: vec!["research".to_string(), "general".to_string()],
                stream: false,
                output: OutputFormat::Full,
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["agent-relay", "poll", "--once", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(cli.command, Some(Command::Poll { once: true }));
    }

    #[test]
    fn show_config_needs_no_subcommand() {
        let cli = Cli::try_parse_from(["agent-relay", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
