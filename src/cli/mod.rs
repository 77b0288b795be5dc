//! CLI module for Glean.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// Glean - YouTube transcripts and AI summaries
///
/// Fetches caption transcripts from YouTube, summarizes them with an
/// OpenAI-compatible model, and serves a small API for saving analyses.
#[derive(Parser, Debug)]
#[command(name = "glean")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch and print a video's transcript
    Transcript {
        /// YouTube URL or video id
        url: String,

        /// Preferred language codes, in order (repeatable)
        #[arg(short, long = "lang")]
        lang: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
        format: TranscriptFormat,
    },

    /// Fetch a transcript and summarize it
    Analyze {
        /// YouTube URL or video id
        url: String,

        /// Preferred language codes, in order (repeatable)
        #[arg(short, long = "lang")]
        lang: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranscriptFormat {
    /// Timestamped lines
    Text,
    /// `{videoId, transcript}` as JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_command() {
        let cli = Cli::parse_from([
            "glean",
            "-vv",
            "transcript",
            "https://youtu.be/dQw4w9WgXcQ",
            "--lang",
            "de",
            "--lang",
            "en",
            "--format",
            "json",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Transcript { url, lang, format } => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert_eq!(lang, vec!["de", "en"]);
                assert_eq!(format, TranscriptFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["glean", "serve", "--port", "8080", "-c", "/tmp/glean.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/glean.toml"));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
