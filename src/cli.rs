use clap::{Args, Parser, Subcommand};
use soundpost_av::Container;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "soundpost")]
#[command(author, version, about = "Create and play back soundposts")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output options shared by extract and inject.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output container (mp4 or webm)
    #[arg(long)]
    pub container: Option<Container>,

    /// Delete the input once the output is written
    #[arg(long)]
    pub discard_original: bool,

    /// Directory to write the output to (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the audio, upload it and tag the silent video with its URL
    Extract {
        /// Video to process
        #[arg(required = true)]
        input: PathBuf,

        /// Size cap for the silent video, in MB
        #[arg(long)]
        max_size_mb: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download the audio a file name tags and mux it back in
    Inject {
        /// Tagged video or image
        #[arg(required = true)]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read or write a [sound=URL] file name tag
    Tag {
        #[command(subcommand)]
        action: TagCommand,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Print the URL tagged in a file name
    Decode {
        /// File name or path
        filename: String,
    },

    /// Print a file name with the tag inserted or replaced
    Encode {
        /// File name to tag
        filename: String,

        /// Audio URL
        url: String,

        /// Replace the extension as well
        #[arg(long)]
        ext: Option<String>,
    },
}
