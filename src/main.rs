mod cli;

use soundpost::{
    config,
    workflow::{Mode, Orchestrator, Outcome, ProgressSender, WorkflowOptions},
};
use soundpost_av::{FfprobeProber, Prober, Tools};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, OutputArgs, TagCommand};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "soundpost=trace,soundpost_av=trace,soundpost_tag=debug".to_string()
        } else {
            "soundpost=info,soundpost_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract {
            input,
            max_size_mb,
            output,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let mut options = workflow_options(&config, &output);
            if let Some(max) = max_size_mb {
                options.max_size_mb = max;
            }
            run_workflow(&config, Mode::Extract, &input, options)
        }
        Commands::Inject { input, output } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let options = workflow_options(&config, &output);
            run_workflow(&config, Mode::Inject, &input, options)
        }
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Tag { action } => tag_command(action),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("soundpost {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn workflow_options(config: &config::Config, args: &OutputArgs) -> WorkflowOptions {
    let mut options = WorkflowOptions::from(&config.defaults);
    if let Some(container) = args.container {
        options.target_container = container;
    }
    if args.discard_original {
        options.preserve_original = false;
    }
    if args.overwrite {
        options.overwrite = true;
    }
    options.output_dir = args.output_dir.clone();
    options
}

fn run_workflow(
    config: &config::Config,
    mode: Mode,
    input: &Path,
    options: WorkflowOptions,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let orchestrator = Orchestrator::from_config(config);
    let progress = ProgressSender::new(|event| println!("{}", event));
    let cancel = CancellationToken::new();

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, cancelling...");
                on_interrupt.cancel();
            }
        });
        orchestrator
            .run(mode, input, &options, &progress, &cancel)
            .await
    });

    match result.outcome {
        Outcome::Done { output } => {
            println!("\nOutput: {}", output.display());
            Ok(())
        }
        Outcome::Failed { kind, message } => {
            anyhow::bail!("{} failed ({}): {}", mode, kind, message)
        }
    }
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = Tools::new(
        config.tools.ffmpeg_path.clone(),
        config.tools.ffprobe_path.clone(),
    )
    .with_timeouts(
        config.tools.probe_timeout(),
        config.tools.transcode_timeout(),
    );
    let prober = FfprobeProber::new(tools);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let media_info = rt
        .block_on(prober.probe(file))
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", media_info.file_path.display());
    println!("Container: {}", media_info.container);
    println!("Size: {} bytes", media_info.file_size);
    if let Some(ref duration) = media_info.duration {
        let secs = duration.as_secs();
        let mins = secs / 60;
        let hours = mins / 60;
        println!(
            "Duration: {:02}:{:02}:{:02}.{:03}",
            hours,
            mins % 60,
            secs % 60,
            duration.subsec_millis()
        );
    }

    println!("\nVideo Streams: {}", media_info.video_streams.len());
    for (i, stream) in media_info.video_streams.iter().enumerate() {
        print!("  [{}] {} {}x{}", i, stream.codec, stream.width, stream.height);
        if let Some(fps) = stream.frame_rate {
            print!(", {:.3} fps", fps);
        }
        println!();
    }

    println!("\nAudio Streams: {}", media_info.audio_streams.len());
    for (i, stream) in media_info.audio_streams.iter().enumerate() {
        print!("  [{}] {} {}ch", i, stream.codec, stream.channels);
        if let Some(rate) = stream.sample_rate {
            print!(" {} Hz", rate);
        }
        println!();
    }

    Ok(())
}

fn tag_command(action: TagCommand) -> Result<()> {
    match action {
        TagCommand::Decode { filename } => {
            let tag = soundpost_tag::decode_path(Path::new(&filename))
                .with_context(|| format!("No [sound=URL] tag found in {:?}", filename))?;
            println!("{}", tag.url);
            if !tag.validated {
                eprintln!("warning: {} is not a valid http(s) URL", tag.url);
            }
        }
        TagCommand::Encode { filename, url, ext } => {
            let name = Path::new(&filename)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&filename);
            let tagged = match ext {
                Some(ext) => soundpost_tag::encode_with_extension(name, &url, &ext)?,
                None => soundpost_tag::encode(name, &url)?,
            };
            println!("{}", tagged);
        }
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = Tools::new(
        config.tools.ffmpeg_path.clone(),
        config.tools.ffprobe_path.clone(),
    );
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg (which ships ffprobe) to run workflows.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Upload endpoint: {}", config.upload.endpoint);
    println!("  Upload limit: {} MB", config.upload.max_upload_mb);
    println!("  Container: {}", config.defaults.container);
    println!("  Max size: {} MB", config.defaults.max_size_mb);
    println!("  Preserve original: {}", config.defaults.preserve_original);
    println!(
        "  Encoding: crf {}, preset {}, floor {} kbps",
        config.encoding.crf, config.encoding.preset, config.encoding.min_video_kbps
    );

    Ok(())
}
