mod cli;

use trackscan::{config, scanner};
use trackscan_probe::{check_tool, MkvmergeProber, ProbeResult};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ScanArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trackscan=trace,trackscan_probe=debug,trackscan_core=debug".to_string()
        } else {
            "trackscan=info,trackscan_probe=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan(args) => run_scan(args, cli.config.as_deref()),
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("trackscan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_scan(args: ScanArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    let timestamp = args.timestamp.clone();
    args.into_overrides().apply(&mut config);
    config::validate_config(&config)?;

    let prober = MkvmergeProber::from_config(&config.probe)?;
    tracing::info!("Using {}", prober.tool_path().display());

    let dry_run = config.dry_run;
    let mut scanner = scanner::Scanner::new(config, Box::new(prober));
    if let Some(timestamp) = timestamp {
        scanner = scanner.with_timestamp(timestamp);
    }
    let outcome = scanner.run()?;

    if dry_run {
        print!("{}", outcome.summary_text);
    } else if let Some(path) = &outcome.text_summary_path {
        println!("Summary: {}", path.display());
        if let Some(html) = &outcome.html_summary_path {
            println!("HTML:    {}", html.display());
        }
    }

    for warning in &outcome.warnings {
        tracing::warn!("⚠️ {}", warning);
    }
    println!(
        "{} OK files, {} warnings",
        outcome.ok_rows.len(),
        outcome.warnings.len()
    );

    Ok(())
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = MkvmergeProber::from_config(&config.probe)?;
    let result = scanner::probe_one(&prober, file);

    if json {
        let json_str = serde_json::to_string_pretty(&result)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", result.record().path.display());
    println!("Size: {} bytes", result.record().size);

    match &result {
        ProbeResult::Failed { reason, .. } => {
            println!("Probe failed: {}", reason);
        }
        ProbeResult::Probed { tracks, .. } => {
            println!("\nTracks: {}", tracks.len());
            for (i, track) in tracks.iter().enumerate() {
                print!(
                    "  [{}] {:<8} {} ({})",
                    track.id.unwrap_or(i as u32),
                    track.track_type.as_str(),
                    track.codec,
                    track.language_or_und()
                );
                if let Some(ref name) = track.name {
                    print!(" \"{}\"", name);
                }
                if track.default {
                    print!(" [default]");
                }
                if track.forced {
                    print!(" [forced]");
                }
                println!();
            }
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tool = check_tool(&config.probe.tool, config.probe.tool_path.as_deref());

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("{} is missing. Install MKVToolNix to enable scanning.", tool.name);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => match config::find_default_config() {
            Some(p) => {
                println!("Validating config: {:?}", p);
                config::load_config(&p)?
            }
            None => {
                println!("No config file specified, using defaults");
                config::ScanConfig::default()
            }
        },
    };
    config::validate_config(&config)?;

    println!("✓ Configuration is valid");
    println!("  Roots: {}", config.roots.len());
    println!("  Output dir: {}", config.resolve_output_dir().display());
    println!("  Dry run: {}", config.dry_run);
    println!("  Batch size: {}", config.batch_size);
    println!("  Write CSV: {}", config.write_csv_file);
    println!(
        "  Languages: video {:?}, audio {:?}, subtitle {:?}",
        config.policy.lang_vid, config.policy.lang_aud, config.policy.lang_sub
    );
    println!("  Target codec: {}", config.policy.target_codec);
    println!("  Policy sections: {}", config.policy_sections.len());
    println!(
        "  Probe: {} (timeout {}s)",
        config.probe.tool, config.probe.timeout_secs
    );
    println!("  Matching scope: {:?}", config.matching.scope);

    Ok(())
}
