use anyhow::{Context, Result};
use std::{env, fs, io::Read, path::PathBuf, process};
use textanchor_config::Config;
use textanchor_engine::{DocumentOptions, io};

mod script;
mod session;

use script::parse_script;
use session::Session;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <file> [script | -]");
    eprintln!();
    eprintln!("Loads <file>, replays the edit script against it and prints the result.");
    eprintln!("With no script the document is printed as loaded; '-' reads the script");
    eprintln!("from stdin.");
    process::exit(1);
}

fn init_logging(config: &Config) {
    // RUST_LOG wins over the config file
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone());
    env_logger::Builder::new().parse_filters(&filter).init();
}

fn read_script(source: Option<&str>) -> Result<String> {
    match source {
        None => Ok("print".to_string()),
        Some("-") => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("reading script from stdin")?;
            Ok(script)
        }
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading script {path}"))
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("textanchor-cli", String::as_str);
    if args.len() < 2 || args.len() > 3 {
        usage(program);
    }

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };
    init_logging(&config);
    log::debug!("config path: {}", Config::config_path().display());

    let file = PathBuf::from(&args[1]);
    let options = DocumentOptions {
        anchor_sweep_threshold: config.engine.anchor_sweep_threshold,
    };
    let document = io::read_document_with(&file, options)
        .with_context(|| format!("loading {}", file.display()))?;
    log::info!(
        "loaded {}: {} bytes, {} lines",
        file.display(),
        document.len(),
        document.line_count()
    );

    let commands = parse_script(&read_script(args.get(2).map(String::as_str))?)?;
    let mut session = Session::new(document);
    session.run(&commands)?;
    log::debug!(
        "replayed {} commands, document at version {}",
        commands.len(),
        session.document().version()
    );
    print!("{}", session.output());
    Ok(())
}
