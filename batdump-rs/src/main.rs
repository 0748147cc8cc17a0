use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info};

use batdump::config::{find_config, load_config};
use batdump::{BatExtractor, BatdumpError, ConfigFile, Settings};

mod context;
mod logging;

use context::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<(), BatdumpError> {
    let config = match find_config(cli.config.clone()) {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_config(&path)?
        }
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(&config, &cli.overrides())?;

    let input = open_input(cli.input.as_deref())?;
    let output = open_output(cli.output.as_deref())?;

    let mut extractor = BatExtractor::new(settings.extractor);
    extractor.run_reader(input);
    extractor.document().write_json(output, settings.pretty)?;
    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, BatdumpError> {
    match path {
        Some(path) if !is_stdio(path) => {
            let file = File::open(path).map_err(|source| BatdumpError::OpenInput {
                path: PathBuf::from(path),
                source,
            })?;
            info!("Reading {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, BatdumpError> {
    match path {
        Some(path) if !is_stdio(path) => {
            let file = File::create(path).map_err(|source| BatdumpError::CreateOutput {
                path: PathBuf::from(path),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
