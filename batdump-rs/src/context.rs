use std::path::PathBuf;

use clap::Parser;
use clap_num::maybe_hex;

use batdump::Overrides;

#[derive(Debug, Parser)]
#[clap(name = "batdump")]
#[clap(about = "batdump extracts Freesat bouquet names, regions and channel numbers from a DVB transport stream. ", long_about = None)]
#[clap(version)]
pub(crate) struct Cli {
    /// PID carrying the bouquet association table.{n}
    /// Accepts decimal or hexadecimal with a 0x prefix.{n}
    /// Defaults to 3002 (0x0BBA).
    #[clap(long, value_parser = maybe_hex::<u16>)]
    pub pid: Option<u16>,

    /// Path to a TOML config file.{n}
    /// If omitted, batdump.toml in the working directory is used when present.
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read the transport stream from a file instead of stdin.{n}
    /// `-` means stdin.
    #[clap(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write the JSON document to a file instead of stdout.{n}
    /// `-` means stdout.
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Indent the JSON output.
    #[clap(long)]
    pub pretty: bool,

    /// Require the next packet's sync byte before accepting a new alignment.
    #[clap(long)]
    pub strict_sync: bool,

    /// Accept sections whose CRC does not match.
    #[clap(long)]
    pub no_crc: bool,

    /// Enable debug logging.
    #[clap(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub(crate) fn overrides(&self) -> Overrides {
        Overrides {
            pid: self.pid,
            pretty: self.pretty,
            strict_sync: self.strict_sync,
            no_crc: self.no_crc,
        }
    }
}
