use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use devwire_frame::{DEFAULT_VERSION, MAX_PAYLOAD};
use devwire_struct::CommandRegistry;

use crate::exit::{struct_error, CliResult};
use crate::output::OutputFormat;

pub mod commands;
pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode framed packets from a byte stream.
    Decode(DecodeArgs),
    /// Frame a payload into a packet.
    Encode(EncodeArgs),
    /// List message types loaded from a metadata directory.
    Commands(CommandsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Directory of `*.command.json` metadata used to decode payload fields.
    #[arg(long, value_name = "DIR")]
    pub commands: Option<PathBuf>,
    /// Largest payload accepted; frames declaring more are skipped.
    #[arg(long, value_name = "BYTES", default_value_t = MAX_PAYLOAD as u16)]
    pub max_payload: u16,
    /// Exit after decoding N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Intent of the packet.
    #[arg(long)]
    pub intent: u16,
    /// Protocol version byte.
    #[arg(long = "packet-version", default_value_t = DEFAULT_VERSION)]
    pub packet_version: u8,
    /// Flags byte.
    #[arg(long, default_value_t = 0)]
    pub flags: u8,
    /// Payload as hex.
    #[arg(long, conflicts_with = "json")]
    pub hex: Option<String>,
    /// Payload fields as a JSON object, encoded with the intent's message type.
    #[arg(long, conflicts_with = "hex", requires = "commands")]
    pub json: Option<String>,
    /// Directory of `*.command.json` metadata.
    #[arg(long, value_name = "DIR")]
    pub commands: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CommandsArgs {
    /// Directory of `*.command.json` metadata.
    pub dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Registry from a metadata directory, or an empty one.
pub fn load_registry(dir: Option<&Path>) -> CliResult<CommandRegistry> {
    match dir {
        Some(dir) => CommandRegistry::from_directory(dir)
            .map_err(|err| struct_error("failed loading command metadata", err)),
        None => Ok(CommandRegistry::new()),
    }
}
