use clap::{Parser, Subcommand};
use nbcdb::{CdbBuilder, CdbHeader, RandomSeeds, StableSeeds};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Error, ErrorKind, Read, Result};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Info(args) => run_info(args),
        Command::Convert(args) => run_convert(args),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "cdb utility for inspecting and creating constant database files",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect a constant database file and print its header
    Info(InfoArgs),
    /// Convert a JSON key-value file into a constant database file
    Convert(ConvertArgs),
}

#[derive(clap::Args)]
struct InfoArgs {
    /// Path to the constant database file
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Path to the source JSON file containing key-value pairs
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Path to the constant database file to produce
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Description stored in the header, at most 16 bytes are kept
    #[arg(short, long, default_value = "")]
    description: String,

    /// Use deterministic seeds so identical input yields identical files
    #[arg(long)]
    stable: bool,

    /// Optional override for writer buffer size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = 64 << 10)]
    buffer_size: usize,
}

fn run_info(args: InfoArgs) -> Result<()> {
    let mut file = File::open(&args.input)?;
    let mut buf = [0u8; CdbHeader::SIZE];
    file.read_exact(&mut buf)?;
    let header = CdbHeader::parse(&buf)?;

    let json = serde_json::json!({
        "description": String::from_utf8_lossy(&header.description).trim_end_matches('\0'),
        "data_size": header.data_size,
        "data_count": header.data_count,
        "entries": header.entries,
        "seed": header.seed,
        "index_width": header.index_width(),
        "offset_width": header.offset_width(),
        "expected_length": header.file_length(),
        "actual_length": file.metadata()?.len(),
    });
    let json = serde_json::to_string_pretty(&json)
        .map_err(|e| Error::other(format!("Failed to format JSON: {e}")))?;
    println!("{}", json);
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let entries = load_entries_from_json(&args.input)?;

    let mut builder = CdbBuilder::new().with_writer_buffer_size(args.buffer_size);
    for (index, (key, value)) in entries.iter().enumerate() {
        builder.put(key.as_bytes(), &value_bytes(value)?).map_err(|e| {
            Error::new(ErrorKind::InvalidData, format!("entry {index} ({key}): {e}"))
        })?;
    }

    let writer = File::create(&args.output)?;
    let info = if args.stable {
        builder.serialize(&writer, &args.description, StableSeeds::default())?
    } else {
        builder.serialize(&writer, &args.description, RandomSeeds::default())?
    };

    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| Error::other(format!("Failed to format JSON: {e}")))?;
    println!("{}", json);

    Ok(())
}

/// Strings are stored verbatim, anything else as compact JSON text.
fn value_bytes(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.clone().into_bytes()),
        other => serde_json::to_vec(other)
            .map_err(|e| Error::other(format!("Failed to encode value: {e}"))),
    }
}

/// Accepted input layouts: a JSON object, or a list of `[key, value]` pairs
/// and `{"key": ..., "value": ...}` records, which may be mixed.
#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Object(serde_json::Map<String, Value>),
    List(Vec<Pair>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Pair {
    Tuple(String, Value),
    Record { key: String, value: Value },
}

fn load_entries_from_json(path: &Path) -> Result<Vec<(String, Value)>> {
    let reader = BufReader::new(File::open(path)?);
    let input: Input = serde_json::from_reader(reader).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("{}: expected an object or a list of key/value pairs: {e}", path.display()),
        )
    })?;
    Ok(match input {
        Input::Object(map) => map.into_iter().collect(),
        Input::List(pairs) => pairs
            .into_iter()
            .map(|pair| match pair {
                Pair::Tuple(key, value) | Pair::Record { key, value } => (key, value),
            })
            .collect(),
    })
}
