pub use anyhow::{Context, Result as R, anyhow};
use chunkwav_lib::chunks::DecodedChunk;
use chunkwav_lib::file::{open_container_as, open_for_update_as, truncate_to};
use chunkwav_lib::*;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Inspect and edit chunks of WAV, BWF and AIFF files", long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, overrides RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    /// Container family, detected from the file when omitted
    #[arg(long, global = true, value_enum)]
    family: Option<Family>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the container header and every chunk header
    List { path: PathBuf },
    /// Decode the chunks, or only those with the given id
    Show {
        path: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a chunk by id, or by start position when ids repeat
    Delete {
        path: PathBuf,
        #[arg(long, required_unless_present = "at", conflicts_with = "at")]
        id: Option<String>,
        #[arg(long)]
        at: Option<u64>,
    },
    /// Append a chunk to the end of the container
    Append {
        path: PathBuf,
        /// A complete chunk, or a bare payload when --id is given
        input: PathBuf,
        /// Wrap the input in a chunk header with this id
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value_t = 8192)]
        buffer_size: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Family {
    Riff,
    Aiff,
}

impl From<Family> for ContainerFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Riff => ContainerFamily::Riff,
            Family::Aiff => ContainerFamily::Aiff,
        }
    }
}

fn main() -> R<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chunkwav_lib=warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let family = args.family.map(ContainerFamily::from);
    match args.command {
        Commands::List { path } => list(&path, family, args.json),
        Commands::Show { path, id } => show(&path, family, id.as_deref(), args.json),
        Commands::Delete { path, id, at } => delete(&path, family, id.as_deref(), at),
        Commands::Append {
            path,
            input,
            id,
            buffer_size,
        } => append(&path, &input, family, id.as_deref(), buffer_size),
    }
}

fn list(path: &Path, family: Option<ContainerFamily>, as_json: bool) -> R<()> {
    let file = open_container_as(path, family).with_context(|| format!("reading {}", path.display()))?;
    let container = &file.container;
    let check = container.validate_size();

    if as_json {
        let chunks: Vec<_> = container
            .headers
            .iter()
            .map(|h| {
                json!({
                    "id": h.id().to_string(),
                    "size": h.size(),
                    "full_size": h.full_size(),
                    "start_pos": h.start_pos(),
                    "has_padding": h.has_padding(),
                })
            })
            .collect();
        let out = json!({
            "name": container.name,
            "id": container.header.id().to_string(),
            "format": container.header.format().to_string(),
            "size": container.header.size(),
            "discovered_size": check.discovered,
            "chunks": chunks,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", container.header);
    for header in &container.headers {
        println!("  {}", header);
    }
    if !check.is_consistent() {
        println!(
            "declared size {} does not match the {} bytes found",
            check.declared, check.discovered
        );
    }
    Ok(())
}

fn show(path: &Path, family: Option<ContainerFamily>, id: Option<&str>, as_json: bool) -> R<()> {
    let file = open_container_as(path, family).with_context(|| format!("reading {}", path.display()))?;
    let wanted = id.map(FourCC::from_text);

    let mut shown = Vec::new();
    for (header, decoded) in file.container.headers.iter().zip(file.decode_chunks()) {
        if wanted.is_some_and(|id| id != header.id()) {
            continue;
        }
        let text = match decoded {
            Ok(chunk) => describe(&chunk)?,
            Err(e) => format!("undecodable: {}", e),
        };
        shown.push((*header, text));
    }

    if as_json {
        let out: Vec<_> = shown
            .iter()
            .map(|(h, text)| json!({ "id": h.id().to_string(), "start_pos": h.start_pos(), "content": text }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (header, text) in shown {
            println!("{}", header);
            for line in text.lines() {
                println!("  {}", line);
            }
        }
    }
    Ok(())
}

fn describe(chunk: &DecodedChunk) -> R<String> {
    Ok(match chunk {
        DecodedChunk::Format(c) => c.to_string(),
        DecodedChunk::PcmFormat(c) => c.to_string(),
        DecodedChunk::Common(c) => c.to_string(),
        DecodedChunk::BroadcastExtension(c) => c.to_string(),
        DecodedChunk::MetadataXml(c) => c.document()?.to_string(),
        DecodedChunk::Unknown { data, .. } => format!("{} bytes", data.len()),
    })
}

fn delete(path: &Path, family: Option<ContainerFamily>, id: Option<&str>, at: Option<u64>) -> R<()> {
    let (mut container, mut file) =
        open_for_update_as(path, family).with_context(|| format!("opening {}", path.display()))?;

    let mut mutator = ContainerMutator::new(&mut container, &mut file);
    let len = match (id, at) {
        (_, Some(start_pos)) => mutator.delete_chunk_at(start_pos)?,
        (Some(id), None) => mutator.delete_chunk(FourCC::from_text(id))?,
        (None, None) => return Err(anyhow!("give --id or --at")),
    };
    truncate_to(&file, len)?;

    println!("{} is now {} bytes", path.display(), len);
    Ok(())
}

fn append(
    path: &Path,
    input: &Path,
    family: Option<ContainerFamily>,
    id: Option<&str>,
    buffer_size: usize,
) -> R<()> {
    let (mut container, mut file) =
        open_for_update_as(path, family).with_context(|| format!("opening {}", path.display()))?;
    let endian = container.endian;
    let mut mutator = ContainerMutator::new(&mut container, &mut file);

    let appended = match id {
        Some(id) => {
            let payload = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let header = ChunkHeader::encode(FourCC::from_text(id), payload.len().try_into()?, endian);
            let mut chunk = header.to_bytes().to_vec();
            chunk.extend(payload);
            chunkwav_lib::header::pad(&mut chunk);
            mutator.append_chunk(&mut Cursor::new(chunk), buffer_size)?
        }
        None => {
            let mut reader = BufReader::new(File::open(input)?);
            mutator.append_chunk(&mut reader, buffer_size)?
        }
    };

    println!("appended {} bytes to {}", appended, path.display());
    Ok(())
}
