use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ironshard::{Backend, DEFAULT_DESCRIPTOR_NAME, DEFAULT_SHARD_SIZE, FileBackend, IngestOptions, ShardIndex};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// IronShard - sharded storage for very large texts
#[derive(Parser, Debug)]
#[command(name = "ironshard")]
#[command(about = "Ingest, slice and inspect sharded texts", long_about = None)]
#[command(version)]
struct Cli {
  /// Log level filter (trace, debug, info, warn, error). Overrides RUST_LOG.
  #[arg(short, long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Ingest a file into shards
  Ingest {
    /// Path to input file
    file: PathBuf,

    /// Output directory for shards
    #[arg(short, long)]
    output: PathBuf,

    /// Shard size in characters
    #[arg(short, long, default_value_t = DEFAULT_SHARD_SIZE)]
    shard_size: u64,
  },

  /// Read a character range from a shard directory
  Slice {
    /// Path to shards directory
    shards_dir: PathBuf,

    /// Start character offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// End character offset (exclusive)
    #[arg(long, allow_negative_numbers = true)]
    end: i64,
  },

  /// Show info about a shard directory
  Info {
    /// Path to shards directory
    shards_dir: PathBuf,
  },

  /// Upload a shard directory to an S3-compatible bucket
  #[cfg(feature = "object-store")]
  Upload {
    /// Path to shards directory
    shards_dir: PathBuf,

    /// Destination bucket
    #[arg(short, long)]
    bucket: String,

    /// Key prefix inside the bucket
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Custom endpoint (e.g. MinIO)
    #[arg(long)]
    endpoint: Option<String>,
  },
}

fn main() -> ironshard::Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.log_level.as_deref());

  match cli.command {
    Commands::Ingest {
      file,
      output,
      shard_size,
    } => {
      println!("Ingesting {} -> {} (shard_size={})", file.display(), output.display(), shard_size);
      let index = ironshard::ingest_file(&file, &output, &IngestOptions::new(shard_size))?;
      println!(
        "Done: {} shards, {} characters",
        index.num_shards(),
        index.total_length()
      );
    }

    Commands::Slice { shards_dir, start, end } => {
      let backend = FileBackend::open(shards_dir)?;
      let text = backend.fetch_range(start, end)?;
      let mut stdout = std::io::stdout().lock();
      stdout.write_all(text.as_bytes())?;
      stdout.flush()?;
    }

    Commands::Info { shards_dir } => {
      let index = ShardIndex::load(&shards_dir.join(DEFAULT_DESCRIPTOR_NAME))?;
      println!("Source:      {}", index.source_identifier());
      println!("Total chars: {}", index.total_length());
      println!("Shard size:  {}", index.shard_size());
      println!("Num shards:  {}", index.num_shards());
      if let Some(last) = index.shards().last() {
        println!("Last shard:  {} chars (id={})", last.length, last.shard_id);
      }
    }

    #[cfg(feature = "object-store")]
    Commands::Upload {
      shards_dir,
      bucket,
      prefix,
      endpoint,
    } => {
      let mut builder = object_store::aws::AmazonS3Builder::from_env().with_bucket_name(&bucket);
      if let Some(endpoint) = endpoint {
        builder = builder.with_endpoint(endpoint).with_allow_http(true);
      }
      let store = builder.build()?;
      let count = ironshard::upload_dir(&store, &shards_dir, &prefix)?;
      println!("Uploaded {} objects to s3://{}/{}", count, bucket, prefix.trim_matches('/'));
    }
  }

  Ok(())
}

fn setup_logging(log_level_override: Option<&str>) {
  let env_filter = match log_level_override {
    Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
  };

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}
