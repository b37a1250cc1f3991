//! `vidsim` command line: fingerprint, compare, index and search videos
//! stored as directories of decoded frames.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser as _;
use serde_json::json;
use vidsim::{build_matcher, Matcher, VidsimConfig};

#[derive(clap::Parser)]
#[command(name = "vidsim")]
#[command(about = "Find and score similar videos from per-second frame embeddings")]
struct Args {
    /// Pipeline configuration (YAML). Defaults run offline with the stub embedder.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override `video.root` from the configuration
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Override `video.fps` from the configuration
    #[arg(long, global = true)]
    fps: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the fingerprint of one video
    Fingerprint {
        video: String,
    },

    /// Score how well video A is explained by video B
    Compare {
        a: String,
        b: String,
    },

    /// Fingerprint and index videos, then report what was stored
    Index {
        #[arg(required = true)]
        videos: Vec<String>,
    },

    /// Index a corpus and rank it against a query video
    Search {
        /// The query video
        query: String,

        /// Videos to index before searching
        #[arg(short = 'i', long = "index", num_args = 1..)]
        corpus: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => VidsimConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => VidsimConfig::default(),
    };
    if let Some(root) = args.root {
        config.video.root = root;
    }
    if let Some(fps) = args.fps {
        config.video.fps = fps;
    }

    let matcher = build_matcher(&config)?;
    let outcome = run(&matcher, args.command).await;
    matcher.shutdown().await?;
    let output = outcome?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(matcher: &Matcher, command: Command) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Command::Fingerprint { video } => {
            let fingerprint = matcher.compute_fingerprint(&video).await?;
            json!({
                "video": video,
                "dimension": fingerprint.dimension(),
                "frames": fingerprint.frames(),
            })
        }
        Command::Compare { a, b } => {
            let score = matcher.compare_videos(&a, &b).await?;
            json!({ "a": a, "b": b, "metric": matcher.config().metric, "score": score })
        }
        Command::Index { videos } => {
            matcher.create_index().await?;
            let mut reports = Vec::with_capacity(videos.len());
            for video in &videos {
                reports.push(matcher.index_fingerprint(video).await?);
            }
            json!({ "indexed": reports })
        }
        Command::Search {
            query,
            corpus,
            top_k,
        } => {
            matcher.create_index().await?;
            for video in &corpus {
                matcher
                    .index_fingerprint(video)
                    .await
                    .with_context(|| format!("indexing {video}"))?;
            }
            let ranked = matcher.find_similar(&query, top_k).await?;
            json!({ "query": query, "results": ranked })
        }
    };
    Ok(output)
}
