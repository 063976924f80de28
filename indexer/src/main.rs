use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use govnav_core::persist::{load, save, IndexPaths};
use govnav_core::{BuildOptions, IdfScheme, IndexBuilder, OrdinanceService, RawDocument};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the ordinance TF-IDF index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from scraped ordinance JSON/JSONL files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use IDF = ln(N/df) instead of the smoothed ln(1 + N/df)
        #[arg(long, default_value_t = false)]
        plain_idf: bool,
        /// How many times title terms are counted relative to body terms
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        title_weight: u32,
    },
    /// Run one query against a built index and print ranked citations
    Search {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 5)]
        k: i64,
    },
    /// Print the full text of one ordinance section
    Show {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, plain_idf, title_weight } => {
            let idf = if plain_idf { IdfScheme::Plain } else { IdfScheme::Smoothed };
            build_index(&input, &output, BuildOptions { idf, title_weight })
        }
        Commands::Search { index, query, k } => search(&index, &query, k),
        Commands::Show { index, id } => show(&index, &id),
    }
}

fn build_index(input: &str, output: &str, options: BuildOptions) -> Result<()> {
    let docs = read_corpus(Path::new(input))?;
    tracing::info!(num_docs = docs.len(), input, "ingested documents");

    let index = IndexBuilder::new(options).build(docs);
    let meta = save(&index, &IndexPaths::new(output)).with_context(|| format!("writing index to {output}"))?;

    tracing::info!(output, num_terms = meta.num_terms, num_postings = meta.num_postings, "index build complete");
    Ok(())
}

/// Collect documents from a file, or from every .json/.jsonl file under a directory
/// in path order so that document ids are reproducible.
fn read_corpus(input_path: &Path) -> Result<Vec<RawDocument>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let before = docs.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
        tracing::debug!(file = %file.display(), count = docs.len() - before, "read corpus file");
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: RawDocument = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).with_context(|| format!("document in {}", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            docs.push(serde_json::from_value(json).with_context(|| format!("document in {}", file.display()))?);
        }
        _ => tracing::warn!(file = %file.display(), "skipping file that is neither a document nor a list"),
    }
    Ok(())
}

fn open_service(index_dir: &str) -> Result<OrdinanceService> {
    let index = load(&IndexPaths::new(index_dir)).with_context(|| format!("loading index from {index_dir}"))?;
    Ok(OrdinanceService::new(index))
}

fn search(index_dir: &str, query: &str, k: i64) -> Result<()> {
    let service = open_service(index_dir)?;
    let response = service.search_ordinance(query, k)?;
    if response.results.is_empty() {
        println!("No ordinances found matching '{query}'. Try different keywords.");
        return Ok(());
    }
    println!("Found {} relevant ordinance sections for '{query}':\n", response.total_hits);
    for (i, r) in response.results.iter().enumerate() {
        println!("--- Result {} (id {}) ---", i + 1, r.summary.id);
        println!("Title: {}", r.summary.title);
        if !r.summary.section.is_empty() { println!("Section: {}", r.summary.section); }
        if !r.summary.chapter.is_empty() { println!("Chapter: {}", r.summary.chapter); }
        println!("Relevance Score: {:.4}", r.score);
        println!("Matched: {}", r.matched_terms.join(", "));
        println!("Excerpt: {}", r.snippet);
        println!("URL: {}\n", if r.summary.url.is_empty() { "N/A" } else { r.summary.url.as_str() });
    }
    Ok(())
}

fn show(index_dir: &str, id: &str) -> Result<()> {
    let doc = open_service(index_dir)?.get_ordinance_details(id)?;
    println!("=== {} ===\n", doc.title);
    println!("Section: {}", doc.section);
    println!("Chapter: {}", doc.chapter);
    println!("URL: {}\n", doc.url);
    println!("{}", doc.text);
    Ok(())
}
