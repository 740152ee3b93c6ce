use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use finbuddy_classify::{
    ModelPair, PatternSet, Prediction, ReviewDecision, TrainOptions, append_to_corpus,
    filter_for_review, load_corpus, resolve, review, sort_for_report, train_to_dir,
};
use finbuddy_core::{Category, CategorizedTransaction, CategorySpend, spending_by_category};
use finbuddy_ingest::parsers::{capital_one, capital_one_csv};

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "finbuddy", version, about = "Statement categorization pipeline")]
struct Cli {
    /// Verbose diagnostic logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the classifier from the corpus and persist the model pair
    Train {
        /// Corpus file (default: ~/.finbuddy/training-categories.json)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output directory for the model pair (default: ~/.finbuddy/model)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Categorize a statement export and write a report plus review queue
    Classify {
        /// Statement file: .csv parses as a Capital One export, anything
        /// else as extracted statement text
        input: PathBuf,

        /// Statement year for text rows without one (default: current year)
        #[arg(long)]
        year: Option<i32>,

        /// Review threshold override (default from config: 0.3)
        #[arg(long)]
        threshold: Option<f64>,

        /// Where to write the JSON report (default: finbuddy-report.json)
        #[arg(long)]
        report: Option<PathBuf>,

        #[arg(long)]
        model_dir: Option<PathBuf>,

        #[arg(long)]
        corpus: Option<PathBuf>,

        #[arg(long)]
        queue: Option<PathBuf>,
    },

    /// List pending review entries, least confident first
    Review {
        #[arg(long)]
        queue: Option<PathBuf>,
    },

    /// Resolve one review entry and append the correction to the corpus
    Resolve {
        /// Exact description of the queued entry
        description: String,

        /// Keep the predicted category
        #[arg(long)]
        accept: bool,

        /// Reassign to this category label
        #[arg(long)]
        category: Option<String>,

        /// Discard the entry without training on it
        #[arg(long)]
        unknown: bool,

        #[arg(long)]
        queue: Option<PathBuf>,

        #[arg(long)]
        corpus: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ClassifyReport {
    transactions: Vec<CategorizedTransaction>,
    spending: Vec<CategorySpend>,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let cfg = config::load_config()?;

    match cli.command {
        Command::Train { corpus, model_dir } => cmd_train(&cfg, corpus, model_dir),
        Command::Classify {
            input,
            year,
            threshold,
            report,
            model_dir,
            corpus,
            queue,
        } => cmd_classify(&cfg, input, year, threshold, report, model_dir, corpus, queue),
        Command::Review { queue } => cmd_review(&cfg, queue),
        Command::Resolve {
            description,
            accept,
            category,
            unknown,
            queue,
            corpus,
        } => cmd_resolve(&cfg, description, accept, category, unknown, queue, corpus),
    }
}

fn cmd_train(cfg: &Config, corpus: Option<PathBuf>, model_dir: Option<PathBuf>) -> Result<()> {
    let corpus_path = match corpus {
        Some(p) => p,
        None => cfg.corpus_path()?,
    };
    if !corpus_path.exists() {
        bail!(
            "No corpus at {} (create it or pass --corpus <path>)",
            corpus_path.display()
        );
    }
    let model_dir = match model_dir {
        Some(p) => p,
        None => cfg.model_dir()?,
    };

    let examples =
        load_corpus(&corpus_path).with_context(|| format!("loading {}", corpus_path.display()))?;
    let report = train_to_dir(&examples, &TrainOptions::default(), &model_dir)?;

    println!(
        "Trained on {} examples ({} unknown-labeled skipped)",
        report.examples, report.skipped_unknown
    );
    for (label, count) in &report.category_counts {
        println!("  {:<16} {}", label, count);
    }
    match report.holdout_accuracy {
        Some(acc) => println!("Hold-out accuracy: {:.0}%", acc * 100.0),
        None => println!("Hold-out accuracy: skipped (corpus too small to split)"),
    }
    println!("Model pair written to {}", model_dir.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_classify(
    cfg: &Config,
    input: PathBuf,
    year: Option<i32>,
    threshold: Option<f64>,
    report: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    corpus: Option<PathBuf>,
    queue: Option<PathBuf>,
) -> Result<()> {
    let threshold = threshold.unwrap_or(cfg.threshold);
    let model_dir = match model_dir {
        Some(p) => p,
        None => cfg.model_dir()?,
    };
    let corpus_path = match corpus {
        Some(p) => p,
        None => cfg.corpus_path()?,
    };
    let queue_path = match queue {
        Some(p) => p,
        None => cfg.queue_path()?,
    };

    let txns = if input.extension().and_then(|e| e.to_str()) == Some("csv") {
        capital_one_csv::parse_csv_path(&input)
            .with_context(|| format!("parsing {}", input.display()))?
    } else {
        let statement_year = year
            .or(cfg.statement_year)
            .unwrap_or_else(|| chrono::Local::now().year());
        let text =
            fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
        capital_one::parse_statement_text(&text, statement_year)
            .with_context(|| format!("parsing {}", input.display()))?
    };
    if txns.is_empty() {
        bail!("No transactions parsed from {}", input.display());
    }

    let pair = ModelPair::load(&model_dir).context("loading model pair (run: finbuddy train)")?;
    tracing::debug!(pair_id = pair.pair_id(), threshold, "classifying batch");
    let patterns = if corpus_path.exists() {
        PatternSet::compile(&load_corpus(&corpus_path)?)
    } else {
        PatternSet::compile(&[])
    };

    let predictions: Vec<Prediction> = txns
        .iter()
        .map(|t| pair.predict_with_overrides(&patterns, &t.description))
        .collect();

    let records: Vec<CategorizedTransaction> = txns
        .iter()
        .zip(&predictions)
        .map(|(t, p)| {
            // only confidently categorized transactions keep their label
            let category = if p.confidence > threshold {
                p.category
            } else {
                Category::Unknown
            };
            let record = CategorizedTransaction::new(
                t.trans_date,
                &t.description,
                t.amount,
                category,
                p.confidence,
            );
            match &t.cardholder {
                Some(name) => record.with_cardholder(name),
                None => record,
            }
        })
        .collect();

    let spending = spending_by_category(&records);
    let report_path = report.unwrap_or_else(|| PathBuf::from("finbuddy-report.json"));
    let doc = ClassifyReport {
        transactions: records,
        spending,
    };
    fs::write(&report_path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("writing {}", report_path.display()))?;

    let mut queue_entries = review::read_queue(&queue_path)?;
    let mut added = 0;
    for entry in filter_for_review(&predictions, threshold) {
        if !queue_entries.iter().any(|e| e.description == entry.description) {
            queue_entries.push(entry);
            added += 1;
        }
    }
    review::write_queue(&queue_path, &queue_entries)?;

    println!("Parsed {} transactions from {}", txns.len(), input.display());
    println!("Report: {}", report_path.display());
    println!(
        "{} new descriptions queued for review ({} pending total): {}",
        added,
        queue_entries.len(),
        queue_path.display()
    );
    Ok(())
}

fn cmd_review(cfg: &Config, queue: Option<PathBuf>) -> Result<()> {
    let queue_path = match queue {
        Some(p) => p,
        None => cfg.queue_path()?,
    };
    let mut entries = review::read_queue(&queue_path)?;
    if entries.is_empty() {
        println!("Review queue is empty.");
        return Ok(());
    }

    sort_for_report(&mut entries);
    println!("{} entries pending review (least confident first):\n", entries.len());
    for entry in &entries {
        println!(
            "  {:>4.2}  {:<16} {}",
            entry.confidence,
            entry.category.label(),
            entry.description
        );
    }
    println!("\nResolve with: finbuddy resolve <description> --accept | --category <label> | --unknown");
    Ok(())
}

fn cmd_resolve(
    cfg: &Config,
    description: String,
    accept: bool,
    category: Option<String>,
    unknown: bool,
    queue: Option<PathBuf>,
    corpus: Option<PathBuf>,
) -> Result<()> {
    let decision = match (accept, &category, unknown) {
        (true, None, false) => ReviewDecision::Accept,
        (false, Some(label), false) => {
            let category = Category::from_label(label).ok_or_else(|| {
                let valid: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
                anyhow::anyhow!("unknown category '{}' (valid: {})", label, valid.join(", "))
            })?;
            ReviewDecision::Reassign(category)
        }
        (false, None, true) => ReviewDecision::MarkUnknown,
        _ => bail!("pass exactly one of --accept, --category <label>, --unknown"),
    };

    let queue_path = match queue {
        Some(p) => p,
        None => cfg.queue_path()?,
    };
    let corpus_path = match corpus {
        Some(p) => p,
        None => cfg.corpus_path()?,
    };

    let mut entries = review::read_queue(&queue_path)?;
    let Some(index) = entries.iter().position(|e| e.description == description) else {
        bail!("'{}' is not in the review queue", description);
    };
    let entry = entries.remove(index);

    match resolve(&entry, decision) {
        Some(example) => {
            append_to_corpus(&corpus_path, &[example])?;
            println!(
                "Recorded '{}' in {} (retrain to pick it up: finbuddy train)",
                description,
                corpus_path.display()
            );
        }
        None => println!("Discarded '{}' without training on it", description),
    }

    review::write_queue(&queue_path, &entries)?;
    Ok(())
}
