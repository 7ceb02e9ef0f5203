//! Command-line interface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

use lawtext_core::config::{AnchorLexicon, VerifierConfig};
use lawtext_core::merger::{validate_extracted_law, MergeOptions, DEFAULT_CATEGORY};
use lawtext_core::types::{AnchorStatus, ExtractedLaw, OverallStatus};
use lawtext_core::verifier::{apply_verification, verify_law, VerificationReport};

use crate::client::AnthropicClient;
use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::extraction::{LlmSectionExtractor, SectionExtractor};
use crate::pdf::load_document;
use crate::pipeline::ExtractionPipeline;
use crate::storage;

const DEFAULT_OUTPUT_DIR: &str = "output";
const ANCHOR_WRAP_WIDTH: usize = 100;

/// lawtext - Extract and verify sections of legislation PDFs.
#[derive(Parser)]
#[command(name = "lawtext")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract sections from PDF or text files.
    Extract {
        /// Input files (.pdf or plain text)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for <slug>.json and <slug>.raw.txt
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Slug for the law (single input only; derived from the title otherwise)
        #[arg(short, long)]
        slug: Option<String>,

        /// Law category
        #[arg(short, long, default_value = DEFAULT_CATEGORY)]
        category: String,

        /// Skip anchor verification after extraction
        #[arg(long)]
        no_verify: bool,
    },

    /// Verify extracted sections against their source text.
    Verify {
        /// Slug of the law to verify
        slug: Option<String>,

        /// Verify every law in the directory
        #[arg(long, conflicts_with = "slug")]
        all: bool,

        /// Show per-anchor detail
        #[arg(short, long)]
        verbose: bool,

        /// Write verification results back into the artifact
        #[arg(short, long)]
        update: bool,

        /// Directory holding the artifacts
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        dir: PathBuf,

        /// JSON file with custom distinctive terms and boilerplate phrases
        #[arg(short, long)]
        lexicon: Option<PathBuf>,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            inputs,
            output,
            slug,
            category,
            no_verify,
        } => extract_command(&inputs, &output, slug.as_deref(), &category, !no_verify).await,
        Commands::Verify {
            slug,
            all,
            verbose,
            update,
            dir,
            lexicon,
        } => verify_command(slug.as_deref(), all, verbose, update, &dir, lexicon.as_deref()),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn status_style(status: OverallStatus) -> StyledObject<String> {
    let label = status.to_string().to_uppercase();
    match status {
        OverallStatus::Pass => style(label).green().bold(),
        OverallStatus::Review => style(label).yellow().bold(),
        OverallStatus::Fail => style(label).red().bold(),
    }
}

fn load_verifier_config(lexicon: Option<&Path>) -> Result<VerifierConfig> {
    let config = VerifierConfig::default();
    match lexicon {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(config.with_lexicon(AnchorLexicon::from_json(&json)?))
        }
        None => Ok(config),
    }
}

/// Report batch failures once every document has been attempted.
fn finish_batch(failed: &[String], total: usize) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    Err(ExtractorError::InvalidInput(format!(
        "{} of {} documents failed: {}",
        failed.len(),
        total,
        failed.join(", ")
    )))
}

/// Execute the extract command.
async fn extract_command(
    inputs: &[PathBuf],
    output: &Path,
    slug: Option<&str>,
    category: &str,
    verify: bool,
) -> Result<()> {
    if slug.is_some() && inputs.len() > 1 {
        return Err(ExtractorError::InvalidInput(
            "--slug can only be used with a single input file".into(),
        ));
    }

    // Validate inputs before making any LLM requests
    for input in inputs {
        if !input.is_file() {
            return Err(ExtractorError::InvalidInput(format!(
                "input file does not exist: {}",
                input.display()
            )));
        }
    }

    let config = ExtractorConfig::from_env()?;
    let client = AnthropicClient::new(&config)?;
    let extractor = LlmSectionExtractor::new(&client, &config);
    let verifier_config = VerifierConfig::default();

    let mut failed = Vec::new();
    for input in inputs {
        let outcome = extract_one(
            input,
            output,
            slug,
            category,
            verify.then_some(&verifier_config),
            &extractor,
            &config,
        )
        .await;

        if let Err(e) = outcome {
            if inputs.len() == 1 {
                return Err(e);
            }
            eprintln!(
                "{} {}: {e}",
                style("Failed").red().bold(),
                input.display()
            );
            failed.push(input.display().to_string());
        }
    }

    finish_batch(&failed, inputs.len())
}

async fn extract_one<E: SectionExtractor>(
    input: &Path,
    output: &Path,
    slug: Option<&str>,
    category: &str,
    verifier_config: Option<&VerifierConfig>,
    extractor: &E,
    config: &ExtractorConfig,
) -> Result<()> {
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    println!("{} {}", style("Extracting").bold(), style(&filename).cyan());

    let document = load_document(input)?;
    println!(
        "  Pages: {}  Characters: {}",
        document.total_pages, document.total_characters
    );

    let mut options = MergeOptions::new(&filename).with_category(category);
    if let Some(slug) = slug {
        options = options.with_slug(slug);
    }

    let pb = spinner();
    let law = match ExtractionPipeline::new(extractor, config)
        .with_progress(pb.clone())
        .extract_document(&document, options)
        .await
    {
        Ok(law) => law,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    let law = match verifier_config {
        Some(config) => {
            pb.set_message("Verifying...");
            let report = verify_law(&law, &document.text, config);
            apply_verification(&law, &report)
        }
        None => law,
    };

    pb.set_message("Saving...");
    let saved = storage::save_extraction(output, &law, &document.text);
    pb.finish_and_clear();
    let path = saved?;

    print_extraction_summary(&law);
    println!("{} {}", style("Saved to:").green().bold(), path.display());
    println!();

    Ok(())
}

fn print_extraction_summary(law: &ExtractedLaw) {
    println!("  Title: {}", style(&law.law.title).green());
    println!("  Slug: {}", law.law.slug);
    println!("  Sections: {}", law.sections.len());
    println!("  Confidence: {:.2}", law.quality.confidence);

    if let Some(verification) = &law.quality.verification {
        println!("  Verification: {}", status_style(verification.status));
    }
    if law.quality.manual_review_required {
        println!("  {}", style("Manual review required").yellow().bold());
    }
    if !law.quality.warnings.is_empty() {
        println!(
            "  Warnings: {}",
            style(law.quality.warnings.len()).yellow().bold()
        );
    }
    for error in validate_extracted_law(law) {
        println!("  {} {error}", style("Invalid:").red());
    }
}

/// Execute the verify command.
fn verify_command(
    slug: Option<&str>,
    all: bool,
    verbose: bool,
    update: bool,
    dir: &Path,
    lexicon: Option<&Path>,
) -> Result<()> {
    let config = load_verifier_config(lexicon)?;

    let slugs = match (slug, all) {
        (_, true) => storage::list_slugs(dir)?,
        (Some(slug), false) => vec![slug.to_string()],
        (None, false) => {
            return Err(ExtractorError::InvalidInput(
                "provide a slug or use --all".into(),
            ))
        }
    };

    if slugs.is_empty() {
        println!("No extracted laws found in {}", dir.display());
        return Ok(());
    }

    let mut failed = Vec::new();
    let mut tally = [0usize; 3];

    for slug in &slugs {
        match verify_one(dir, slug, &config, verbose, update) {
            Ok(status) => {
                let slot = match status {
                    OverallStatus::Pass => 0,
                    OverallStatus::Review => 1,
                    OverallStatus::Fail => 2,
                };
                tally[slot] += 1;
            }
            Err(e) if all => {
                eprintln!("{} {slug}: {e}", style("Error").red().bold());
                failed.push(slug.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if all {
        println!(
            "{} {} pass, {} review, {} fail",
            style("Summary:").bold(),
            style(tally[0]).green(),
            style(tally[1]).yellow(),
            style(tally[2]).red()
        );
    }

    finish_batch(&failed, slugs.len())
}

fn verify_one(
    dir: &Path,
    slug: &str,
    config: &VerifierConfig,
    verbose: bool,
    update: bool,
) -> Result<OverallStatus> {
    let law = storage::load_law(dir, slug)?;
    let raw_text = storage::load_raw_text(dir, slug)?;

    let report = verify_law(&law, &raw_text, config);
    print_report(&law, &report, verbose);

    if update {
        let path = storage::save_law(dir, &apply_verification(&law, &report))?;
        println!("  {} {}", style("Updated").green(), path.display());
    }
    println!();

    Ok(report.overall_status)
}

fn print_report(law: &ExtractedLaw, report: &VerificationReport, verbose: bool) {
    println!(
        "{} {} {}",
        status_style(report.overall_status),
        style(&law.law.slug).cyan().bold(),
        style(&law.law.title).dim()
    );

    let count = &report.section_count;
    println!(
        "  Section count: {} estimated, {} extracted ({}, allowed difference {:.0})",
        count.pdf_estimate, count.extracted, count.status, count.allowed_difference
    );
    println!(
        "  Anchors: {} verified, {} partial, {} not found",
        report.summary.verified_sections,
        report.summary.partial_sections,
        report.summary.not_found_sections
    );

    for section in &report.sections {
        let marker = match section.status {
            AnchorStatus::Verified if !verbose => continue,
            AnchorStatus::Verified => style("ok").green(),
            AnchorStatus::Partial => style("partial").yellow(),
            AnchorStatus::NotFound => style("not found").red(),
        };
        println!(
            "  Section {} [{}] {}/{} anchors",
            section.number,
            marker,
            section.found_count(),
            section.anchors.len()
        );

        if verbose {
            for anchor in &section.anchors {
                let prefix = if anchor.found { "+" } else { "-" };
                let options = textwrap::Options::new(ANCHOR_WRAP_WIDTH)
                    .initial_indent("      ")
                    .subsequent_indent("      ");
                println!("    {prefix} anchor:");
                println!("{}", textwrap::fill(&anchor.anchor, options));
            }
        }
    }
}
