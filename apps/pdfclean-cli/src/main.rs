//! PDF Cleaner command-line front-end
//!
//! Opens one PDF, applies the requested edits in a fixed order (text, images,
//! rotation, pages, last page), optionally prints the page contents report
//! and writes the result to a new file.

use anyhow::{bail, Context};
use clap::Parser;
use pdfclean_core::{
    parse_ranges, CleanPlan, DocumentEditor, ImageRemoval, PageSelector, Rotation,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdfclean")]
#[command(version, about = "Strip text, images and pages from a PDF")]
struct Args {
    /// PDF file to clean
    input: PathBuf,

    /// Where to write the cleaned PDF (never the input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON clean plan; replaces the individual edit flags
    #[arg(long, conflicts_with_all = [
        "remove_text", "remove_all_text", "remove_image", "rotate",
        "remove_pages", "remove_last_page",
    ])]
    plan: Option<PathBuf>,

    /// Text to remove from every content stream (repeatable)
    #[arg(long = "remove-text", value_name = "TEXT")]
    remove_text: Vec<String>,

    /// Remove every text run on every page
    #[arg(long, conflicts_with = "remove_text")]
    remove_all_text: bool,

    /// Image pixel size to remove, e.g. 100x100 (repeatable)
    #[arg(long = "remove-image", value_name = "WxH")]
    remove_image: Vec<String>,

    /// Allowed per-dimension pixel deviation for --remove-image
    #[arg(long, default_value = "0")]
    tolerance: u32,

    /// Pages to rotate, e.g. "1-3, 5"
    #[arg(long, value_name = "PAGES", requires = "angle")]
    rotate: Option<String>,

    /// Rotation angle: 0, 90, 180 or 270
    #[arg(long, requires = "rotate")]
    angle: Option<i64>,

    /// Pages to delete, numbered as in the input file
    #[arg(long, value_name = "PAGES")]
    remove_pages: Option<String>,

    /// Delete the last page after all other edits
    #[arg(long)]
    remove_last_page: bool,

    /// Print a JSON report of page contents after editing (all pages if no list)
    #[arg(long, value_name = "PAGES", num_args = 0..=1)]
    inspect: Option<Option<String>>,

    /// Leave words out of the report
    #[arg(long)]
    no_texts: bool,

    /// Leave images out of the report
    #[arg(long)]
    no_images: bool,
}

fn selector(pages: &str) -> anyhow::Result<PageSelector> {
    let pages = parse_ranges(pages).with_context(|| format!("Invalid page list {:?}", pages))?;
    Ok(PageSelector::from(pages))
}

/// Build the clean plan from `--plan` or from the edit flags
fn build_plan(args: &Args) -> anyhow::Result<CleanPlan> {
    if let Some(path) = &args.plan {
        return CleanPlan::load(path)
            .with_context(|| format!("Failed to load plan {}", path.display()));
    }

    let mut plan = CleanPlan::default();
    if args.remove_all_text {
        plan.remove_texts = Some(Vec::new());
    } else if !args.remove_text.is_empty() {
        plan.remove_texts = Some(args.remove_text.clone());
    }
    if !args.remove_image.is_empty() {
        plan.remove_images = Some(ImageRemoval {
            sizes: args.remove_image.clone(),
            tolerance: args.tolerance,
        });
    }
    if let (Some(pages), Some(angle)) = (&args.rotate, args.angle) {
        plan.rotate = Some(Rotation {
            pages: selector(pages)?,
            angle,
        });
    }
    if let Some(pages) = &args.remove_pages {
        plan.remove_pages = Some(selector(pages)?);
    }
    plan.remove_last_page = args.remove_last_page;
    Ok(plan)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let plan = build_plan(args)?;
    if plan.is_empty() && args.inspect.is_none() {
        bail!("Nothing to do: pass an edit flag, --plan or --inspect");
    }

    let mut editor = DocumentEditor::open(&args.input)?;

    if !plan.is_empty() {
        plan.apply(&mut editor)
            .with_context(|| format!("Failed to clean {}", args.input.display()))?;
    }

    if let Some(pages) = &args.inspect {
        let pages = match pages {
            Some(pages) => selector(pages)?,
            None => PageSelector::all(),
        };
        let report = editor.page_contents(&pages, !args.no_texts, !args.no_images);
        println!("{}", report.to_json_pretty()?);
    }

    match &args.output {
        Some(output) => editor.save(output)?,
        None if !plan.is_empty() => {
            tracing::warn!("No --output given, edits were not saved")
        }
        None => {}
    }

    editor.close();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the JSON report, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(&args)
}
