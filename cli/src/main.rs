//! docxcraft CLI - inspect and generate Word documents
//!
//! A command-line tool for looking at the section layout and merged table
//! cells of DOCX files, and for writing a sample document.

use clap::{Parser, Subcommand};
use colored::*;
use docxcraft::{
    Alignment, BorderStyle, CellAlignment, Document, DocumentOutline, FontStyle, FrameAnchor,
    FrameWrapping, HorizontalPosition, JsonFormat, Orientation, PageNumberFormat, TableAlignment,
    VerticalPosition,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Inspect and generate Word documents
#[derive(Parser)]
#[command(
    name = "docxcraft",
    author = "iyulab",
    version,
    about = "Inspect and generate Word documents",
    long_about = "docxcraft - Build Word documents with sections and merged table cells.\n\n\
                  Shows the section layout and table grids of DOCX files and writes sample documents."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show paragraph, section and table counts
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// List sections with their paragraph ranges and page layout
    Sections {
        /// Input file path
        input: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Output compact JSON (no indentation)
        #[arg(long, requires = "json")]
        compact: bool,
    },

    /// List tables with their grids and merged regions
    Tables {
        /// Input file path
        input: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Output compact JSON (no indentation)
        #[arg(long, requires = "json")]
        compact: bool,
    },

    /// Print the XML of the document body
    Dump {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a sample document using sections, merges and a text frame
    Demo {
        /// Output file path
        #[arg(default_value = "demo.docx")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            let doc = load(&input)?;
            let outline = DocumentOutline::from_document(&doc);

            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Paragraphs".bold(), outline.paragraph_count);
            println!("{}: {}", "Sections".bold(), outline.sections.len());
            println!("{}: {}", "Tables".bold(), outline.tables.len());

            let merged: usize = outline.tables.iter().map(|t| t.merged.len()).sum();
            println!("{}: {}", "Merged regions".bold(), merged);

            let words: usize = doc
                .paragraphs()
                .iter()
                .map(|p| p.text(&doc).split_whitespace().count())
                .sum();
            println!("{}: {}", "Words".bold(), words);
        }

        Commands::Sections {
            input,
            json,
            compact,
        } => {
            let doc = load(&input)?;
            let outline = DocumentOutline::from_document(&doc);

            if json {
                let format = if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                };
                write_output(None, &outline.sections_json(format)?)?;
                return Ok(());
            }

            println!("{}", "Sections".cyan().bold());
            println!("{}", "─".repeat(60));
            for (i, s) in outline.sections.iter().enumerate() {
                let range = format!("¶{}–¶{}", s.first_paragraph + 1, s.last_paragraph + 1);
                let layout = match &s.properties {
                    Some(p) => format!(
                        "{} x {} twips, {:?}, {} column(s)",
                        p.page_width.unwrap_or(0),
                        p.page_height.unwrap_or(0),
                        p.orientation,
                        p.columns
                    ),
                    None => "no page properties".dimmed().to_string(),
                };
                let marker = if s.split { "" } else { " (body)" };
                println!("{:>3}  {:<14} {}{}", i + 1, range, layout, marker.dimmed());
            }
        }

        Commands::Tables {
            input,
            json,
            compact,
        } => {
            let doc = load(&input)?;
            let outline = DocumentOutline::from_document(&doc);

            if json {
                let format = if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                };
                write_output(None, &outline.tables_json(format)?)?;
                return Ok(());
            }

            if outline.tables.is_empty() {
                println!("{} No tables found in document", "!".yellow().bold());
                return Ok(());
            }
            for (i, t) in outline.tables.iter().enumerate() {
                println!(
                    "{} {} ({} x {})",
                    "Table".cyan().bold(),
                    i + 1,
                    t.rows,
                    t.cols
                );
                println!("  {}: {:?}", "Cells per row".bold(), t.physical_cells);
                for region in &t.merged {
                    println!(
                        "  merged ({}, {}) spanning {} row(s) x {} column(s)",
                        region.origin_row, region.origin_col, region.row_span, region.col_span
                    );
                }
            }
        }

        Commands::Dump { input, output } => {
            let doc = load(&input)?;
            write_output(output.as_ref(), &doc.to_string())?;
        }

        Commands::Demo { output } => {
            let doc = build_demo();
            log::debug!("demo document: {:?}", doc);
            doc.save(&output)?;
            println!(
                "{} Wrote sample document: {}",
                "✓".green().bold(),
                output.display()
            );
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    let pb = create_spinner("Loading document...");
    let doc = Document::open(path);
    pb.finish_and_clear();
    Ok(doc?)
}

/// A two-section document with merged table cells and a text frame.
fn build_demo() -> Document {
    let mut doc = Document::new();

    let title = doc.append_paragraph();
    title.append_run_with_size(&mut doc, "docxcraft sample", 20.0);
    title.set_alignment(&mut doc, Alignment::Center);
    title.set_font_style(&mut doc, FontStyle::BOLD);

    let intro = doc.append_paragraph_with_text("The first section is portrait with page numbers in dashes.");
    intro.set_spacing_after(&mut doc, 240);
    intro.set_first_line_indent_chars(&mut doc, 2.0);

    let table = doc.append_table(4, 5);
    table.set_alignment(&mut doc, TableAlignment::Center);
    let mut c11 = table.cell(&doc, 1, 1);
    let mut c12 = table.cell(&doc, 1, 2);
    table.merge_cells(&mut doc, &mut c11, &mut c12);
    let mut c13 = table.cell(&doc, 1, 3);
    table.merge_cells(&mut doc, &mut c11, &mut c13);
    let mut c04 = table.cell(&doc, 0, 4);
    let mut c14 = table.cell(&doc, 1, 4);
    table.merge_cells(&mut doc, &mut c04, &mut c14);
    c04.set_vertical_alignment(&mut doc, CellAlignment::Center);
    let p = c04.first_paragraph(&doc);
    p.set_alignment(&mut doc, Alignment::Center);
    p.append_run_with_text(&mut doc, "merged");
    c11.first_paragraph(&doc).append_run_with_text(&mut doc, "three columns wide");

    let end_of_first = doc.append_paragraph_with_text("End of the first section.");
    let first = end_of_first.insert_section_break(&mut doc);
    first.set_page_number(&mut doc, PageNumberFormat::NumberInDash, None);

    doc.append_paragraph_with_text("The second section is landscape with two columns.");
    let second = doc.last_section();
    second.set_orientation(&mut doc, Orientation::Landscape);
    second.set_columns(&mut doc, 2, 425);
    second.set_page_number(&mut doc, PageNumberFormat::UpperRoman, Some(1));

    let frame = doc.append_text_frame(3500, 1500);
    frame.append_run_with_text(&mut doc, "A framed note");
    frame.set_position_x(&mut doc, HorizontalPosition::Right, FrameAnchor::Margin);
    frame.set_position_y(&mut doc, VerticalPosition::Top, FrameAnchor::Margin);
    frame.set_wrapping(&mut doc, FrameWrapping::Around);
    frame.set_borders(&mut doc, BorderStyle::Single, 0.5, "auto");

    doc
}

fn print_version() {
    println!("{} {}", "docxcraft".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Build Word documents with sections and merged table cells");
    println!();
    println!("Repository: https://github.com/iyulab/docxcraft");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
