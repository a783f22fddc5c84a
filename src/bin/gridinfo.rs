//! Command line tool to detect and summarise unstructured grid files
//!
//! Works out which convention a grid file follows, reads it into the common
//! grid model, and prints a short summary of what was found.
//!
//! # Usage
//!
//! ```text
//! Usage: gridinfo <file> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default the detected convention and a summary of the mesh is logged.
//!
//! ```bash
//! # Print a summary of the grid
//! gridinfo outCSne8.cdl
//! ```
//!
//! ### Detection policy
//!
//! Datasets that carry the marker variables of more than one convention are
//! resolved by the last matching marker. This can be changed to the first
//! match, or to reject ambiguous files entirely.
//!
//! ```bash
//! # Use the first matching marker
//! gridinfo mixed.cdl --first-match
//!
//! # Fail if more than one marker matches
//! gridinfo mixed.cdl --strict
//! ```
//!
//! ### Convert to the native convention
//!
//! Dataset-based conventions are promoted to the native `Mesh2` variables
//! when read, and can be written back out as CDL.
//!
//! ```bash
//! # Output a file named 'grid.cdl'
//! gridinfo outCSne8.cdl --output grid.cdl
//! ```
//!
//! ### Summary as JSON
//!
//! ```bash
//! # Output a file named 'gridinfo.json'
//! gridinfo mesh.ugrid --json
//! ```
//!

// standard libraries
use std::fs::File;
use std::io::BufWriter;

// crate modules
use uxgrid::grid::Grid;
use uxgrid::readers::{GridReader, ProbeResolution};
use uxgrid::utils::*;

// external crates
use anyhow::Result;
use clap::{arg, Parser};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    // configure the reader from the command line
    let mut reader = GridReader::new();
    reader.set_resolution(cli.resolution());
    if cli.quiet {
        reader.disable_progress();
    }

    // Try to read the grid, detecting the convention on the way
    info!("Reading {}", &cli.file);
    let mut grid = reader.open(&cli.file)?;

    // Derived quantities for the summary, nothing to do for stub grids
    if grid.is_populated() {
        derive_quantities(&mut grid)?;
    }

    // Log a summary of the grid to the terminal for reference
    if !cli.quiet {
        print_summary(&grid);
    }

    if let Some(output) = &cli.output {
        info!("Writing native dataset to {output}");
        grid.write(output, "cdl")?;
    }

    if cli.json {
        write_json(&grid)?;
    }

    Ok(())
}

/// Detect and summarise unstructured grid files
///
/// Reads Exodus, SCRIP, UGRID, shapefile and native grid files into a common
/// mesh of nodes and faces. The convention is detected from the marker
/// variables of a dataset, or the file extension for formats that are not
/// datasets.
///
/// Examples
/// --------
///
///  Print a summary of the grid
///     $ gridinfo outCSne8.cdl
///
///  Reject files with conflicting markers
///     $ gridinfo mixed.cdl --strict
///
///  Write the grid as a native dataset
///     $ gridinfo outCSne8.cdl --output grid.cdl
///
///  Write a JSON summary
///     $ gridinfo mesh.ugrid --json
///
/// Notes
/// -----
///
/// Datasets are read from the CDL text produced by `ncdump`. Recognised
/// extensions for everything else are '.ugrid', '.ug' and '.shp', and
/// matching is case sensitive.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: gridinfo outCSne8.cdl\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("gridinfo <file> [options]")
)]
struct Cli {
    // * Positional
    /// Path to grid file
    #[arg(name = "file")]
    file: String,

    /// Fail if more than one marker variable matches
    #[arg(help_heading("Detection options"))]
    #[arg(long, conflicts_with = "first_match")]
    strict: bool,

    /// Use the first matching marker variable, not the last
    #[arg(help_heading("Detection options"))]
    #[arg(long)]
    first_match: bool,

    /// Write the dataset in the native convention to a CDL file
    ///
    /// Only available for conventions read through the dataset reader.
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    output: Option<String>,

    /// Generate a JSON summary ('gridinfo.json')
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    json: bool,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn resolution(&self) -> ProbeResolution {
        match (self.strict, self.first_match) {
            (true, _) => ProbeResolution::Strict,
            (false, true) => ProbeResolution::FirstMatch,
            (false, false) => ProbeResolution::LastMatch,
        }
    }
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    let result = stderrlog::new()
        .modules(vec![module_path!(), "uxgrid"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init();

    if let Err(e) = result {
        eprintln!("Logging not initialised: {e}");
    }
}

/// Creates a banner fot the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Uxgrid :: Grid Inspector");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Edges, area and validation for the summary
fn derive_quantities(grid: &mut Grid) -> Result<()> {
    grid.build_edge_face_connectivity()?;
    grid.calculate_total_face_area()?;
    if let Err(e) = grid.validate() {
        warn!("Grid did not validate: {e}");
    }
    Ok(())
}

#[doc(hidden)]
/// Helper function for cleaning up file IO boilerplate
fn get_writer(path: &str) -> Result<BufWriter<File>> {
    let file: File = File::create(path)?;
    debug!("New bufwriter for {path}");
    Ok(BufWriter::new(file))
}

#[doc(hidden)]
/// Write the grid summary to json
fn write_json(grid: &Grid) -> Result<()> {
    let output = "gridinfo.json";
    debug!("Writing JSON summary to {}", output);
    let writer = get_writer(output)?;
    Ok(serde_json::to_writer_pretty(writer, &grid.summary())?)
}

#[doc(hidden)]
/// Write summary to the terminal
fn print_summary(grid: &Grid) {
    let summary = grid.summary();
    let mut s = "Summary of grid file\n".to_string();
    s += &f!("format   : {}\n", summary.format);
    s += &f!("nodes    : {}\n", summary.n_nodes);
    s += &f!("faces    : {}", summary.n_faces);
    if let Some(max) = summary.max_face_nodes {
        s += &f!(" (up to {max} nodes)");
    }
    if let Some(edges) = summary.n_edges {
        s += &f!("\nedges    : {edges}");
    }
    if let Some(area) = summary.total_face_area {
        s += &f!("\narea     : {}", area.sci(5, 2));
    }
    if let Some(dimension) = summary.topology_dimension {
        s += &f!("\ntopology : {dimension}D");
    }
    println!("{s}")
}
