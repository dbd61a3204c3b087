use std::path::{Path, PathBuf};

use clap::{arg, command, Parser};
use log::warn;

pub fn parse_args() -> Args {
    // wild expands globs such as *.csv on Windows, where the shell does not.
    Args::parse_from(wild::args_os())
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(
        short,
        long,
        default_value = "false",
        help = "Write a PDF report for each input file, named after the file with a '.pdf' extension."
    )]
    pub pdf: bool,

    #[arg(
        short,
        long,
        default_value = "false",
        help = "Write an Excel workbook for each input file, containing the summary, \
        a chart of the equipment type distribution and the data."
    )]
    pub xlsx: bool,

    #[arg(
        short,
        long,
        help = "The directory to write output files to. If not specified, they are written \
        next to the input file."
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = "false",
        help = "Overwrite existing output files."
    )]
    pub force: bool,

    #[arg(required = true, help = "CSV files of chemical equipment to analyse.")]
    pub files: Vec<PathBuf>,
}

impl Args {
    /// Returns the input files that look like CSV files.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| is_csv_file(f))
            .cloned()
            .collect()
    }
}

fn is_csv_file(p: &Path) -> bool {
    p.extension()
        .is_some_and(|ext| ext.to_ascii_lowercase() == "csv")
}

/// The output files that need to be written for one input file. An output is
/// `None` if it was not asked for, or if it already exists and `--force` was
/// not given.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequiredOutputFiles {
    pub report_file: Option<PathBuf>,
    pub workbook_file: Option<PathBuf>,
}

pub fn get_required_outputs(args: &Args, input_file: &Path) -> RequiredOutputFiles {
    let mut rof = RequiredOutputFiles::default();

    if args.pdf {
        let p = output_path(input_file, args.output_dir.as_deref(), "pdf");
        rof.report_file = keep_unless_exists(p, args.force);
    }

    if args.xlsx {
        let p = output_path(input_file, args.output_dir.as_deref(), "xlsx");
        rof.workbook_file = keep_unless_exists(p, args.force);
    }

    rof
}

fn output_path(input_file: &Path, output_dir: Option<&Path>, extension: &str) -> PathBuf {
    let p = input_file.with_extension(extension);
    match (output_dir, p.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => p,
    }
}

fn keep_unless_exists(p: PathBuf, force: bool) -> Option<PathBuf> {
    if p.exists() && !force {
        warn!("Output file {:?} exists and --force not specified, skipping", p);
        None
    } else {
        Some(p)
    }
}
