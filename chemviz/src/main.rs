use anyhow::Result;
use args::{get_required_outputs, parse_args, RequiredOutputFiles};
use chemviz_core::{
    aggregate::aggregate,
    excel::{create_summary_xlsx, write_summary_to_file},
    formatting::format_number,
    model::Summary,
    read::read_table_from_file,
    report::{render_summary_report, write_report_to_file},
};
use clap::builder::styling::AnsiColor;
use env_logger::{Builder, Env};
use log::{debug, error, info, logger, warn};
use logging_timer::time;
use rayon::prelude::*;
use std::{io::Write, path::Path};

mod args;

pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

#[time]
fn main() -> Result<()> {
    configure_logging();
    main2()?;
    logger().flush();
    Ok(())
}

#[time]
fn main2() -> Result<()> {
    info!("Starting {PROGRAM_NAME}");

    let args = parse_args();
    debug!("{:?}", &args);
    if args.force {
        info!("'--force' specified, all existing output files will be overwritten");
    }

    let input_files = args.files();
    if input_files.is_empty() {
        warn!("No .csv files specified, exiting");
        return Ok(());
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    // Each file is independent of the others.
    input_files.par_iter().for_each(|f| {
        let rof = get_required_outputs(&args, f);
        debug!("Required Output Files: {:?}", &rof);

        if let Err(err) = analyse_file(f, &rof) {
            error!("Error while processing file {:?}: {}", f, err)
        };
    });

    Ok(())
}

fn analyse_file(input_file: &Path, rof: &RequiredOutputFiles) -> Result<()> {
    let table = read_table_from_file(input_file)?;
    let summary = aggregate(table)?;
    log_summary(input_file, &summary);

    let filename = input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(report_file) = &rof.report_file {
        let pdf = render_summary_report(&filename, &summary)?;
        write_report_to_file(report_file, &pdf)?;
    }

    if let Some(workbook_file) = &rof.workbook_file {
        let workbook = create_summary_xlsx(&filename, &summary)?;
        write_summary_to_file(workbook_file, workbook)?;
    }

    Ok(())
}

fn log_summary(input_file: &Path, summary: &Summary) {
    info!(
        "{:?}: Total Equipment: {}, Average Flowrate: {}, Average Pressure: {}, Average Temperature: {}",
        input_file,
        summary.total_equipment,
        format_number(summary.avg_flowrate),
        format_number(summary.avg_pressure),
        format_number(summary.avg_temperature)
    );

    for (equipment_type, count) in &summary.equipment_type_distribution {
        info!("{:?}: {equipment_type}: {count}", input_file);
    }
}

fn configure_logging() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    builder.format(|buf, record| {
        let level_style = buf.default_level_style(record.level());
        let level_style = match record.level() {
            log::Level::Error => level_style.fg_color(Some(AnsiColor::Red.into())),
            log::Level::Warn => level_style.fg_color(Some(AnsiColor::Yellow.into())),
            log::Level::Info => level_style.fg_color(Some(AnsiColor::Green.into())),
            log::Level::Debug => level_style.fg_color(Some(AnsiColor::Blue.into())),
            log::Level::Trace => level_style.fg_color(Some(AnsiColor::Magenta.into())),
        };

        match (record.file(), record.line()) {
            (Some(file), Some(line)) => writeln!(
                buf,
                "[{} {level_style}{}{level_style:#} [{}] {}/{}] {}",
                buf.timestamp_micros(),
                record.level(),
                record.target(),
                file,
                line,
                record.args()
            ),
            _ => writeln!(
                buf,
                "[{} {level_style}{}{level_style:#}] {}",
                buf.timestamp_micros(),
                record.level(),
                record.args()
            ),
        }
    });

    builder.init();
}
