// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! `bbrc`: mine backbone refinement class representatives from a GSP file.

use bbrc_miner::{
    LineFormatter, Miner, MinerConfig, MinerError, MiningEvent, OutputFormat, PatternKind,
    PatternSink,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: bbrc [-f minfreq] [-l 1|2|3] [-p significance] [-a] [-d] [-b] [-u] [-n] \
[-r] [-s] [-g] [-o] [--pvalues] [-v|-q] <graphs.gsp> [activities.tab]";

struct Arguments {
    config: MinerConfig,
    graphs: String,
    activities: Option<String>,
    verbosity: i8,
}

fn value<'a>(flag: &str, args: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, String> {
    args.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn parse_arguments(args: &[String]) -> Result<Arguments, String> {
    let mut config = MinerConfig::default();
    let mut files = Vec::new();
    let mut verbosity = 0;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-f" => {
                let text = value(arg, &mut iter)?;
                config.min_frequency = text
                    .parse()
                    .map_err(|_| format!("invalid minimum frequency '{text}'"))?;
            }
            "-l" => {
                let text = value(arg, &mut iter)?;
                config.kind = text
                    .parse()
                    .ok()
                    .and_then(PatternKind::from_level)
                    .ok_or_else(|| format!("invalid level '{text}', expected 1, 2 or 3"))?;
            }
            "-p" => {
                let text = value(arg, &mut iter)?;
                config.significance = text
                    .parse()
                    .map_err(|_| format!("invalid significance '{text}'"))?;
            }
            "-a" => config.aromatic = false,
            "-d" => {
                config.significance_filter = false;
                config.backbone = false;
                config.static_pruning = false;
                config.dynamic_upper_bound = false;
            }
            // the dynamic bound depends on both
            "-b" => {
                config.backbone = false;
                config.dynamic_upper_bound = false;
            }
            "-u" => config.dynamic_upper_bound = false,
            "-n" => {
                config.static_pruning = false;
                config.dynamic_upper_bound = false;
            }
            "-r" => config.regression = true,
            "-s" => config.refine_singles = true,
            "-g" => config.output_format = OutputFormat::Gsp,
            "-o" => config.bbrc_separator = true,
            "--pvalues" => config.p_values = true,
            "-v" => verbosity += 1,
            "-q" => verbosity -= 1,
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
            file => files.push(file.to_string()),
        }
    }
    let mut files = files.into_iter();
    let graphs = files.next().ok_or_else(|| USAGE.to_string())?;
    let activities = files.next();
    if files.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(Arguments {
        config,
        graphs,
        activities,
        verbosity,
    })
}

fn init_logging(verbosity: i8) {
    let level = match verbosity {
        i8::MIN..=-1 => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Writes every event to stdout as soon as it is reported.
struct LineSink<W: Write> {
    formatter: LineFormatter,
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> PatternSink for LineSink<W> {
    fn accept(&mut self, event: MiningEvent) {
        if self.error.is_some() {
            return;
        }
        let line = self.formatter.render(&event);
        if let Err(e) = writeln!(self.out, "{line}") {
            self.error = Some(e);
        }
    }
}

fn run(arguments: Arguments) -> Result<(), MinerError> {
    let formatter = LineFormatter::new(&arguments.config);
    let config = arguments.config.validate()?;
    let mut miner = Miner::new(config);
    miner.read_gsp(BufReader::new(File::open(&arguments.graphs)?))?;
    if let Some(path) = &arguments.activities {
        miner.read_activities(BufReader::new(File::open(path)?))?;
    }
    let stdout = io::stdout();
    let mut sink = LineSink {
        formatter,
        out: BufWriter::new(stdout.lock()),
        error: None,
    };
    miner.mine_all(&mut sink)?;
    miner.log_summary();
    if let Some(e) = sink.error.take() {
        return Err(e.into());
    }
    sink.out.flush()?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let arguments = match parse_arguments(&args) {
        Ok(arguments) => arguments,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };
    init_logging(arguments.verbosity);
    match run(arguments) {
        Ok(()) => {}
        Err(MinerError::Configuration(conflicts)) => {
            for conflict in conflicts {
                eprintln!("{conflict}");
            }
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
