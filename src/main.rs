//! molseq - normalize trajectory inputs into one stream of frames

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};

use molseq::error::TrajError;
use molseq::frame_iter::FrameIterOptions;
use molseq::input_spec::{InputSpec, Source};
use molseq::iterframe::{iterframe_master, TrajInput};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Inputs, read in order: PATH, PATH@FRAME or PATH[START:STOP].
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<String>,
    /// Topology file; its first frame names the atoms of every input.
    #[arg(long, env = "MOLSEQ_TOP", value_name = "PATH")]
    top: Option<PathBuf>,
    /// Atom mask applied to every input (e.g. '@CA' or ':1-10').
    #[arg(long)]
    mask: Option<String>,
    /// Read lazy inputs in chunks of this many frames.
    #[arg(long, value_name = "N")]
    chunk: Option<usize>,
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: &Args) -> Result<usize, TrajError> {
    let sources = args
        .inputs
        .iter()
        .map(|input| InputSpec::parse(input)?.open(args.top.as_deref()))
        .collect::<Result<Vec<Source>, _>>()?;

    let mut options = FrameIterOptions::default();
    options.mask = args.mask.clone();
    let inputs = sources
        .iter()
        .map(|source| source.frames(&options, args.chunk))
        .collect::<Result<Vec<TrajInput>, _>>()?;

    let mut n_frames = 0;
    for frame in iterframe_master(inputs) {
        let frame = frame?;
        println!("{n_frames}\t{}", frame.size());
        n_frames += 1;
    }
    Ok(n_frames)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(n_frames) => {
            info!("read {n_frames} frames from {} inputs", args.inputs.len());
            println!("total\t{n_frames}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
