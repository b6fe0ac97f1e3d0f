// Prints a dnstap capture as one line per DNS message.
// tapcat -f {file} [--id]

use clap::Parser;
use log::debug;
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use tapfmt::frames::{Reader, ReaderOptions, DEFAULT_MAX_FRAME_SIZE};
use tapfmt::{Options, Pipeline};

#[derive(Parser, Debug)]
#[clap(version, about = "Print dnstap captures as a DNS audit log")]
struct Args {
    /// Read dnstap data from file
    #[clap(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Include DNS ID in output
    #[clap(long)]
    id: bool,

    /// Reject data frames larger than this
    #[clap(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

fn run(args: &Args) -> tapfmt::Result<()> {
    let file = File::open(&args.file)?;
    debug!("reading {}", args.file.display());

    let frames = Reader::with_options(
        BufReader::new(file),
        ReaderOptions {
            max_frame_size: args.max_frame_size,
            ..Default::default()
        },
    )?;

    // Use buffered output to speed things up
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let options = Options { print_id: args.id };
    for line in Pipeline::new(frames, options) {
        out.write_all(line?.as_bytes())?;
    }

    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", args.file.display(), e);
        process::exit(1);
    }
}
