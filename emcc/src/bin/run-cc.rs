//! Runs the recursive connected-components engine on a binary edge file.
//!
//! The input must be sorted lexicographically, deduplicated and free of
//! self-loops. Stage timings are reported on standard output as
//! `operation,input_size,output_size,micros` lines.

use std::io;
use std::path::PathBuf;
use std::process;

use getopts::Options;

use emcc::contraction::ContractionKind;
use emcc::io::{count_distinct_nodes, parse_byte_size, read_edges, write_components};
use emcc::policy::{Policy, NUM_VARIANTS};
use emcc::{EdgeStream, SubproblemManager};
use emcc_logging::StageLogger;
use emcc_storage::{Limits, Streamer};

struct Config {
    input: PathBuf,
    memory_bytes: u64,
    num_nodes: Option<u64>,
    variant: u8,
    seed: u64,
    output: Option<PathBuf>,
    contraction: ContractionKind,
}

fn usage(options: &Options) -> ! {
    let brief = "Usage: run-cc [options] <input> <memory>\n\n\
                 Compute connected components of a sorted binary edge file\n\
                 within the given internal memory budget (e.g. 4Gi).";
    eprint!("{}", options.usage(brief));
    process::exit(2);
}

fn parse_config() -> Config {
    let mut options = Options::new();
    options.optopt("n", "nodes", "number of nodes (counted if omitted)", "N");
    options.optopt("v", "variant", "policy variant 0..9 (default 0)", "V");
    options.optopt("s", "seed", "random seed (default 0)", "SEED");
    options.optopt("o", "output", "write (node, rep) pairs here", "PATH");
    options.optopt(
        "c",
        "contraction",
        "contraction strategy: sibeyn (default), boruvka, star, kkt",
        "KIND",
    );
    options.optflag("h", "help", "print this help");

    let arguments: Vec<String> = std::env::args().skip(1).collect();
    let matches = match options.parse(&arguments) {
        Ok(matches) => matches,
        Err(error) => {
            eprintln!("run-cc: {}", error);
            usage(&options);
        }
    };
    if matches.opt_present("h") || matches.free.len() != 2 {
        usage(&options);
    }

    let memory_bytes = match parse_byte_size(&matches.free[1]) {
        Some(bytes) if bytes > 0 => bytes,
        _ => {
            eprintln!("run-cc: bad memory budget {:?}", matches.free[1]);
            usage(&options);
        }
    };
    let parse_u64 = |name: &str, options: &Options| -> Option<u64> {
        matches.opt_str(name).map(|text| match text.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("run-cc: bad value for --{}: {:?}", name, text);
                usage(options);
            }
        })
    };
    let variant = parse_u64("variant", &options).unwrap_or(0);
    if variant >= NUM_VARIANTS as u64 {
        eprintln!("run-cc: variant must be below {}", NUM_VARIANTS);
        usage(&options);
    }
    let contraction = match matches.opt_str("contraction").as_deref() {
        None | Some("sibeyn") => ContractionKind::Sibeyn,
        Some("boruvka") => ContractionKind::Boruvka,
        Some("star") => ContractionKind::Star,
        Some("kkt") => ContractionKind::Kkt,
        Some(other) => {
            eprintln!("run-cc: unknown contraction strategy {:?}", other);
            usage(&options);
        }
    };

    Config {
        input: PathBuf::from(&matches.free[0]),
        memory_bytes,
        num_nodes: parse_u64("nodes", &options),
        variant: variant as u8,
        seed: parse_u64("seed", &options).unwrap_or(0),
        output: matches.opt_str("output").map(PathBuf::from),
        contraction,
    }
}

fn run(config: Config) -> io::Result<()> {
    let limits = Limits::default();
    let logger = StageLogger::stdout_csv();

    let mut edges = EdgeStream::new(&limits);
    let read_timer = logger.stage("read_graph", 0);
    let (num_edges, dropped) = read_edges(&config.input, &mut edges)?;
    edges.consume()?;
    read_timer.finish(num_edges);
    if dropped > 0 {
        eprintln!("dropped {} parallel edges", dropped);
    }

    let num_nodes = match config.num_nodes {
        Some(nodes) => nodes,
        None => {
            let count_timer = logger.stage("count", num_edges);
            let nodes = count_distinct_nodes(&mut edges, &limits)?;
            count_timer.finish(nodes);
            nodes
        }
    };
    eprintln!("graph has {} nodes and {} edges", num_nodes, num_edges);

    let mut manager = SubproblemManager::new(
        config.memory_bytes,
        Policy::variant(config.variant),
        config.contraction,
        config.seed,
        &limits,
        logger.clone(),
    );
    let mut components = manager.run(&mut edges, num_nodes)?;

    let labelled = match config.output {
        Some(ref path) => write_components(path, &mut components)?,
        None => {
            let mut labelled = 0u64;
            while !components.empty() {
                labelled += 1;
                components.advance()?;
            }
            labelled
        }
    };
    logger.flush();
    eprintln!("labelled {} nodes", labelled);
    Ok(())
}

fn main() {
    let config = parse_config();
    if let Err(error) = run(config) {
        eprintln!("run-cc: {}", error);
        process::exit(1);
    }
}
