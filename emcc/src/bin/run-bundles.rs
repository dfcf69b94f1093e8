//! Runs the bundled Sibeyn/Meyer engine on a binary edge file.
//!
//! Node IDs are split into equal-width bundles sized so each bundle's
//! union-find fits the memory budget; the variant trades bundle buffers
//! against bundle width.

use std::io;
use std::path::PathBuf;
use std::process;

use getopts::Options;

use emcc::bundles::SibeynWithBundles;
use emcc::io::{max_node_id, parse_byte_size, read_edges, write_components};
use emcc::kruskal::bounded;
use emcc::EdgeStream;
use emcc_logging::StageLogger;
use emcc_storage::{Limits, Streamer};

const NODE_BYTES: u64 = 8;

fn usage(options: &Options) -> ! {
    let brief = "Usage: run-bundles [options] <input> <memory>\n\n\
                 Compute connected components with per-bundle Kruskal runs\n\
                 within the given internal memory budget (e.g. 4Gi).";
    eprint!("{}", options.usage(brief));
    process::exit(2);
}

fn main() {
    let mut options = Options::new();
    options.optopt("i", "max-id", "maximum node ID (scanned if omitted)", "N");
    options.optopt(
        "v",
        "variant",
        "0 = most bundles (default) .. 3 = fewest bundles",
        "V",
    );
    options.optflag("m", "minimize", "minimize interbundle signals");
    options.optopt("o", "output", "write (node, rep) pairs here", "PATH");
    options.optflag("h", "help", "print this help");

    let arguments: Vec<String> = std::env::args().skip(1).collect();
    let matches = match options.parse(&arguments) {
        Ok(matches) => matches,
        Err(error) => {
            eprintln!("run-bundles: {}", error);
            usage(&options);
        }
    };
    if matches.opt_present("h") || matches.free.len() != 2 {
        usage(&options);
    }
    let input = PathBuf::from(&matches.free[0]);
    let memory_bytes = match parse_byte_size(&matches.free[1]) {
        Some(bytes) if bytes > 0 => bytes,
        _ => {
            eprintln!("run-bundles: bad memory budget {:?}", matches.free[1]);
            usage(&options);
        }
    };
    let variant: u8 = match matches.opt_str("variant").map(|v| v.parse()) {
        None => 0,
        Some(Ok(value)) if value <= 3 => value,
        _ => {
            eprintln!("run-bundles: variant must be 0..3");
            usage(&options);
        }
    };
    let max_id_option = matches.opt_str("max-id").map(|text| match text.parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("run-bundles: bad value for --max-id: {:?}", text);
            usage(&options);
        }
    });
    let minimize = matches.opt_present("minimize");
    let output = matches.opt_str("output").map(PathBuf::from);

    if let Err(error) = run(input, memory_bytes, max_id_option, variant, minimize, output) {
        eprintln!("run-bundles: {}", error);
        process::exit(1);
    }
}

fn run(
    input: PathBuf,
    memory_bytes: u64,
    max_id_option: Option<u64>,
    variant: u8,
    minimize: bool,
    output: Option<PathBuf>,
) -> io::Result<()> {
    let limits = Limits::default();
    let logger = StageLogger::stdout_csv();

    let mut edges = EdgeStream::new(&limits);
    let read_timer = logger.stage("read_graph", 0);
    let (num_edges, dropped) = read_edges(&input, &mut edges)?;
    edges.consume()?;
    read_timer.finish(num_edges);
    if dropped > 0 {
        eprintln!("dropped {} parallel edges", dropped);
    }

    let max_id = match max_id_option {
        Some(id) => id,
        None => max_node_id(&mut edges)?,
    };
    if max_id == 0 {
        eprintln!("run-bundles: empty graph");
        return Ok(());
    }

    // Fewest bundles: one bundle's union-find takes all of memory.
    // Most bundles: the bundle buffers together take half of it.
    let per_node = bounded::MEMORY_OVERHEAD_FACTOR * NODE_BYTES;
    let min_bundles = ((max_id * per_node) / memory_bytes).max(1);
    let max_bundles = ((memory_bytes / 2) / (2 * limits.block_bytes as u64)).max(min_bundles);
    let num_bundles = match variant {
        0 => max_bundles,
        1 => (min_bundles + 2 * max_bundles) / 3,
        2 => (2 * min_bundles + max_bundles) / 3,
        _ => min_bundles,
    };
    eprintln!(
        "bundles: {} (between {} and {})",
        num_bundles, min_bundles, max_bundles
    );

    let solve_timer = logger.stage("bundles", num_edges);
    let mut engine =
        SibeynWithBundles::new(&mut edges, max_id, num_bundles as usize, minimize, &limits)?;
    let labelled = match output {
        Some(ref path) => write_components(path, &mut engine)?,
        None => {
            let mut labelled = 0u64;
            while !engine.empty() {
                labelled += 1;
                engine.advance()?;
            }
            labelled
        }
    };
    solve_timer.finish(labelled);
    logger.flush();
    eprintln!("labelled {} nodes", labelled);
    Ok(())
}
