//! Generates canonical binary edge files for benchmarking and testing.
//!
//! All generators emit sorted, deduplicated, loop-free edge lists with
//! one-based node IDs, ready for the engines.

use std::io;
use std::path::PathBuf;
use std::process;

use getopts::Options;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use emcc::graph::{Edge, EdgeLex};
use emcc::io::EdgeFileWriter;
use emcc_storage::{ExternalSorter, Limits, Streamer};

fn usage(options: &Options) -> ! {
    let brief = "Usage: gen-graph [options] <kind> <output>\n\n\
                 Kinds: path, grid, clique, matching, random.";
    eprint!("{}", options.usage(brief));
    process::exit(2);
}

fn main() {
    let mut options = Options::new();
    options.optopt("n", "nodes", "number of nodes (path, clique, matching)", "N");
    options.optopt("r", "rows", "grid rows", "R");
    options.optopt("c", "cols", "grid columns", "C");
    options.optopt("e", "edges", "edge count (random)", "M");
    options.optopt("s", "seed", "random seed (default 0)", "SEED");
    options.optflag("h", "help", "print this help");

    let arguments: Vec<String> = std::env::args().skip(1).collect();
    let matches = match options.parse(&arguments) {
        Ok(matches) => matches,
        Err(error) => {
            eprintln!("gen-graph: {}", error);
            usage(&options);
        }
    };
    if matches.opt_present("h") || matches.free.len() != 2 {
        usage(&options);
    }
    let kind = matches.free[0].clone();
    let output = PathBuf::from(&matches.free[1]);
    let number = |name: &str| -> u64 {
        match matches.opt_str(name).map(|text| text.parse()) {
            None => 0,
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                eprintln!("gen-graph: bad value for --{}", name);
                usage(&options);
            }
        }
    };

    let result = match kind.as_str() {
        "path" => gen_path(&output, required(number("nodes"), "--nodes", &options)),
        "grid" => gen_grid(
            &output,
            required(number("rows"), "--rows", &options),
            required(number("cols"), "--cols", &options),
        ),
        "clique" => gen_clique(&output, required(number("nodes"), "--nodes", &options)),
        "matching" => gen_matching(&output, required(number("nodes"), "--nodes", &options)),
        "random" => gen_random(
            &output,
            required(number("nodes"), "--nodes", &options),
            required(number("edges"), "--edges", &options),
            number("seed"),
        ),
        other => {
            eprintln!("gen-graph: unknown kind {:?}", other);
            usage(&options);
        }
    };
    match result {
        Ok(edges) => eprintln!("wrote {} edges", edges),
        Err(error) => {
            eprintln!("gen-graph: {}", error);
            process::exit(1);
        }
    }
}

fn required(value: u64, name: &str, options: &Options) -> u64 {
    if value == 0 {
        eprintln!("gen-graph: {} is required and must be positive", name);
        usage(options);
    }
    value
}

fn gen_path(output: &std::path::Path, nodes: u64) -> io::Result<u64> {
    let mut writer = EdgeFileWriter::create(output)?;
    for u in 1..nodes {
        writer.push(u, u + 1)?;
    }
    writer.finish()
}

fn gen_grid(output: &std::path::Path, rows: u64, cols: u64) -> io::Result<u64> {
    let mut writer = EdgeFileWriter::create(output)?;
    for row in 0..rows {
        for col in 0..cols {
            let u = row * cols + col + 1;
            if col + 1 < cols {
                writer.push(u, u + 1)?;
            }
            if row + 1 < rows {
                writer.push(u, u + cols)?;
            }
        }
    }
    writer.finish()
}

fn gen_clique(output: &std::path::Path, nodes: u64) -> io::Result<u64> {
    let mut writer = EdgeFileWriter::create(output)?;
    for u in 1..=nodes {
        for v in (u + 1)..=nodes {
            writer.push(u, v)?;
        }
    }
    writer.finish()
}

fn gen_matching(output: &std::path::Path, nodes: u64) -> io::Result<u64> {
    let mut writer = EdgeFileWriter::create(output)?;
    for pair in 0..nodes / 2 {
        writer.push(2 * pair + 1, 2 * pair + 2)?;
    }
    writer.finish()
}

/// Erdős–Rényi style: `edges` uniform pairs, normalized, deduplicated and
/// sorted through an external sorter; the written count may fall slightly
/// short of the request.
fn gen_random(output: &std::path::Path, nodes: u64, edges: u64, seed: u64) -> io::Result<u64> {
    assert!(nodes >= 2);
    let limits = Limits::default();
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut sorter = ExternalSorter::<Edge, EdgeLex>::new(&limits);
    let mut pushed = 0u64;
    while pushed < edges {
        let u = rng.gen_range(1..=nodes);
        let v = rng.gen_range(1..=nodes);
        if u == v {
            continue;
        }
        sorter.push(Edge::new(u, v).normalized())?;
        pushed += 1;
    }
    sorter.sort()?;

    let mut writer = EdgeFileWriter::create(output)?;
    let mut previous = Edge::new(0, 0);
    let mut written = 0u64;
    while !Streamer::empty(&sorter) {
        let edge = sorter.peek();
        if written == 0 || edge != previous {
            writer.push(edge.u, edge.v)?;
            written += 1;
            previous = edge;
        }
        sorter.advance()?;
    }
    writer.finish()
}
