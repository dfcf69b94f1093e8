//! Converts edge files between the ASCII and binary formats.

use std::path::PathBuf;
use std::process;

use getopts::Options;

use emcc::io::{ascii_to_binary, binary_to_ascii};

fn usage(options: &Options) -> ! {
    let brief = "Usage: edge-file [options] <to-binary|to-ascii> <input> <output>\n\n\
                 to-binary reads whitespace-separated ID pairs; to-ascii\n\
                 renders a binary edge or star file as one pair per line.";
    eprint!("{}", options.usage(brief));
    process::exit(2);
}

fn main() {
    let mut options = Options::new();
    options.optopt("k", "skip", "skip this many leading lines (to-binary)", "N");
    options.optopt("a", "add", "increase every ID by this amount", "N");
    options.optopt("s", "subtract", "decrease every ID by this amount", "N");
    options.optflag("h", "help", "print this help");

    let arguments: Vec<String> = std::env::args().skip(1).collect();
    let matches = match options.parse(&arguments) {
        Ok(matches) => matches,
        Err(error) => {
            eprintln!("edge-file: {}", error);
            usage(&options);
        }
    };
    if matches.opt_present("h") || matches.free.len() != 3 {
        usage(&options);
    }
    let number = |name: &str| -> u64 {
        match matches.opt_str(name).map(|text| text.parse()) {
            None => 0,
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                eprintln!("edge-file: bad value for --{}", name);
                usage(&options);
            }
        }
    };
    let input = PathBuf::from(&matches.free[1]);
    let output = PathBuf::from(&matches.free[2]);

    let result = match matches.free[0].as_str() {
        "to-binary" => ascii_to_binary(
            &input,
            &output,
            number("skip"),
            number("add"),
            number("subtract"),
        ),
        "to-ascii" => binary_to_ascii(&input, &output),
        other => {
            eprintln!("edge-file: unknown mode {:?}", other);
            usage(&options);
        }
    };
    match result {
        Ok(pairs) => eprintln!("wrote {} pairs", pairs),
        Err(error) => {
            eprintln!("edge-file: {}", error);
            process::exit(1);
        }
    }
}
