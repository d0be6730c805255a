//! CLI argument definitions for `tricut`.

use clap::{value_parser, Arg, ArgAction, Command};

fn settings_arg() -> Arg {
    Arg::new("settings")
        .long("settings")
        .short('s')
        .value_name("PATH")
        .help("Path to a JSON file containing ChainSettings")
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("tricut")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Three-band parametric EQ: render, inspect and benchmark")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .subcommand(
            Command::new("render")
                .about("Filter a WAV file and write a 32-bit float WAV")
                .arg(
                    Arg::new("INPUT")
                        .help("The input WAV path")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("OUTPUT")
                        .help("The output WAV path")
                        .required(true)
                        .index(2),
                )
                .arg(settings_arg())
                .arg(
                    Arg::new("block-size")
                        .long("block-size")
                        .short('b')
                        .value_name("FRAMES")
                        .default_value("512")
                        .value_parser(value_parser!(usize))
                        .help("Frames per processing block"),
                ),
        )
        .subcommand(
            Command::new("response")
                .about("Print the magnitude response as JSON")
                .arg(settings_arg())
                .arg(
                    Arg::new("sample-rate")
                        .long("sample-rate")
                        .short('r')
                        .value_name("HZ")
                        .default_value("48000")
                        .value_parser(value_parser!(f64))
                        .help("Sample rate the filters are designed for"),
                )
                .arg(
                    Arg::new("points")
                        .long("points")
                        .short('n')
                        .value_name("COUNT")
                        .default_value("200")
                        .value_parser(value_parser!(usize))
                        .help("Number of log-spaced points between 20 Hz and 20 kHz"),
                ),
        )
        .subcommand(
            Command::new("analyze")
                .about("Run the spectrum analyzer over a WAV file and print peaks as JSON")
                .arg(
                    Arg::new("INPUT")
                        .help("The input WAV path")
                        .required(true)
                        .index(1),
                )
                .arg(settings_arg().help("Filter through the EQ with these settings first"))
                .arg(
                    Arg::new("fft-size")
                        .long("fft-size")
                        .value_name("SIZE")
                        .default_value("2048")
                        .value_parser(value_parser!(usize))
                        .help("FFT size (power of two, 512 to 16384)"),
                ),
        )
        .subcommand(
            Command::new("bench")
                .about("Run a synthetic processing benchmark")
                .arg(
                    Arg::new("block-size")
                        .long("block-size")
                        .short('b')
                        .value_name("FRAMES")
                        .default_value("512")
                        .value_parser(value_parser!(usize))
                        .help("Frames per processing block"),
                )
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .value_name("SECONDS")
                        .default_value("1.0")
                        .value_parser(value_parser!(f32))
                        .help("Input length in seconds"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .value_name("COUNT")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Number of timed runs"),
                )
                .arg(
                    Arg::new("sweep")
                        .long("sweep")
                        .action(ArgAction::SetTrue)
                        .help("Sweep a fixed list of block sizes instead"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json").about("Print default ChainSettings JSON"),
                )
                .subcommand(
                    Command::new("analyzer-json").about("Print default AnalyzerConfig JSON"),
                ),
        )
}
