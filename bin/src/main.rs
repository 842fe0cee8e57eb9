use std::io::Read as _;
use std::time::Duration;

use anyhow::Context;
use automata::{codec, Dfa};
use automata_oracle::{DfaOracle, OracleServer, ServerConfig};
use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, Level};

fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .help("file holding the serialized target automaton, stdin when omitted")
}

fn read_target(matches: &ArgMatches) -> anyhow::Result<Dfa> {
    let bytes = match matches.get_one::<String>("input") {
        None => {
            debug!("No input file specified, using stdin");
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("could not read the target automaton from stdin")?;
            bytes
        }
        Some(file_name) => {
            debug!("Input file name specified: {:?}", file_name);
            std::fs::read(file_name)
                .with_context(|| format!("could not read target automaton from {file_name}"))?
        }
    };
    codec::decode(&bytes).context("could not decode the target automaton")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command!()
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .conflicts_with("debug"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Turn on debugging information")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .subcommand(
            Command::new("serve")
                .about("Answer membership and equivalence queries over TCP")
                .arg(input_arg())
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .default_value("8000")
                        .help("port to listen on"),
                )
                .arg(
                    Arg::new("buffer-size")
                        .long("buffer-size")
                        .value_parser(value_parser!(usize))
                        .default_value("8192")
                        .help("per-connection read buffer size in bytes"),
                )
                .arg(
                    Arg::new("visit-bound")
                        .long("visit-bound")
                        .value_parser(value_parser!(usize))
                        .default_value("2")
                        .help("how often the counterexample search expands a revisited state"),
                )
                .arg(
                    Arg::new("read-timeout")
                        .long("read-timeout")
                        .value_parser(value_parser!(u64))
                        .help("seconds to wait for a request before closing a connection"),
                ),
        )
        .subcommand(
            Command::new("member")
                .about("Evaluate a single word against the target automaton")
                .arg(input_arg())
                .arg(Arg::new("word").required(true).help("the word to evaluate")),
        )
        .subcommand(
            Command::new("dot")
                .about("Write the target automaton in graphviz format")
                .arg(input_arg())
                .arg(Arg::new("output").short('o').long("output")),
        )
        .subcommand_required(true)
        .get_matches();

    let level = if matches.get_flag("verbose") {
        Level::TRACE
    } else if matches.get_flag("debug") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match matches.subcommand() {
        Some(("serve", serve_matches)) => {
            let target = read_target(serve_matches)?;
            let visit_bound = *serve_matches
                .get_one::<usize>("visit-bound")
                .expect("has a default value");
            let config = ServerConfig {
                port: *serve_matches
                    .get_one::<u16>("port")
                    .expect("has a default value"),
                read_buffer_size: *serve_matches
                    .get_one::<usize>("buffer-size")
                    .expect("has a default value"),
                read_timeout: serve_matches
                    .get_one::<u64>("read-timeout")
                    .map(|&seconds| Duration::from_secs(seconds)),
            };

            let oracle = DfaOracle::with_visit_bound(target, visit_bound);
            let server = OracleServer::bind(oracle, config)
                .await
                .context("could not start the oracle server")?;
            server.run().await;
        }
        Some(("member", member_matches)) => {
            let target = read_target(member_matches)?;
            let input = member_matches
                .get_one::<String>("word")
                .expect("word is required");
            let word = target
                .alphabet()
                .parse_word(input)
                .context("the word is not over the target's alphabet")?;
            println!("{}", target.accepts(&word));
        }
        Some(("dot", dot_matches)) => {
            let target = read_target(dot_matches)?;
            let rendered = target.dot_representation();
            match dot_matches.get_one::<String>("output") {
                None => {
                    debug!("No output file specified, using stdout");
                    print!("{rendered}");
                }
                Some(file_name) => {
                    debug!("Output file name specified: {:?}", file_name);
                    std::fs::write(file_name, rendered)
                        .with_context(|| format!("could not write {file_name}"))?;
                }
            }
        }
        _ => unreachable!(),
    };
    Ok(())
}
