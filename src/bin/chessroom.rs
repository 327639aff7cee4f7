// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use std::io;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use chessroom::api::Api;
use chessroom::console::ConsoleServer;
use chessroom::{perft, Config, Coordinator, Position};
use clap::{App, Arg, ArgMatches, SubCommand};

fn main() {
    env_logger::init();
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .subcommand(
            SubCommand::with_name("serve")
                .about("Serve session requests over stdin and stdout (the default)")
                .arg(
                    Arg::with_name("config")
                        .help("JSON configuration file")
                        .value_name("FILE")
                        .short("-c")
                        .long("--config")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("perft")
                .about("PERFT analysis of board positions")
                .arg(
                    Arg::with_name("FEN")
                        .help("FEN string for a board position")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("depth")
                        .help("Depth of move tree to search")
                        .value_name("DEPTH")
                        .short("-d")
                        .long("--depth")
                        .default_value("4")
                        .takes_value(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("perft", Some(matches)) => run_perft(matches),
        ("serve", Some(matches)) => run_serve(matches.value_of("config")),
        _ => run_serve(None),
    }
}

fn run_serve(config_path: Option<&str>) -> ! {
    let config = match config_path {
        Some(path) => match Config::from_path(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}: {}", path, err);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    info!("starting console server with {:?}", config);
    let coordinator = Arc::new(Coordinator::new(config));
    let server = ConsoleServer::new(Api::new(coordinator));
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(err) = server.run(stdin.lock(), stdout.lock()) {
        eprintln!("console i/o failed: {}", err);
        process::exit(1);
    }

    process::exit(0);
}

fn run_perft(matches: &ArgMatches) -> ! {
    let fen = matches.value_of("FEN").unwrap();
    let depth = value_t_or_exit!(matches, "depth", u32);
    let pos = match Position::from_fen_checked(fen) {
        Ok(pos) => pos,
        Err(err) => {
            println!("invalid position: {}", err);
            process::exit(1);
        }
    };

    println!("fen:   {}", fen);
    println!("depth: {}", depth);
    println!();
    println!("{}", pos);
    println!();
    for i in 1..depth + 1 {
        let start = Instant::now();
        let results = perft(&pos, i);
        let duration = start.elapsed();
        println!("perft({}) = {} ({} ms)", i, results, duration.as_millis());
    }

    process::exit(0);
}

