//! lindaspace CLI Client
//!
//! Command-line interface for interacting with a lindaspace server.
//!
//! Elements are typed literals: `STRING:Hello`, `INT64:35`, `FLOAT64:3.14`,
//! and `?` for a wildcard inside a pattern.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use lindaspace::network::Client;
use lindaspace::tuple::text::{parse_pattern, parse_tuple};
use lindaspace::{Result, SpaceError};

/// lindaspace CLI
#[derive(Parser, Debug)]
#[command(name = "lindaspace-cli")]
#[command(about = "CLI for the lindaspace tuple space")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a tuple
    Out {
        /// Typed literals, e.g. STRING:foo INT64:42
        #[arg(required = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },

    /// Read a matching tuple (blocks until one exists)
    Rd {
        /// Typed literals or ? for wildcards
        #[arg(required = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },

    /// Take a matching tuple (blocks until one exists)
    In {
        /// Typed literals or ? for wildcards
        #[arg(required = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },

    /// Ping the server
    Ping,

    /// Interactive prompt: `out ...`, `rd ...`, `in ...` per line
    Repl,
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Unable to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Out { fields } => run_line(&mut client, "out", &fields[..]),
        Commands::Rd { fields } => run_line(&mut client, "rd", &fields[..]),
        Commands::In { fields } => run_line(&mut client, "in", &fields[..]),
        Commands::Ping => client.ping().map(|_| "PONG".to_string()),
        Commands::Repl => repl(&mut client).map(|_| String::new()),
    };

    match outcome {
        Ok(line) if line.is_empty() => {}
        Ok(line) => println!("{}", line),
        Err(e) => {
            println!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Execute one `out|rd|in` request and render the reply
fn run_line<S: AsRef<str>>(client: &mut Client, cmd: &str, fields: &[S]) -> Result<String> {
    match cmd {
        "out" => {
            client.out(&parse_tuple(fields)?)?;
            Ok("OK".to_string())
        }
        "rd" => Ok(format!("Result: {}", client.rd(&parse_pattern(fields)?)?)),
        "in" => Ok(format!("Result: {}", client.in_(&parse_pattern(fields)?)?)),
        other => Err(SpaceError::Validation(format!(
            "unknown command '{}'",
            other
        ))),
    }
}

fn repl(client: &mut Client) -> Result<()> {
    println!("Linda Client. Commands: out ..., rd ..., in ...");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd, fields)) = words.split_first() else {
            continue;
        };

        match run_line(client, cmd, fields) {
            Ok(reply) => println!("{}", reply),
            // Bad input and server-side rejections keep the session going
            Err(e @ (SpaceError::Validation(_) | SpaceError::Remote(_))) => {
                println!("Error: {}", e)
            }
            Err(e) => return Err(e),
        }
    }
}
