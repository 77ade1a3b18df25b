//! logkv CLI Client
//!
//! Command-line interface for interacting with a logkv server.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use logkv::protocol::{read_response, write_command, Command, Status};

/// logkv CLI
#[derive(Parser, Debug)]
#[command(name = "logkv-cli")]
#[command(about = "CLI for the logkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Merge all sealed datafiles
    Compact,

    /// Ping the server
    Ping,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let command = match args.command {
        Commands::Get { key } => Command::Get { key },
        Commands::Set { key, value } => Command::Set { key, value },
        Commands::Compact => Command::Compact,
        Commands::Ping => Command::Ping,
    };

    match run(&args.server, &command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(server: &str, command: &Command) -> logkv::Result<ExitCode> {
    let stream = TcpStream::connect(server)?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_command(&mut writer, command)?;
    let response = read_response(&mut reader)?;

    match response.status {
        Status::Ok => {
            println!("{}", response.payload.as_deref().unwrap_or("OK"));
            Ok(ExitCode::SUCCESS)
        }
        Status::NotFound => {
            println!("(nil)");
            Ok(ExitCode::from(1))
        }
        Status::Error => {
            eprintln!("server error: {}", response.payload.unwrap_or_default());
            Ok(ExitCode::from(2))
        }
    }
}
