use clap::{Parser, Subcommand};
use env_editor::editor::EnvEditor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
  name = "env-editor",
  about = "Get, set, update, remove and back up KEY=value pairs in .env files",
  version,
  author
)]
struct Cli {
  /// Path to the .env file
  #[arg(short, long, default_value = ".env")]
  file: PathBuf,

  /// Verbose output (-v for verbose, -vv for very verbose)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the value of a key
  Get {
    key: String,
    /// Value to print when the key is absent
    #[arg(short, long)]
    default: Option<String>,
  },
  /// Set a key, updating it in place when it already exists
  Set { key: String, value: String },
  /// Update an existing key; fails when the key is absent
  Update { key: String, value: String },
  /// Remove a key and its line
  Unset { key: String },
  /// Print every KEY=value entry
  List,
  /// Copy the file into the backup directory
  Backup {
    /// Backup filename; defaults to a timestamp
    name: Option<String>,
  },
  /// Overwrite the file with a named backup
  Restore { name: String },
  /// List backup filenames
  Backups,
}

fn setup_tracing(verbose: u8) {
  use tracing_subscriber::fmt;
  use tracing_subscriber::prelude::*;

  let log_level = match verbose {
    1 => "debug",
    2 => "trace",
    _ => "info",
  };

  tracing_subscriber::registry()
    .with(fmt::layer())
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
    ))
    .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_tracing(cli.verbose);

  let editor = EnvEditor::new(cli.file);

  match cli.command {
    Command::Get { key, default } => match editor.get(&key)? {
      Some(value) => println!("{}", value),
      None => match default {
        Some(default) => println!("{}", default),
        None => return Err(format!("key '{}' is not set", key).into()),
      },
    },
    Command::Set { key, value } => editor.set(&key, value)?,
    Command::Update { key, value } => editor.update(&key, value)?,
    Command::Unset { key } => editor.remove(&key)?,
    Command::List => {
      for (key, value) in editor.get_all()? {
        println!("{}={}", key, value);
      }
    }
    Command::Backup { name } => {
      let path = editor.backup(name.as_deref())?;
      println!("{}", path.display());
    }
    Command::Restore { name } => editor.restore(&name)?,
    Command::Backups => {
      for name in editor.list_backups()? {
        println!("{}", name);
      }
    }
  }

  Ok(())
}
