//! TyrantKV CLI Client
//!
//! Command-line interface for every store operation.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use tyrantkv::{Config, ExtOptions, Handle, MiscOptions, PutMode, RestoreOptions, TuneOptions};

/// TyrantKV CLI
#[derive(Parser, Debug)]
#[command(name = "tyrantkv-cli")]
#[command(about = "CLI for Tokyo Tyrant compatible key-value servers")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = tyrantkv::config::DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = tyrantkv::config::DEFAULT_PORT)]
    port: u16,

    /// Socket timeout in seconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout: f64,

    /// Reconnect and retry once after a transport failure
    #[arg(long)]
    reconnect: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Overwrite,
    Keep,
    Cat,
    Shl,
    Nr,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get { key: String },

    /// Get several values at once
    Mget { keys: Vec<String> },

    /// Store a key-value pair
    Put {
        key: String,
        value: String,

        #[arg(short, long, value_enum, default_value = "overwrite")]
        mode: Mode,

        /// Width for shift-left mode
        #[arg(short, long, default_value = "0")]
        width: u32,
    },

    /// Store several `key=value` pairs at once
    Mput { pairs: Vec<String> },

    /// Delete a key
    Out { key: String },

    /// Delete several keys at once
    Mout { keys: Vec<String> },

    /// Size of a stored value
    Vsize { key: String },

    /// Add to a numeric record
    Addnum { key: String, delta: f64 },

    /// List keys with a prefix
    Fwmkeys {
        prefix: String,

        #[arg(short, long)]
        max: Option<usize>,
    },

    /// List every key
    Keys,

    /// Call a server-side extension
    Ext {
        name: String,
        key: String,
        value: String,

        /// Lock the record while the extension runs
        #[arg(long)]
        lock_record: bool,

        /// Lock the whole database while the extension runs
        #[arg(long)]
        lock_global: bool,
    },

    /// Flush the database to its device
    Sync,

    /// Optimize the database
    Optimize { params: Option<String> },

    /// Remove every record
    Vanish,

    /// Copy the database file on the server
    Copy { path: String },

    /// Restore from an update log
    Restore {
        path: String,
        timestamp: u64,

        #[arg(long)]
        check_consistency: bool,
    },

    /// Set the replication master (omit host to clear)
    Setmaster {
        #[arg(long)]
        host: Option<String>,

        #[arg(long, default_value = "0")]
        port: u16,

        #[arg(long, default_value = "0")]
        timestamp: u64,
    },

    /// Number of records
    Rnum,

    /// Database size in bytes
    Size,

    /// Server status
    Stat,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {} (code {})", e.message(), e.code().as_i32());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> tyrantkv::Result<()> {
    let config = Config::builder().host(&args.host).port(args.port).build();
    let mut db = Handle::open_with(config)?;

    let options = if args.reconnect {
        TuneOptions::RECONNECT
    } else {
        TuneOptions::NONE
    };
    db.tune(options, args.timeout)?;

    match args.command {
        Commands::Get { key } => match db.get(key.as_str())? {
            Some(value) => print_bytes(&value),
            None => println!("(nil)"),
        },
        Commands::Mget { keys } => {
            let found = db.get_list(&keys, MiscOptions::NONE)?;
            for key in &keys {
                if let Some(value) = found.get(key.as_bytes()) {
                    println!("{}\t{}", key, String::from_utf8_lossy(value));
                }
            }
        }
        Commands::Put {
            key,
            value,
            mode,
            width,
        } => {
            let mode = match mode {
                Mode::Overwrite => PutMode::Overwrite,
                Mode::Keep => PutMode::Keep,
                Mode::Cat => PutMode::Concat,
                Mode::Shl => PutMode::ConcatShiftLeft { width },
                Mode::Nr => PutMode::NoReply,
            };
            let stored = db.put_with(key.as_str(), value.as_str(), mode)?;
            println!("{}", if stored { "OK" } else { "KEPT" });
        }
        Commands::Mput { pairs } => {
            let entries = pairs
                .iter()
                .map(|pair| {
                    pair.split_once('=').ok_or_else(|| {
                        tyrantkv::TyrantError::InvalidArgument(format!(
                            "expected key=value, got {}",
                            pair
                        ))
                    })
                })
                .collect::<tyrantkv::Result<Vec<_>>>()?;
            db.put_list(entries, MiscOptions::NONE)?;
            println!("OK");
        }
        Commands::Out { key } => {
            db.out(key.as_str())?;
            println!("OK");
        }
        Commands::Mout { keys } => {
            db.out_list(&keys, MiscOptions::NONE)?;
            println!("OK");
        }
        Commands::Vsize { key } => match db.vsize(key.as_str())? {
            Some(size) => println!("{}", size),
            None => println!("(nil)"),
        },
        Commands::Addnum { key, delta } => {
            println!("{}", tyrantkv::wire::format_number(db.add_num(key.as_str(), delta)?));
        }
        Commands::Fwmkeys { prefix, max } => {
            for key in db.fwmkeys(prefix.as_str(), max)? {
                print_bytes(&key);
            }
        }
        Commands::Keys => {
            for key in db.keys()? {
                print_bytes(&key?);
            }
        }
        Commands::Ext {
            name,
            key,
            value,
            lock_record,
            lock_global,
        } => {
            let mut options = ExtOptions::NONE;
            if lock_record {
                options |= ExtOptions::LOCK_RECORD;
            }
            if lock_global {
                options |= ExtOptions::LOCK_GLOBAL;
            }
            let result = db.ext(&name, key.as_str(), value.as_str(), options)?;
            print_bytes(&result);
        }
        Commands::Sync => db.sync()?,
        Commands::Optimize { params } => db.optimize(params.as_deref())?,
        Commands::Vanish => db.vanish()?,
        Commands::Copy { path } => db.copy(&path)?,
        Commands::Restore {
            path,
            timestamp,
            check_consistency,
        } => {
            let options = if check_consistency {
                RestoreOptions::CONSISTENCY_CHECK
            } else {
                RestoreOptions::NONE
            };
            db.restore(&path, timestamp, options)?;
        }
        Commands::Setmaster {
            host,
            port,
            timestamp,
        } => db.set_master(host.as_deref(), port, timestamp, RestoreOptions::NONE)?,
        Commands::Rnum => println!("{}", db.rnum()?),
        Commands::Size => println!("{}", db.size()?),
        Commands::Stat => print!("{}", db.stat()?),
    }

    db.close()
}

fn print_bytes(bytes: &[u8]) {
    println!("{}", String::from_utf8_lossy(bytes));
}
