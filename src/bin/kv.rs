#[macro_use]
extern crate clap;
#[macro_use]
extern crate slog;

use clap::{AppSettings, Arg};
use slog::Drain;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

use kv::{Config, Outcome, Result, Session, Store, Verbosity, DATABASE_ENV, DEFAULT_DATABASE};

fn main() {
    let matches = app_from_crate!()
        .setting(AppSettings::AllowLeadingHyphen)
        .setting(AppSettings::TrailingVarArg)
        .arg(
            Arg::with_name("db")
                .long("db")
                .value_name("PATH")
                .help("The database file to load and save")
                .takes_value(true)
                .env(DATABASE_ENV)
                .default_value(DEFAULT_DATABASE),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more to stderr (repeat for more detail)"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .conflicts_with("verbose")
                .help("Only log critical errors"),
        )
        .arg(
            Arg::with_name("COMMAND")
                .multiple(true)
                .help("Commands to run in order: a | c | g,<key> | d,<key> | p,<key>,<value>"),
        )
        .get_matches();

    let config = Config {
        database: matches
            .value_of_os("db")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
        verbosity: Verbosity::from_flags(
            matches.is_present("quiet"),
            matches.occurrences_of("verbose"),
        ),
    };
    let commands = matches.values_of_lossy("COMMAND").unwrap_or_default();

    let root = logger(config.verbosity);
    let result = run(&root, &config, &commands);
    if let Err(ref err) = result {
        info!(root, "Fatal error"; "error" => %err);
    }

    // Dropping the last logger flushes the async drain.
    drop(root);

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(root: &slog::Logger, config: &Config, commands: &[String]) -> Result<()> {
    if commands.is_empty() {
        return Ok(());
    }

    let log = root.new(o!("database" => config.database.display().to_string()));
    info!(log, "Starting"; "version" => crate_version!(), "commands" => commands.len());

    let mut store = Store::open(&config.database, &log)?;

    let stdout = io::stdout();
    let mut session = Session::new(log.clone(), &mut store, BufWriter::new(stdout.lock()));
    for raw in commands {
        if let Outcome::Rejected(_) = session.run_arg(raw)? {
            eprintln!("bad command '{}'", raw);
        }
    }
    session.flush()?;
    info!(log, "Processed commands"; "rejected" => session.rejected());
    drop(session);

    store.persist(&config.database, &log)
}

fn logger(verbosity: Verbosity) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, verbosity.level()).fuse();
    slog::Logger::root(drain, o!())
}
