// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::{
    commands::{self, run::RunArgs},
    infra::config::{DEFAULT_CONFIG_FILE, parse_define},
    infra::t,
};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    let pos = args.iter().position(|arg| arg == "--lang")?;
    args.get(pos + 1).cloned()
}

fn pre_parse_verbose() -> bool {
    env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn build_cli(locale: &str) -> Command {
    Command::new("itom")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run_about", locale = locale).to_string())
                .arg(project_dir_arg(locale))
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("cli.arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help(t!("cli.arg_category", locale = locale).to_string())
                        .value_name("CATEGORY")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("suite")
                        .long("suite")
                        .help(t!("cli.arg_suite", locale = locale).to_string())
                        .value_name("SUITE")
                        .action(ArgAction::Set)
                        .requires("category"),
                )
                .arg(
                    Arg::new("skip-first")
                        .long("skip-first")
                        .help(t!("cli.arg_skip_first", locale = locale).to_string())
                        .value_name("COUNT")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set)
                        .requires("suite"),
                )
                .arg(
                    Arg::new("define")
                        .short('D')
                        .long("define")
                        .help(t!("cli.arg_define", locale = locale).to_string())
                        .value_name("NAME=VALUE")
                        .value_parser(parse_define)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about", locale = locale).to_string())
                .arg(project_dir_arg(locale))
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help(t!("cli.arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn project_dir_arg(locale: &str) -> Arg {
    Arg::new("project-dir")
        .long("project-dir")
        .help(t!("cli.arg_project_dir", locale = locale).to_string())
        .value_name("PROJECT_DIR")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn project_dir(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("project-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run_args(matches: &ArgMatches) -> RunArgs {
    RunArgs {
        project_dir: project_dir(matches),
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        category: matches.get_one::<String>("category").cloned(),
        suite: matches.get_one::<String>("suite").cloned(),
        skip_first: matches.get_one::<usize>("skip-first").copied().unwrap_or(0),
        defines: matches
            .get_many::<(String, String)>("define")
            .map(|defines| defines.cloned().collect())
            .unwrap_or_default(),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and logging so that help texts and early errors use them.
    if let Some(language) = pre_parse_language() {
        rust_i18n::set_locale(&language);
    }
    init_logging(pre_parse_verbose());
    let language = rust_i18n::locale().to_string();

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => commands::run::execute(run_args(run_matches)).await?,
        Some(("init", init_matches)) => {
            commands::init::run_init(&project_dir(init_matches), init_matches.get_flag("force"))?
        }
        _ => {
            // Clap has already printed the help text.
        }
    }
    Ok(())
}
