use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};

use ruvdl::commands;

fn cli() -> Command {
    Command::new("ruv-dl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find, number and file episodes of RÚV programs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("dryrun")
                .long("dryrun")
                .global(true)
                .help("Only search, organize and plan; download and move nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Increase output verbosity (-v, -vv, -vvv)")
                .action(ArgAction::Count),
        )
        .subcommand(
            Command::new("download")
                .about("Download available episodes of programs")
                .arg(
                    Arg::new("query")
                        .help("Search terms or program ids")
                        .num_args(1..)
                        .index(1),
                )
                .arg(
                    Arg::new("update")
                        .short('u')
                        .long("update")
                        .help("Search for all saved programs in the destination and download available episodes")
                        .action(ArgAction::SetTrue),
                )
                .group(
                    ArgGroup::new("programs")
                        .args(["query", "update"])
                        .required(true),
                )
                .arg(
                    Arg::new("destination")
                        .long("destination")
                        .value_name("DIR")
                        .help("Top level destination directory"),
                )
                .arg(
                    Arg::new("days-between-episodes")
                        .long("days-between-episodes")
                        .value_name("N")
                        .help("Rate of episode release")
                        .value_parser(value_parser!(i64).range(1..)),
                )
                .arg(
                    Arg::new("iteration-count")
                        .long("iteration-count")
                        .value_name("N")
                        .help("Dates tried per step before giving up on a direction")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .value_name("N")
                        .help("Size of the crawl and download worker pools")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("empty-cache")
                        .long("empty-cache")
                        .help("Empty the probe cache before running")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .help("Do not run threaded, only download one file at a time")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply a program info migration to every program in the destination")
                .arg(
                    Arg::new("number")
                        .help("Migration to run")
                        .required(true)
                        .index(1)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("destination")
                        .long("destination")
                        .value_name("DIR")
                        .help("Top level destination directory"),
                ),
        )
        .subcommand(
            Command::new("mv")
                .visible_alias("move")
                .about("Move an episode file or a season folder and update the program info")
                .arg(Arg::new("src").help("Episode file or season folder").required(true).index(1))
                .arg(Arg::new("dst").help("New location").required(true).index(2)),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change saved settings")
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the location of the config file"))
                .subcommand(
                    Command::new("set")
                        .about("Persist a setting")
                        .arg(Arg::new("key").required(true).index(1))
                        .arg(Arg::new("value").required(true).index(2)),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    ruvdl::init_logging(matches.get_count("verbose"));
    let dry_run = matches.get_flag("dryrun");

    match matches.subcommand() {
        Some(("download", sub_matches)) => commands::download(sub_matches, dry_run),
        Some(("migrate", sub_matches)) => commands::migrate(sub_matches, dry_run),
        Some(("mv", sub_matches)) => commands::mv(sub_matches, dry_run),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        _ => Ok(()),
    }
}
