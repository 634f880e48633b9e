use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use project_config::{
    AdminChoice, Error, GithubChangelog, ProjectStore, Settings, Unattended,
    logging::{Verbosity, init_subscriber},
    profile,
};

fn cli() -> Command {
    Command::new("project-config")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Migrate and inspect project.json")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only show errors"),
        )
        .arg(
            Arg::new("dir")
                .long("dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Start the project search here instead of the working directory"),
        )
        .arg(
            Arg::new("admin")
                .long("admin")
                .global(true)
                .value_parser(["yes", "no", "keep"])
                .help("Answer the admin prompt without asking"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("migrate").about("Bring project.json to the current format"))
        .subcommand(Command::new("profiles").about("List profile names"))
        .subcommand(
            Command::new("profile")
                .about("Print the effective settings of a profile")
                .arg(Arg::new("name").default_value("default")),
        )
}

fn store(args: &ArgMatches) -> Result<ProjectStore, Error> {
    let settings = Settings::discover()?;

    let mut store = match args.get_one::<String>("admin").map(String::as_str) {
        None => ProjectStore::interactive(settings),
        Some(answer) => {
            let choice = match answer {
                "no" => AdminChoice::ViOnly,
                "keep" => AdminChoice::Both,
                _ => AdminChoice::AdminOnly,
            };
            let changelog = Box::new(GithubChangelog::new(&settings.changelog));
            let console = Box::new(Unattended::new(choice, std::io::stderr()));
            ProjectStore::init(settings, changelog, console)
        }
    };

    match args.get_one::<PathBuf>("dir") {
        Some(dir) => store.locate_from(dir)?,
        None => store.locate()?,
    };
    Ok(store)
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let mut store = store(args)?;

    match args.subcommand() {
        Some(("migrate", _)) => {
            let applied = store.load()?;
            if applied.is_empty() {
                println!("project.json is up to date");
            }
            for step in applied {
                println!("applied: {step}");
            }
        }
        Some(("profiles", _)) => {
            store.load()?;
            for name in profile::profile_names(store.document()) {
                println!("{name}");
            }
        }
        Some(("profile", sub)) => {
            let name = sub
                .get_one::<String>("name")
                .map(String::as_str)
                .unwrap_or("default");
            let merged = store.get_profile(name)?;
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

fn main() {
    let args = cli().get_matches();
    init_subscriber(Verbosity::from_flags(
        args.get_flag("verbose"),
        args.get_flag("quiet"),
    ));

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
