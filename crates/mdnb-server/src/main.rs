//! `mdnb` command-line tool

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mdnb_identity::IdentityPolicy;
use mdnb_sequencer::{EnvStore, Platform};
use mdnb_serializer::SerializationLayer;
use mdnb_server::{commands, Protocol, ServerConfig};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

fn input_arg() -> Arg {
    Arg::new("input")
        .default_value("-")
        .value_parser(value_parser!(PathBuf))
        .help("Markdown file, or - for stdin")
}

fn cli() -> Command {
    Command::new("mdnb")
        .version(mdnb_server::VERSION)
        .about("Markdown notebooks: parse, format, list and sequence runnable cells")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("identity")
                .long("identity")
                .global(true)
                .value_parser(value_parser!(IdentityPolicy))
                .help("Identity policy: none, document, all or a numeric level"),
        )
        .arg(
            Arg::new("machine-id")
                .long("machine-id")
                .global(true)
                .help("Machine id salting generated identities"),
        )
        .subcommand(
            Command::new("deserialize")
                .about("Print a markdown file as notebook JSON")
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("serialize")
                .about("Print notebook JSON as markdown")
                .arg(
                    Arg::new("input")
                        .default_value("-")
                        .value_parser(value_parser!(PathBuf))
                        .help("Notebook JSON file, or - for stdin"),
                ),
        )
        .subcommand(
            Command::new("fmt")
                .about("Rewrite a markdown file in canonical form")
                .arg(input_arg())
                .arg(
                    Arg::new("write")
                        .long("write")
                        .short('w')
                        .action(ArgAction::SetTrue)
                        .help("Overwrite the file instead of printing"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List the runnable cells of a file")
                .arg(input_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("seq")
                .about("Print the shell command sequence of cells")
                .arg(input_arg())
                .arg(
                    Arg::new("cell")
                        .long("cell")
                        .short('c')
                        .action(ArgAction::Append)
                        .help("Cell name (repeatable); all cells when omitted"),
                )
                .arg(
                    Arg::new("os")
                        .long("os")
                        .help("Target OS (darwin, linux, windows); defaults to this host"),
                )
                .arg(
                    Arg::new("env")
                        .long("env")
                        .short('e')
                        .action(ArgAction::Append)
                        .help("KEY=VALUE added to the plan environment (repeatable)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print full execution plans as JSON"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the parser service")
                .arg(
                    Arg::new("address")
                        .long("address")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Listen address"),
                )
                .arg(
                    Arg::new("protocol")
                        .long("protocol")
                        .value_parser(value_parser!(Protocol))
                        .help("Transport: http or stream"),
                ),
        )
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ArgMatches) -> Result<ServerConfig> {
    let mut config = ServerConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(policy) = args.get_one::<IdentityPolicy>("identity") {
        config.layer = config.layer.with_identity(*policy);
    }
    if let Some(machine_id) = args.get_one::<String>("machine-id") {
        config.layer = config.layer.with_machine_id(machine_id);
    }
    Ok(config)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn input_path(args: &ArgMatches) -> &Path {
    args.get_one::<PathBuf>("input")
        .map_or(Path::new("-"), PathBuf::as_path)
}

fn print(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("failed to write output")?;
    stdout.flush().context("failed to write output")
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => {
            tracing::warn!("failed to listen for ctrl-c, serving until killed: {err}");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    let layer = SerializationLayer::with_config(config.layer.clone());

    match matches.subcommand() {
        Some(("deserialize", args)) => {
            let json = commands::deserialize(&layer, &read_input(input_path(args))?)?;
            print(format!("{json}\n").as_bytes())
        }
        Some(("serialize", args)) => {
            print(&commands::serialize(&layer, &read_input(input_path(args))?)?)
        }
        Some(("fmt", args)) => {
            let path = input_path(args);
            let formatted = commands::format(&layer, &read_input(path)?)?;
            if args.get_flag("write") && path != Path::new("-") {
                std::fs::write(path, &formatted)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!("formatted {}", path.display());
                Ok(())
            } else {
                print(&formatted)
            }
        }
        Some(("list", args)) => {
            let source = read_input(input_path(args))?;
            let out = commands::list(&layer, &source, args.get_flag("json"))?;
            print(out.as_bytes())
        }
        Some(("seq", args)) => {
            let platform = args
                .get_one::<String>("os")
                .map_or_else(Platform::current, |os| Platform::from_os(os));
            let mut env = EnvStore::new();
            env.extend_from_list(strings(args, "env"));

            let source = read_input(input_path(args))?;
            let names = strings(args, "cell");
            if args.get_flag("json") {
                let plans = commands::plans(&layer, &source, &names, &env, platform)?;
                let json = serde_json::to_string_pretty(&plans).context("failed to encode plans")?;
                print(format!("{json}\n").as_bytes())
            } else {
                print(commands::sequence(&layer, &source, &names, &env, platform)?.as_bytes())
            }
        }
        Some(("serve", args)) => {
            let mut config = config;
            if let Some(address) = args.get_one::<SocketAddr>("address") {
                config = config.with_address(*address);
            }
            if let Some(protocol) = args.get_one::<Protocol>("protocol") {
                config = config.with_protocol(*protocol);
            }
            tracing::info!(
                "mdnb v{} serving {} on {}",
                mdnb_server::VERSION,
                config.protocol,
                config.address
            );
            mdnb_server::run(config, shutdown_signal()).await
        }
        _ => Ok(()),
    }
}
