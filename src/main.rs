#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "psdoc", about = "Photoshop document inspection tools")]
struct Cli {
	/// Verbosity level (-v, -vv, -vvv)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Info(cmd::info::Args),
	Resources(cmd::resources::Args),
	Layers(cmd::layers::Args),
	Tree(cmd::tree::Args),
	Image(cmd::image::Args),
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	};

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn run(command: Commands) -> psdoc::psd::Result<()> {
	match command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Resources(args) => cmd::resources::run(args),
		Commands::Layers(args) => cmd::layers::run(args),
		Commands::Tree(args) => cmd::tree::run(args),
		Commands::Image(args) => cmd::image::run(args),
	}
}
