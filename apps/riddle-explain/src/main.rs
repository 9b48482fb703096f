use clap::Parser;

use riddle_explain::Args;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	riddle_explain::run(args)
}
