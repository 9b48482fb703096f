//! Dry run: compiles a search from the command line and prints what would be sent to the daemon.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use riddle_config::Config;
use riddle_query::{CompiledRequest, DaemonTarget, FilterArg, Search, SearchMeta, SortKey};

#[derive(Debug, Parser)]
#[command(
	version = riddle_cli::VERSION,
	rename_all = "kebab",
	styles = riddle_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'i', value_name = "INDEX")]
	pub index: String,
	#[arg(long, short = 'q', value_name = "TEXT")]
	pub query: Option<String>,
	/// Repeatable. All flags form one filter call.
	#[arg(long, value_name = "LOOKUP=VALUE", value_parser = parse_lookup)]
	pub filter: Vec<(String, FilterArg)>,
	/// Repeatable. All flags form one exclude call.
	#[arg(long, value_name = "LOOKUP=VALUE", value_parser = parse_lookup)]
	pub exclude: Vec<(String, FilterArg)>,
	#[arg(long, value_name = "KEY", value_delimiter = ',', allow_hyphen_values = true)]
	pub order_by: Vec<String>,
	/// Ordering declared for the index, used when no `--order-by` is given.
	#[arg(long, value_name = "KEY", value_delimiter = ',', allow_hyphen_values = true)]
	pub default_order: Vec<String>,
	#[arg(
		long,
		value_name = "FIELD",
		value_delimiter = ',',
		num_args = 0..,
		conflicts_with = "values_dict"
	)]
	pub values: Option<Vec<String>>,
	#[arg(long, value_name = "FIELD", value_delimiter = ',', num_args = 0..)]
	pub values_dict: Option<Vec<String>>,
	#[arg(long, value_name = "N", default_value_t = 0)]
	pub offset: usize,
	#[arg(long, value_name = "N")]
	pub limit: Option<usize>,
}

/// What a search would send to the daemon.
#[derive(Debug, Serialize)]
pub struct Explanation {
	pub target: DaemonTarget,
	pub request: CompiledRequest,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = riddle_config::load(&args.config)?;

	init_tracing(&config);

	let explanation = explain(&args, &config)?;
	let json = serde_json::to_string_pretty(&explanation)?;

	println!("{json}");

	Ok(())
}

pub fn explain(args: &Args, config: &Config) -> color_eyre::Result<Explanation> {
	let search = build_search(args, config)?;
	let target = search.target();

	tracing::info!(
		index = %args.index,
		host = %target.host,
		port = target.port,
		"Explaining search."
	);

	let request = search.compile()?;

	Ok(Explanation { target: target.clone(), request })
}

/// Parses `LOOKUP=VALUE`. A value is an integer, `true`/`false`, or a comma-separated set of
/// integers.
pub fn parse_lookup(raw: &str) -> Result<(String, FilterArg), String> {
	let (lookup, value) =
		raw.split_once('=').ok_or_else(|| format!("expected LOOKUP=VALUE, got `{raw}`"))?;

	if lookup.is_empty() {
		return Err(format!("missing lookup in `{raw}`"));
	}

	Ok((lookup.to_string(), parse_value(value)?))
}

fn parse_value(raw: &str) -> Result<FilterArg, String> {
	match raw {
		"true" => return Ok(FilterArg::from(true)),
		"false" => return Ok(FilterArg::from(false)),
		_ => {},
	}

	if raw.contains(',') {
		let values = raw
			.split(',')
			.map(|item| parse_int(item.trim()))
			.collect::<Result<Vec<_>, _>>()?;

		return Ok(FilterArg::Set(values));
	}

	Ok(FilterArg::Scalar(parse_int(raw.trim())?))
}

fn parse_int(raw: &str) -> Result<i64, String> {
	raw.parse().map_err(|_| format!("`{raw}` is not an integer"))
}

fn build_search(args: &Args, config: &Config) -> riddle_query::Result<Search> {
	let ordering = args
		.default_order
		.iter()
		.map(|key| SortKey::parse(key))
		.collect::<riddle_query::Result<Vec<_>>>()?;
	let meta = SearchMeta::new(args.index.clone()).with_ordering(ordering);
	let mut search = Search::new(meta).with_target(DaemonTarget::from(&config.daemon));

	if let Some(text) = &args.query {
		search = search.with_query(text.clone());
	}
	if !args.filter.is_empty() {
		search = search.filter(&borrow_lookups(&args.filter))?;
	}
	if !args.exclude.is_empty() {
		search = search.exclude(&borrow_lookups(&args.exclude))?;
	}
	if !args.order_by.is_empty() {
		let keys = args.order_by.iter().map(String::as_str).collect::<Vec<_>>();

		search = search.order_by(&keys)?;
	}
	if let Some(fields) = &args.values {
		search = search.with_fields(fields.clone(), false);
	}
	if let Some(fields) = &args.values_dict {
		search = search.with_fields(fields.clone(), true);
	}
	if let Some(limit) = args.limit {
		let end = args.offset.checked_add(limit).ok_or_else(|| riddle_query::Error::Argument {
			message: format!("--offset {} plus --limit {limit} overflows.", args.offset),
		})?;

		search = search.slice(args.offset..end)?;
	}

	Ok(search)
}

fn borrow_lookups(lookups: &[(String, FilterArg)]) -> Vec<(&str, FilterArg)> {
	lookups.iter().map(|(lookup, value)| (lookup.as_str(), value.clone())).collect()
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
