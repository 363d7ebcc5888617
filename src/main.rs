//! qrgen command-line entrypoint

use clap::Parser;
use qrgen::{
    AccessToken, Error, ImageFormat, ParamValue, Parameter, QrGenConfig, QrGenerator, Result,
    logging,
};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrgen",
    version,
    about = "Generate QR codes through the qr-code-generator.com API"
)]
struct Cli {
    /// API access token. Pass `.env` to read it from ACCESS_TOKEN.
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Optional configuration file (toml/yaml/ini). Defaults to qrgen.{toml,yaml,ini} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output filename without extension. Defaults to a timestamped name.
    #[arg(long, short = 'o', value_name = "NAME")]
    filename: Option<String>,

    /// Number of codes to request in sequence
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    bulk: u32,

    /// Override a rendering parameter, e.g. `--set foreground_color=#FF0000`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Text to encode (shorthand for `--set qr_code_text=...`)
    #[arg(long)]
    text: Option<String>,

    /// Image format returned by the API
    #[arg(long, value_enum)]
    format: Option<ImageFormat>,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,

    /// Log every step
    #[arg(long, short)]
    verbose: bool,

    /// Print the query URL and exit without sending a request
    #[arg(long)]
    dry_run: bool,
}

fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if value.is_empty() {
        return Err(format!("missing value for '{key}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrGenConfig::load(cli.config.as_deref())?;

    if cli.force {
        config.settings.force_overwrite = true;
    }

    if cli.verbose {
        config.settings.verbose = true;
    }

    logging::init(&config.logging, config.settings.verbose)?;

    let overrides = collect_overrides(&config, &cli)?;
    let token = cli.token.as_deref().map(AccessToken::parse);

    let mut generator = QrGenerator::new(config.settings.clone(), token, overrides)?;

    if cli.dry_run {
        println!("{}", generator.build_query_url());
        return Ok(());
    }

    for index in 0..cli.bulk {
        let name = bulk_name(cli.filename.as_deref(), index);
        let path = generator.request(name.as_deref()).await?;
        info!(index, path = %path.display(), "Request complete");
        println!("{}", path.display());
    }

    Ok(())
}

/// Name for the `index`-th request of a bulk run: `<name>`, then `<name>-<index>`.
/// Without an explicit name the client derives a timestamped one.
fn bulk_name(filename: Option<&str>, index: u32) -> Option<String> {
    match filename {
        Some(name) if index == 0 => Some(name.to_string()),
        Some(name) => Some(format!("{name}-{index}")),
        None => None,
    }
}

/// Config-file parameters first, then `--set`, then the dedicated flags.
fn collect_overrides(config: &QrGenConfig, cli: &Cli) -> Result<Vec<(String, ParamValue)>> {
    let mut overrides: Vec<(String, ParamValue)> = config
        .parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut seen = HashSet::new();
    for (key, value) in &cli.overrides {
        if !seen.insert(key.as_str()) {
            return Err(Error::Config(format!(
                "Parameter '{key}' is defined more than once"
            )));
        }
        let Ok(value) = value.parse::<ParamValue>();
        overrides.push((key.clone(), value));
    }

    if let Some(text) = &cli.text {
        overrides.push((Parameter::QrCodeText.name().to_string(), text.as_str().into()));
    }

    if let Some(format) = cli.format {
        overrides.push((Parameter::ImageFormat.name().to_string(), format.into()));
    }

    Ok(overrides)
}
