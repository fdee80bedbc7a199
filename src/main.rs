use clap::{Parser, Subcommand};
use image_url::config::{self, PatternOverrides, UrlConfig};
use image_url::filters::{FilterSet, FilterValue};
use image_url::{MakeOptions, UrlGenerator, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-url")]
#[command(about = "Encode image filters into URLs and decode them back")]
#[command(long_about = "\
Encode image filters into URLs and decode them back

  image-url make path/to/image.jpg --width 300 --height 300 -f rotate=90 -f negative
  → /path/to/image-filters(300x300-rotate(90)-negative).jpg

  image-url parse /path/to/image-filters(300x300-rotate(90)-negative).jpg
  → path/to/image.jpg with width=300, height=300, rotate=90, negative

The URL layout is read from image-url.toml (optional). Run
'image-url gen-config' to generate a documented one.

Set RUST_LOG (e.g. RUST_LOG=image_url=debug) for diagnostics on stderr.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the URL of an image with filters applied
    Make {
        /// Image path or absolute URL
        src: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Filter as `key=value` or a bare flag name; repeatable
        #[arg(short, long = "filter", value_parser = parse_filter_arg)]
        filters: Vec<(String, FilterValue)>,
        /// Generate for a named route
        #[arg(long)]
        route: Option<String>,
        /// Host to generate the URL on
        #[arg(long)]
        host: Option<String>,
    },
    /// Recover the original path and filters from a URL path
    Parse {
        path: String,
        /// Parse with a route's pattern overrides
        #[arg(long)]
        route: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the compiled regex that recognizes image URLs
    Pattern {
        /// Pattern of a route instead of the default one
        #[arg(long)]
        route: Option<String>,
    },
    /// Validate the configuration and show what it declares
    Check,
    /// Print a stock image-url.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let url_config = config::load_config(&cli.config)?;
    let generator = UrlGenerator::from_config(&url_config);

    match cli.command {
        Command::Make {
            src,
            width,
            height,
            filters,
            route,
            host,
        } => {
            let filters: FilterSet = filters.into_iter().collect();
            let filters = filters.sized(width, height);
            let options = MakeOptions {
                route,
                host,
                pattern: PatternOverrides::default(),
            };
            match generator.make_with(&src, &filters, &options)? {
                Some(url) => println!("{}", url),
                None => {
                    eprintln!("error: empty source");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Parse { path, route, json } => {
            let overrides = route_overrides(&url_config, route.as_deref())?;
            match generator.parse_with(&path, &overrides) {
                Ok(matched) if json => println!("{}", serde_json::to_string_pretty(&matched)?),
                Ok(matched) => output::print_parse_output(&matched),
                Err(e) if e.is_not_found() => {
                    eprintln!("not found: {e}");
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Pattern { route } => {
            let overrides = route_overrides(&url_config, route.as_deref())?;
            println!("{}", generator.pattern_with(&overrides)?);
        }
        Command::Check => {
            let default_pattern = generator.pattern()?;
            let mut route_patterns = Vec::new();
            for (name, route) in &url_config.routes {
                route_patterns.push((name.clone(), generator.pattern_with(&route.pattern)?));
            }
            output::print_check_output(&url_config, &default_pattern, &route_patterns);
        }
        // printed before the configuration is loaded
        Command::GenConfig => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Route logs to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "image_url=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Pattern overrides of `route`, or none without a route.
fn route_overrides(
    config: &UrlConfig,
    route: Option<&str>,
) -> Result<PatternOverrides, Box<dyn std::error::Error>> {
    match route {
        None => Ok(PatternOverrides::default()),
        Some(name) => match config.routes.get(name) {
            Some(route) => Ok(route.pattern.clone()),
            None => Err(format!("unknown route '{name}'").into()),
        },
    }
}

/// Parse one `--filter` argument.
///
/// `negative` → flag, `rotate=90` → number, `crop=10,20` → list,
/// `enabled=false` → disabled filter.
fn parse_filter_arg(raw: &str) -> Result<(String, FilterValue), String> {
    let (key, value) = match raw.split_once('=') {
        None => (raw, FilterValue::Bool(true)),
        Some((key, "true")) => (key, FilterValue::Bool(true)),
        Some((key, "false")) => (key, FilterValue::Bool(false)),
        Some((key, value)) => (key, FilterValue::from_list_token(value)),
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter '{raw}' has no name"));
    }
    Ok((key.to_string(), value))
}
