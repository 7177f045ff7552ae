mod echo;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use mapscrape_core::{
    ConfigLoader, ConfigLoaderBuilder, GalleryUpdateInput, HttpFetcher, InMemoryStore, RecordKind, SceneUpdateInput,
    ScraperConfig, ScraperRegistry, Scraper,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use echo::{print_banner, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Record kinds accepted by `url`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Performer,
    Scene,
    Gallery,
    Movie,
}

impl From<Kind> for RecordKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Performer => RecordKind::Performer,
            Kind::Scene => RecordKind::Scene,
            Kind::Gallery => RecordKind::Gallery,
            Kind::Movie => RecordKind::Movie,
        }
    }
}

/// Record kinds accepted by `fragment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FragmentKind {
    Scene,
    Gallery,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded scrapers and the lookups they support
    List,

    /// Scrape a record from a URL or local file
    Url {
        /// Record kind to scrape
        #[arg(value_enum)]
        kind: Kind,

        /// URL or local path of the document
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Search performers by name
    Search {
        /// Name to search for
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Re-scrape a stored scene or gallery
    Fragment {
        /// Record kind of the stored entity
        #[arg(value_enum)]
        kind: FragmentKind,

        /// Id of the stored entity
        #[arg(long, value_name = "ID")]
        id: String,

        /// JSON file with stored scenes and galleries
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
    },

    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Scrape performer, scene, gallery and movie metadata with mapped scrapers
#[derive(Parser, Debug)]
#[command(name = "mapscrape")]
#[command(author = "Mapscrape Contributors")]
#[command(version)]
#[command(about = "Scrape metadata with JSON and HTML mapped scrapers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Scraper definition directory (default: ~/.config/mapscrape/scrapers)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Scraper id (definition file stem)
    #[arg(short, long, global = true, value_name = "ID")]
    scraper: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_registry(config_dir: Option<&PathBuf>) -> anyhow::Result<ScraperRegistry> {
    let loader = match config_dir {
        Some(dir) => ConfigLoaderBuilder::new().dir(dir).build(),
        None => ConfigLoader::default(),
    };

    loader
        .load()
        .with_context(|| format!("Failed to load scrapers from {}", describe_dir(&loader)))
}

fn describe_dir(loader: &ConfigLoader) -> String {
    loader.dir().map(|d| d.display().to_string()).unwrap_or_else(|| "<none>".to_string())
}

/// Picks the scraper named by `--scraper`, or the only loaded scraper.
fn select_scraper(registry: &ScraperRegistry, id: Option<&str>) -> anyhow::Result<Arc<ScraperConfig>> {
    if let Some(id) = id {
        return Ok(registry.get(id)?);
    }

    let mut all = registry.iter();
    match (all.next(), all.next()) {
        (Some(only), None) => Ok(Arc::clone(only)),
        (None, _) => bail!("No scrapers loaded"),
        _ => bail!("Several scrapers loaded; pick one with --scraper"),
    }
}

/// Picks the scraper named by `--scraper`, or the first one that accepts `url`.
fn select_for_url(
    registry: &ScraperRegistry, id: Option<&str>, kind: RecordKind, url: &str,
) -> anyhow::Result<Arc<ScraperConfig>> {
    if let Some(id) = id {
        return Ok(registry.get(id)?);
    }

    match registry.for_url(kind, url).into_iter().next() {
        Some(config) => {
            debug!("Scraper '{}' accepts {}", config.id, url);
            Ok(config)
        }
        None => bail!("No scraper accepts {} URL {}", kind.name(), url),
    }
}

fn render<T: Serialize>(record: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(record).context("Failed to serialize record")
}

fn list(registry: &ScraperRegistry) {
    if registry.is_empty() {
        print_warning("No scrapers loaded");
        return;
    }

    for config in registry.iter() {
        println!("{} {}", config.id.bold(), format!("({})", config.name).dimmed());
        for mode in config.capabilities() {
            println!("  {}", mode);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::Completions { shell } = args.command {
        clap_complete::generate(shell, &mut Args::command(), "mapscrape", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let registry = load_registry(args.config_dir.as_ref())?;
    if args.verbose {
        print_step(1, 3, &format!("Loaded {} scraper(s)", registry.len()));
    }

    let scraper_id = args.scraper.as_deref();
    let fetcher = HttpFetcher::new();

    let output = match &args.command {
        Command::List => {
            list(&registry);
            return Ok(());
        }
        Command::Completions { .. } => return Ok(()),
        Command::Url { kind, url } => {
            let kind = RecordKind::from(*kind);
            let config = select_for_url(&registry, scraper_id, kind, url)?;
            let store = InMemoryStore::new();
            let scraper = Scraper::new(&config, &fetcher, &store);

            if args.verbose {
                print_step(2, 3, &format!("Scraping {} with {}", url.bright_white().underline(), config.id));
            }

            let context = || format!("Failed to scrape {} from {}", kind.name(), url);
            match kind {
                RecordKind::Performer => render(&scraper.scrape_performer_by_url(url).with_context(context)?)?,
                RecordKind::Scene => render(&scraper.scrape_scene_by_url(url).with_context(context)?)?,
                RecordKind::Gallery => render(&scraper.scrape_gallery_by_url(url).with_context(context)?)?,
                RecordKind::Movie => render(&scraper.scrape_movie_by_url(url).with_context(context)?)?,
            }
        }
        Command::Search { name } => {
            let config = select_scraper(&registry, scraper_id)?;
            let store = InMemoryStore::new();
            let scraper = Scraper::new(&config, &fetcher, &store);

            if args.verbose {
                print_step(2, 3, &format!("Searching '{}' with {}", name.bright_white(), config.id));
            }

            let performers = scraper
                .scrape_performers_by_name(name)
                .with_context(|| format!("Failed to search performers named '{}'", name))?;
            render(&performers)?
        }
        Command::Fragment { kind, id, store } => {
            let config = select_scraper(&registry, scraper_id)?;
            let store = InMemoryStore::from_file(store)
                .with_context(|| format!("Failed to load store: {}", store.display()))?;
            let scraper = Scraper::new(&config, &fetcher, &store);

            if args.verbose {
                print_step(2, 3, &format!("Re-scraping {:?} {} with {}", kind, id.bright_white(), config.id));
            }

            match kind {
                FragmentKind::Scene => render(
                    &scraper
                        .scrape_scene_by_fragment(&SceneUpdateInput { id: id.clone() })
                        .with_context(|| format!("Failed to scrape scene {}", id))?,
                )?,
                FragmentKind::Gallery => render(
                    &scraper
                        .scrape_gallery_by_fragment(&GalleryUpdateInput { id: id.clone() })
                        .with_context(|| format!("Failed to scrape gallery {}", id))?,
                )?,
            }
        }
    };

    if args.verbose {
        print_step(3, 3, "Writing output");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}
