//! Command line entry point.
//!
//! Wraps the library's zone lookup, distance and enrichment passes for use
//! from analysis scripts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tripstat::config::{Config, ZonesConfig};
use tripstat::distance::haversine_km;
use tripstat::enrich::{enrich_itineraries, tag_zones, BatchOptions};
use tripstat::planner::TripPlannerClient;
use tripstat::table::{SchemaVariant, TripSchema, TripTable};
use tripstat::zones::ZoneService;

#[derive(Parser, Debug)]
#[command(name = "tripstat")]
#[command(about = "Zone, distance and itinerary enrichment for trip tables")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the zone containing a point
    Zone {
        #[command(flatten)]
        zones: ZoneArgs,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },

    /// Print the haversine distance between two points in km
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        from_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        from_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_lon: f64,
    },

    /// Add origin/destination zones and haversine distance to a trip table
    TagZones {
        #[command(flatten)]
        io: TableArgs,

        #[command(flatten)]
        zones: ZoneArgs,
    },

    /// Fetch itineraries for every trip and add their statistics
    Enrich {
        #[command(flatten)]
        io: TableArgs,

        /// Trip planner host
        #[arg(long)]
        host: Option<String>,

        /// Trip planner port
        #[arg(long)]
        port: Option<u16>,

        /// Maximum requests in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ZoneArgs {
    /// Zone shapefile (overrides zones.shapefile)
    #[arg(long)]
    shapefile: Option<PathBuf>,

    /// Source CRS as EPSG:<code> or proj4 string (overrides zones.source_crs)
    #[arg(long)]
    source_crs: Option<String>,
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    /// Input trip CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV
    #[arg(short, long)]
    output: PathBuf,

    /// Column layout of the input
    #[arg(long, value_enum, default_value = "gps")]
    schema: SchemaVariant,

    #[arg(long)]
    origin_lat_column: Option<String>,
    #[arg(long)]
    origin_lon_column: Option<String>,
    #[arg(long)]
    destination_lat_column: Option<String>,
    #[arg(long)]
    destination_lon_column: Option<String>,
    #[arg(long)]
    start_time_column: Option<String>,
}

impl TableArgs {
    fn schema(&self) -> TripSchema {
        let mut schema = TripSchema::for_variant(self.schema);
        let overrides = [
            (&mut schema.origin_lat, &self.origin_lat_column),
            (&mut schema.origin_lon, &self.origin_lon_column),
            (&mut schema.destination_lat, &self.destination_lat_column),
            (&mut schema.destination_lon, &self.destination_lon_column),
            (&mut schema.start_time, &self.start_time_column),
        ];
        for (target, value) in overrides {
            if let Some(name) = value {
                *target = name.clone();
            }
        }
        schema
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };

    match args.command {
        Command::Zone { zones, lon, lat } => {
            let service = load_zones(&config.zones, &zones)?;
            match service.lookup(lon, lat) {
                Some(zone) => println!("{}", serde_json::to_string_pretty(&zone)?),
                None => println!("No zone contains ({}, {})", lon, lat),
            }
        }

        Command::Distance {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
        } => {
            println!("{}", haversine_km(from_lat, from_lon, to_lat, to_lon));
        }

        Command::TagZones { io, zones } => {
            let service = load_zones(&config.zones, &zones)?;
            let mut table = read_table(&io.input)?;
            tag_zones(&service, &mut table, &io.schema())?;
            table
                .write_to_path(&io.output)
                .context("Failed to write output table")?;
        }

        Command::Enrich {
            io,
            host,
            port,
            concurrency,
            timeout_secs,
            quiet,
        } => {
            let mut planner_config = config.planner.clone();
            if let Some(host) = host {
                planner_config.host = host;
            }
            if let Some(port) = port {
                planner_config.port = port;
            }
            if let Some(concurrency) = concurrency {
                planner_config.concurrency = concurrency;
            }
            if let Some(timeout_secs) = timeout_secs {
                planner_config.timeout_secs = timeout_secs;
            }

            let client = TripPlannerClient::new(planner_config.clone())
                .context("Failed to create trip planner client")?;
            info!(
                "Trip planner at {}",
                planner_config.endpoint().context("Invalid planner endpoint")?
            );

            let mut table = read_table(&io.input)?;
            let options = BatchOptions {
                show_progress: !quiet,
                ..BatchOptions::from_config(&planner_config)
            };

            let report = enrich_itineraries(&client, &mut table, &io.schema(), &options).await?;
            table
                .write_to_path(&io.output)
                .context("Failed to write output table")?;

            info!("Done: {}", report);
        }
    }

    Ok(())
}

fn load_zones(config: &ZonesConfig, args: &ZoneArgs) -> Result<ZoneService> {
    let path = args
        .shapefile
        .as_ref()
        .or(config.shapefile.as_ref())
        .context("No zone shapefile given (use --shapefile or zones.shapefile)")?;
    let source_crs = args.source_crs.as_deref().or(config.source_crs.as_deref());

    ZoneService::from_shapefile(path, &config.fields(), source_crs)
        .with_context(|| format!("Failed to load zones from {}", path.display()))
}

fn read_table(path: &Path) -> Result<TripTable> {
    TripTable::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}
