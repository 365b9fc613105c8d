use anyhow::{bail, Context, Result};
use clap::Parser;
use label_geocoder::batch::{Batch, BatchOptions, BatchSummary, OutputRow};
use label_geocoder::geocoder::{GeocodeCache, Geocoder, GoogleGeocoder, OfflineGeocoder};
use label_geocoder::table::Table;
use label_geocoder::FlagStatus;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// labelgeo — bulk geocoder for specimen-label localities
///
/// Reads a CSV with province_state, county, city, prec_location and optional
/// latitude/longitude columns, geocodes rows that lack coordinates, applies
/// directional offsets ("5mi NW of Niland") and flags rows for review.
///
/// Examples:
///   labelgeo locations.csv
///   labelgeo locations.csv geocoded.csv --delay-ms 200
///   GOOGLE_API_KEY=... labelgeo specimens.csv --skip-vague
///   labelgeo specimens.csv --offline
#[derive(Parser)]
#[command(name = "labelgeo", version, about, long_about = None)]
struct Cli {
    /// Input CSV file.
    input: PathBuf,

    /// Output CSV file. Defaults to geocoded_<input name> beside the input.
    output: Option<PathBuf>,

    /// Google Geocoding API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Pause between consecutive geocoding requests, in milliseconds.
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// Geocode cache file. Defaults to ~/.label_geocoder/cache.json.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Do not read or write the geocode cache.
    #[arg(long, conflicts_with = "offline")]
    no_cache: bool,

    /// Offline mode: answer only from the cache, never call the API.
    #[arg(long)]
    offline: bool,

    /// Do not geocode rows that carry only county/state text.
    #[arg(long)]
    skip_vague: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_path = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.input));

    // ── Load input ──────────────────────────────────────────────

    eprintln!("  \u{1F4C2} Reading {}", cli.input.display());
    let table = Table::read_path(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let records = table.records();
    let needs_geocoding = records.iter().filter(|r| !r.has_coordinates()).count();
    eprintln!(
        "  \u{2705} Loaded {} rows, {} need geocoding",
        records.len(),
        needs_geocoding
    );

    // ── Build pipeline ──────────────────────────────────────────

    let geocoder: Box<dyn Geocoder> = if cli.offline || needs_geocoding == 0 {
        Box::new(OfflineGeocoder)
    } else {
        match cli.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Box::new(GoogleGeocoder::new(key)),
            _ => bail!(
                "Google API key not set. Export GOOGLE_API_KEY or pass --api-key, \
                 or use --offline to answer from the cache only."
            ),
        }
    };

    let options = BatchOptions {
        delay: Duration::from_millis(cli.delay_ms),
        skip_vague: cli.skip_vague,
    };

    let mut batch = Batch::new(geocoder, options);
    if !cli.no_cache {
        let mut cache = match &cli.cache {
            Some(path) => GeocodeCache::load_from(path.clone()),
            None => GeocodeCache::load(),
        };
        let pruned = cache.prune_expired();
        info!(
            path = %cache.path().display(),
            entries = cache.len(),
            pruned,
            "loaded geocode cache"
        );
        batch = batch.with_cache(cache);
    }

    // ── Run ─────────────────────────────────────────────────────

    let (rows, summary) = batch.run(records);

    table
        .write_path(&output_path, &rows)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    eprintln!("  \u{1F4BE} Saved results to {}", output_path.display());

    eprint!("{}", render_summary(&summary, &rows));
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "locations.csv".into());
    input.with_file_name(format!("geocoded_{}", name))
}

fn render_summary(summary: &BatchSummary, rows: &[OutputRow]) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();

    out.push_str(&format!("\n{}\n  GEOCODING SUMMARY\n{}\n", rule, rule));
    out.push_str(&format!("  Total rows:              {}\n", summary.total));
    out.push_str(&format!("  Successfully geocoded:   {}\n", summary.geocoded));
    out.push_str(&format!("    from cache:            {}\n", summary.cache_hits));
    out.push_str(&format!("  Skipped:                 {}\n", summary.skipped));
    out.push_str(&format!("  Failed:                  {}\n", summary.failed));
    out.push_str(&format!("  Already had coordinates: {}\n", summary.already_had_coordinates));
    if summary.offsets_applied > 0 {
        out.push_str(&format!(
            "\n  \u{1F9ED} Directional offsets applied: {} (see latitude_shifted/longitude_shifted)\n",
            summary.offsets_applied
        ));
    }

    out.push_str(&format!("\n{}\n  FLAGGING SUMMARY\n{}\n", rule, rule));
    out.push_str(&format!(
        "  \u{26A0}\u{FE0F}  WARNING: {} - verify these manually\n",
        summary.warning
    ));
    out.push_str(&format!(
        "  \u{1F4CC} REVIEW:  {} - double-check if precision matters\n",
        summary.review
    ));
    out.push_str(&format!("  \u{2705} OK:      {} - look good\n", summary.ok));
    out.push_str(&format!("{}\n", rule));

    let warnings: Vec<_> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.flag.status == FlagStatus::Warning)
        .collect();
    if !warnings.is_empty() {
        out.push_str("\n  WARNING rows:\n");
        for (i, row) in warnings {
            out.push_str(&format!("    Row {}:\n", i));
            if let Some(g) = row.geocode() {
                out.push_str(&format!("      Google result: {}\n", g.formatted_address));
            }
            out.push_str(&format!("      Flags: {}\n", row.flag.reason()));
        }
    }
    out
}
