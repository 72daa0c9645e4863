//! QuickGO filter tool
//!
//! Converts filter requests into Solr queries using the deployment's filter
//! configuration, and reads Solr facet output into aggregation trees.
//!
//! Usage:
//!   quickgo-filter convert --filter goId=GO:0008150 --filter taxonId=9606
//!   quickgo-filter aggregate --response solr.json

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quickgo_search::aggregate::SolrResponseAggregationConverter;
use quickgo_search::config::Config;
use quickgo_search::converter::{FilterConverterFactory, HttpResponseFetcher};
use quickgo_search::query::SolrQuerySerializer;
use quickgo_search::request::FilterRequest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// External filter configuration YAML (overrides QUICKGO_FILTER_CONFIG).
    #[arg(long)]
    filter_config: Option<PathBuf>,

    /// Comma-separated searchable fields (overrides QUICKGO_SEARCHABLE_FIELDS).
    #[arg(long)]
    searchable_fields: Option<String>,

    /// Comma-separated terms-query fields (overrides QUICKGO_TERMS_FIELDS).
    #[arg(long)]
    terms_fields: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert filter requests and print the combined Solr query.
    Convert {
        /// One request per flag: `name=v1,v2`, properties joined with `&`.
        #[arg(long = "filter", required = true)]
        filters: Vec<String>,

        /// Print the conversion context as JSON as well.
        #[arg(long)]
        context: bool,
    },
    /// Read a Solr JSON response and print its aggregations as JSON.
    Aggregate {
        /// Solr response file.
        #[arg(long)]
        response: PathBuf,

        /// Repository-to-domain field name mapping: `repo=domain`.
        #[arg(long = "field-map")]
        field_map: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;
    apply_overrides(&mut config, &args);
    info!(
        searchable_fields = config.searchable_fields.len(),
        terms_fields = config.terms_fields.len(),
        "Configuration loaded"
    );

    match args.command {
        Command::Convert { filters, context } => convert(&config, &filters, context).await,
        Command::Aggregate {
            response,
            field_map,
        } => aggregate(&response, &field_map),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.filter_config {
        config.filter_config = Some(path.clone());
    }
    if let Some(fields) = &args.searchable_fields {
        config.searchable_fields = split_list(fields);
    }
    if let Some(fields) = &args.terms_fields {
        config.terms_fields = split_list(fields);
    }
}

fn parse_request(raw: &str) -> Result<FilterRequest> {
    let mut builder = FilterRequest::builder();
    for property in raw.split('&') {
        let Some((name, values)) = property.split_once('=') else {
            bail!("filter property must look like name=value: {property}");
        };
        builder = builder.add_property(name.trim(), split_list(values));
    }
    builder
        .build()
        .with_context(|| format!("invalid filter request: {raw}"))
}

async fn convert(config: &Config, filters: &[String], show_context: bool) -> Result<()> {
    let registry = config.filter_registry()?;
    let fetcher = HttpResponseFetcher::with_user_agent(&config.rest_user_agent)
        .context("failed to build HTTP client")?;
    let factory = FilterConverterFactory::new(Arc::new(registry), Arc::new(fetcher));

    let requests = filters
        .iter()
        .map(|raw| parse_request(raw))
        .collect::<Result<Vec<_>>>()?;
    let converted = factory
        .convert_all(&requests)
        .await
        .context("filter conversion failed")?;

    let serializer = SolrQuerySerializer::with_terms_fields(&config.terms_fields);
    println!("{}", serializer.serialize(converted.value()));
    if show_context && let Some(context) = converted.context() {
        println!("{}", serde_json::to_string_pretty(context)?);
    }
    Ok(())
}

fn aggregate(response: &Path, field_map: &[String]) -> Result<()> {
    let field_names = field_map
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(repo, domain)| (repo.trim().to_string(), domain.trim().to_string()))
                .with_context(|| format!("field mapping must look like repo=domain: {pair}"))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    let body = std::fs::read_to_string(response)
        .with_context(|| format!("failed to read {}", response.display()))?;
    let solr: Value = serde_json::from_str(&body).context("Solr response is not valid JSON")?;

    let aggregation = SolrResponseAggregationConverter::new(field_names)
        .convert(&solr)
        .context("failed to read aggregations")?;
    println!("{}", serde_json::to_string_pretty(&aggregation)?);
    Ok(())
}
