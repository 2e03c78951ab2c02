use crate::infra::{catalog_aggregator, load_catalog, parse_kind, parse_sort};
use clap::Args;
use estate_discovery::config::{AppConfig, DiscoveryConfig};
use estate_discovery::discovery::{
    DiscoverySession, EntityKind, FetchOutcome, FilterCriteria, FilterDebouncer, RankedEntity,
    SortOrder, ValueRange,
};
use estate_discovery::error::AppError;
use estate_discovery::finance::{amortization_schedule, AmortizationInput};
use estate_discovery::geo::{CachePolicy, Coordinate, FixedLocationProvider, Geolocator};
use estate_discovery::map::{
    EventLog, HeadlessSurface, MapController, MapEvent, MapOptions, ReconcileReport,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    /// Origin latitude; distance ranking is disabled without an origin
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub(crate) lat: Option<f64>,
    /// Origin longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub(crate) lon: Option<f64>,
    /// Restrict to entity kinds (listing, professional, project); repeatable
    #[arg(long = "kind", value_parser = parse_kind)]
    pub(crate) kinds: Vec<EntityKind>,
    /// Restrict to cities; repeatable
    #[arg(long = "city")]
    pub(crate) cities: Vec<String>,
    #[arg(long)]
    pub(crate) min_price: Option<f64>,
    #[arg(long)]
    pub(crate) max_price: Option<f64>,
    /// Drop results farther than this from the origin
    #[arg(long)]
    pub(crate) max_distance_km: Option<f64>,
    #[arg(long)]
    pub(crate) keyword: Option<String>,
    /// relevance, distance_asc, distance_desc, price_asc, price_desc
    #[arg(long, value_parser = parse_sort, default_value = "relevance")]
    pub(crate) sort: SortOrder,
    /// Maximum rows to print
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,
    /// CSV export directory; the built-in seed catalog is used otherwise
    #[arg(long)]
    pub(crate) catalog_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AmortizeArgs {
    /// Property price
    #[arg(long)]
    pub(crate) price: f64,
    /// Down payment as a percentage of the price
    #[arg(long, default_value_t = 0.0)]
    pub(crate) down_payment: f64,
    /// Annual interest rate in percent
    #[arg(long)]
    pub(crate) rate: f64,
    /// Loan term in years
    #[arg(long)]
    pub(crate) years: u32,
    /// Print a year-by-year balance summary
    #[arg(long)]
    pub(crate) schedule: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulate a user who denied location access
    #[arg(long)]
    pub(crate) deny_location: bool,
    /// CSV export directory; the built-in seed catalog is used otherwise
    #[arg(long)]
    pub(crate) catalog_dir: Option<PathBuf>,
}

const RIYADH_CENTER: Coordinate = Coordinate {
    latitude: 24.7136,
    longitude: 46.6753,
};

fn criteria_from(args: &SearchArgs) -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    criteria.kinds.extend(args.kinds.iter().copied());
    criteria.cities.extend(args.cities.iter().cloned());
    criteria.price = ValueRange {
        min: args.min_price,
        max: args.max_price,
    };
    criteria.max_distance_km = args.max_distance_km;
    criteria.keyword = args.keyword.clone();
    criteria
}

fn origin_from(args: &SearchArgs) -> Result<Option<Coordinate>, AppError> {
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Ok(Some(
            Coordinate::try_new(lat, lon)
                .map_err(estate_discovery::discovery::SearchError::from)?,
        )),
        _ => Ok(None),
    }
}

/// An inconsistent filter yields no results; say why before printing them.
fn filter_notice(criteria: &FilterCriteria) -> Option<String> {
    criteria
        .validate()
        .err()
        .map(|err| format!("Filter matches nothing: {err}"))
}

/// Environment settings with the command's catalog directory taking precedence.
fn discovery_config(catalog_dir: Option<PathBuf>) -> Result<DiscoveryConfig, AppError> {
    let mut config = AppConfig::load()?.discovery;
    if catalog_dir.is_some() {
        config.catalog_dir = catalog_dir;
    }
    Ok(config)
}

fn session_for(
    config: &DiscoveryConfig,
    position: Option<Coordinate>,
) -> Result<DiscoverySession, AppError> {
    let catalog = load_catalog(config.catalog_dir.as_deref())?;
    let geolocator = Arc::new(Geolocator::new(
        Arc::new(FixedLocationProvider::new(position)),
        config.geolocation_timeout,
    ));
    Ok(DiscoverySession::new(catalog_aggregator(catalog), geolocator))
}

pub(crate) async fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let origin = origin_from(&args)?;
    let criteria = criteria_from(&args);
    if let Some(notice) = filter_notice(&criteria) {
        println!("{notice}");
    }

    let config = discovery_config(args.catalog_dir.clone())?;
    let session = session_for(&config, origin)?;
    let outcome = session.refresh().await;
    session.locate(CachePolicy::PreferCached).await;

    if let Some(snapshot) = session.snapshot() {
        for failure in &snapshot.failures {
            println!("! {} unavailable: {}", failure.source, failure.message);
        }
    }
    if !session.distance_features_enabled() && args.sort != SortOrder::Relevance {
        println!("No origin given; distance ordering falls back to source order.");
    }

    let results = session.results(&criteria, args.sort);
    println!("{} result(s) [{outcome:?}]", results.len());
    for ranked in results.iter().take(args.limit) {
        println!("  {}", describe(ranked));
    }

    Ok(())
}

pub(crate) fn run_amortize(args: AmortizeArgs) -> Result<(), AppError> {
    let input =
        AmortizationInput::from_price(args.price, args.down_payment, args.rate, args.years)?;
    let result = input.amortize()?;

    println!("Financed principal: {:.2}", input.principal);
    println!("Monthly payment:    {:.2}", result.monthly_payment);
    println!("Total paid:         {:.2}", result.total_payment);
    println!("Total interest:     {:.2}", result.total_interest);

    if args.schedule {
        println!("\nYear | Principal paid | Interest paid | Remaining");
        let schedule = amortization_schedule(&input)?;
        for year in schedule.chunks(12) {
            let principal: f64 = year.iter().map(|entry| entry.principal).sum();
            let interest: f64 = year.iter().map(|entry| entry.interest).sum();
            let remaining = year.last().map_or(0.0, |entry| entry.remaining_balance);
            let index = year.last().map_or(0, |entry| entry.month.div_ceil(12));
            println!("{index:>4} | {principal:>14.2} | {interest:>13.2} | {remaining:>9.2}");
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let position = (!args.deny_location).then_some(RIYADH_CENTER);
    let config = discovery_config(args.catalog_dir)?;
    let session = session_for(&config, position)?;

    println!("Estate discovery demo");
    let (outcome, origin) = tokio::join!(
        session.refresh(),
        session.locate(CachePolicy::PreferCached)
    );
    match origin {
        Some(origin) => println!(
            "- user located at {:.4}, {:.4}",
            origin.latitude, origin.longitude
        ),
        None => println!("- location unavailable; distance sort and radius filter disabled"),
    }
    println!("- fetch outcome: {outcome:?}");

    let events = Arc::new(EventLog::default());
    let mut map = MapController::new(
        HeadlessSurface::new(1024, 768),
        events.clone(),
        MapOptions {
            fit_padding_px: config.fit_padding,
            ..MapOptions::default()
        },
    );
    map.mount()?;

    let everything = session.results(&FilterCriteria::default(), SortOrder::DistanceAsc);
    print_report("initial result set", &map.show(&everything)?);
    print_events(&events);

    // A background refresh with the same data must not move the map.
    print_report("background refresh", &map.show(&everything)?);
    print_events(&events);

    let debouncer = FilterDebouncer::new(config.filter_debounce);
    let (_, settled) = tokio::join!(
        debouncer.settle(FilterCriteria::default().with_kind(EntityKind::Listing)),
        debouncer.settle(
            FilterCriteria::default()
                .with_kind(EntityKind::Listing)
                .with_price(ValueRange::at_most(1_000_000.0))
        ),
    );
    if let Some(criteria) = settled {
        let narrowed = session.results(&criteria, SortOrder::PriceAsc);
        print_report(
            "user filter: listings up to 1,000,000",
            &map.show_after_user_filter(&narrowed)?,
        );
        print_events(&events);

        if let Some(first) = narrowed.first() {
            let key = first.key();
            map.select(&key)?;
            let route = map.open_detail(&key)?;
            println!("- selected {key}, detail view at {}", route.path());
            print_events(&events);
        }
    }

    map.teardown();
    map.teardown();
    println!(
        "- map torn down (surface destroyed {} time)",
        map.surface().destroy_calls
    );
    session.unmount();
    Ok(())
}

fn describe(ranked: &RankedEntity) -> String {
    let entity = &ranked.entity;
    let distance = ranked
        .distance_km
        .map(|km| format!("{km:.1} km"))
        .unwrap_or_else(|| "-".to_string());
    let price = entity
        .price()
        .map(|price| format!("{price:.0}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<12} {:<32} {:<8} {:>10} {:>10}  {}",
        entity.category.label(),
        entity.title(),
        entity.city.as_deref().unwrap_or("-"),
        price,
        distance,
        entity.detail_route().path()
    )
}

fn print_report(stage: &str, report: &ReconcileReport) {
    println!(
        "\n{stage}: +{} -{} ~{} ={}{}",
        report.added,
        report.removed,
        report.updated,
        report.retained,
        report
            .fitted
            .map(|reason| format!(" (viewport fitted: {reason:?})"))
            .unwrap_or_default()
    );
}

fn print_events(events: &EventLog) {
    for event in events.drain() {
        match event {
            MapEvent::PhaseChanged(phase) => println!("  event: map {phase}"),
            MapEvent::SelectionChanged(Some(entity)) => {
                println!("  event: selected {}", entity.title())
            }
            MapEvent::SelectionChanged(None) => println!("  event: selection cleared"),
            MapEvent::NavigationRequested(route) => {
                println!("  event: navigate to {}", route.path())
            }
            MapEvent::ViewportFitted { viewport, reason } => println!(
                "  event: fitted ({reason:?}) center {:.4}, {:.4} zoom {}",
                viewport.center.latitude, viewport.center.longitude, viewport.zoom
            ),
        }
    }
}
