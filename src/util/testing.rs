//! Shared test setup: tracing subscriber and small record fixtures

use std::env;
use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{FlatRecord, RecordSet};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_target(true)
            .with_thread_names(false)
            .with_test_writer()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Record set from `(code, name, parent_code)` triples per level.
pub fn records(
    provinces: &[(&str, &str)],
    cities: &[(&str, &str, &str)],
    areas: &[(&str, &str, &str)],
    streets: &[(&str, &str, &str)],
) -> RecordSet {
    fn level(rows: &[(&str, &str, &str)]) -> Vec<FlatRecord> {
        rows.iter()
            .map(|(code, name, parent)| FlatRecord::new(*code, *name, *parent))
            .collect()
    }

    RecordSet {
        provinces: provinces
            .iter()
            .map(|(code, name)| FlatRecord::new(*code, *name, ""))
            .collect(),
        cities: level(cities),
        areas: level(areas),
        streets: level(streets),
    }
}

/// Two provinces, three cities, three areas and four streets.
pub fn sample_records() -> RecordSet {
    records(
        &[("11", "Beijing"), ("13", "Hebei")],
        &[
            ("1101", "Beijing City", "11"),
            ("1301", "Shijiazhuang", "13"),
            ("1302", "Tangshan", "13"),
        ],
        &[
            ("110101", "Dongcheng", "1101"),
            ("110102", "Xicheng", "1101"),
            ("130102", "Chang'an", "1301"),
        ],
        &[
            ("110101001", "Donghuamen", "110101"),
            ("110101002", "Jingshan", "110101"),
            ("110102001", "Xichang'anjie", "110102"),
            ("130102001", "Jianbei", "130102"),
        ],
    )
}
