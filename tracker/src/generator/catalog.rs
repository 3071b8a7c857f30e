use anyhow::{ensure, Context};
use chrono::{DateTime, Datelike, Timelike, Utc};
use orbitcore::catalog::element_set::checksum_digit;
use orbitcore::propagation::transform::WGS84_A_KM;
use orbitcore::OrbitalElementSet;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Earth gravitational parameter, km^3/s^2.
const MU_KM3_S2: f64 = 398_600.4418;
const SECONDS_PER_DAY: f64 = 86_400.0;
const FIRST_CATALOG_NUMBER: u64 = 80_001;
const MAX_OBJECTS: usize = 19_999;

/// Configuration for a synthetic constellation catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub seed: u64,
    /// Nominal shell altitudes; objects are dealt round-robin across them.
    pub shell_altitudes_km: Vec<f64>,
    pub altitude_jitter_km: f64,
    pub inclination_deg: f64,
    pub name_prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 120,
            seed: 0,
            shell_altitudes_km: vec![340.0, 550.0, 1150.0],
            altitude_jitter_km: 15.0,
            inclination_deg: 53.0,
            name_prefix: "SYNTH".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }
}

/// Revolutions per day of a circular orbit at `altitude_km`.
pub fn mean_motion_rev_per_day(altitude_km: f64) -> f64 {
    let semi_major = WGS84_A_KM + altitude_km;
    let period_secs = 2.0 * PI * (semi_major.powi(3) / MU_KM3_S2).sqrt();
    SECONDS_PER_DAY / period_secs
}

fn epoch_fields(epoch: DateTime<Utc>) -> (i32, f64) {
    let seconds = f64::from(epoch.num_seconds_from_midnight())
        + f64::from(epoch.nanosecond()) / 1e9;
    (
        epoch.year().rem_euclid(100),
        f64::from(epoch.ordinal()) + seconds / SECONDS_PER_DAY,
    )
}

fn with_checksum(body: String) -> String {
    let digit = checksum_digit(&body);
    format!("{}{}", body, digit)
}

/// Deterministic element sets for `config`, all with epoch `epoch`.
pub fn generate_element_sets(
    config: &GeneratorConfig,
    epoch: DateTime<Utc>,
) -> anyhow::Result<Vec<OrbitalElementSet>> {
    ensure!(config.count <= MAX_OBJECTS, "at most {} synthetic objects", MAX_OBJECTS);
    ensure!(
        !config.shell_altitudes_km.is_empty(),
        "at least one shell altitude is required"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (epoch_year, epoch_day) = epoch_fields(epoch);
    let mut sets = Vec::with_capacity(config.count);

    for index in 0..config.count {
        let catalog_number = FIRST_CATALOG_NUMBER + index as u64;
        let shell = config.shell_altitudes_km[index % config.shell_altitudes_km.len()];
        let jitter = config.altitude_jitter_km.abs();
        let altitude = if jitter > 0.0 {
            shell + rng.gen_range(-jitter..jitter)
        } else {
            shell
        };

        let inclination = (config.inclination_deg + rng.gen_range(-0.5..0.5)).clamp(0.0, 180.0);
        let raan = rng.gen_range(0.0..360.0);
        let eccentricity: f64 = rng.gen_range(0.0001..0.0015);
        let arg_perigee = rng.gen_range(0.0..360.0);
        let mean_anomaly = rng.gen_range(0.0..360.0);
        let designator = format!(
            "{:02}{:03}{}",
            epoch_year,
            1 + index / 26,
            char::from(b'A' + (index % 26) as u8)
        );

        let line1 = with_checksum(format!(
            "1 {:05}U {:<8} {:02}{:012.8}  .00000000  00000-0  00000-0 0  999",
            catalog_number, designator, epoch_year, epoch_day
        ));
        let line2 = with_checksum(format!(
            "2 {:05} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:05}",
            catalog_number,
            inclination,
            raan,
            (eccentricity * 1e7).round() as u32,
            arg_perigee,
            mean_anomaly,
            mean_motion_rev_per_day(altitude),
            0
        ));

        let name = format!("{}-{:04}", config.name_prefix, index + 1);
        let set = OrbitalElementSet::new(&name, &line1, &line2);
        set.validate()
            .with_context(|| format!("generated element set {} is malformed", name))?;
        sets.push(set);
    }

    Ok(sets)
}

/// The same catalog rendered as three-line element text.
pub fn generate_catalog(config: &GeneratorConfig, epoch: DateTime<Utc>) -> anyhow::Result<String> {
    let sets = generate_element_sets(config, epoch)?;
    let mut text = String::new();
    for set in &sets {
        text.push_str(&set.name);
        text.push('\n');
        text.push_str(&set.line1);
        text.push('\n');
        text.push_str(&set.line2);
        text.push('\n');
    }
    Ok(text)
}
