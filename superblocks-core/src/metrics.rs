//! Network and coverage statistics with evidence-scaled impact estimates
//!
//! Impact figures scale published superblock outcomes by the share of the
//! study area that the computed superblocks cover. They are illustrative
//! ranges, not forecasts.

use geo::{BoundingRect, ConvexHull, Euclidean, Length, LineString, MultiLineString, MultiPolygon, Polygon};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    PipelineConfig,
    geometry::{Crs, MetricProjection, combined_bounds, metric_area},
    model::{Segment, Superblock},
    streets::{HeritagePriority, MajorRoad},
};

/// Outcomes reported for full superblock coverage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceBaselines {
    pub no2_reduction_percent: f64,
    pub noise_reduction_db: f64,
    pub green_space_increase_percent: f64,
    pub prevented_deaths: f64,
    pub traffic_reduction_percent: f64,
    pub walk_mode_share_percent: f64,
    pub cycle_mode_share_percent: f64,
    pub public_transport_increase_percent: f64,
    pub co2_reduction_percent: f64,
    pub economic_savings_eur_billion: f64,
    pub life_expectancy_gain_days: f64,
}

/// Barcelona superblock programme outcomes
pub const EVIDENCE_BASELINES: EvidenceBaselines = EvidenceBaselines {
    no2_reduction_percent: 24.0,
    noise_reduction_db: 5.0,
    green_space_increase_percent: 270.0,
    prevented_deaths: 667.0,
    traffic_reduction_percent: 58.0,
    walk_mode_share_percent: 66.0,
    cycle_mode_share_percent: 11.0,
    public_transport_increase_percent: 43.5,
    co2_reduction_percent: 42.0,
    economic_savings_eur_billion: 1.7,
    life_expectancy_gain_days: 200.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn classify(value: f64, medium: f64, high: f64) -> Self {
        if value >= high {
            RiskLevel::High
        } else if value >= medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetrics {
    pub place: String,
    pub study_area_km2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLengths {
    pub total_edges_km: f64,
    pub boundary_street_km: f64,
    pub internal_street_km: f64,
    pub major_road_km: f64,
    pub heritage_priority_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperblockMetrics {
    pub count: usize,
    pub total_area_km2: f64,
    pub average_area_km2: f64,
    /// Superblock area over study area, clamped to `[0, 1]`
    pub coverage_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityZoneMetrics {
    pub area_km2: f64,
    pub share_of_study_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEstimates {
    pub expected_no2_reduction_percent: f64,
    pub expected_noise_reduction_db: f64,
    pub expected_green_space_increase_percent: f64,
    pub expected_prevented_premature_deaths: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeShiftEstimates {
    pub projected_internal_traffic_reduction_percent: f64,
    pub projected_walk_mode_share_percent: f64,
    pub projected_cycle_mode_share_percent: f64,
    pub projected_public_transport_uplift_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalEstimates {
    pub expected_co2_reduction_percent: f64,
    pub expected_life_expectancy_gain_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicEstimates {
    pub projected_health_economic_savings_eur: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRiskFlags {
    pub gentrification_risk: RiskLevel,
    pub perimeter_pressure: RiskLevel,
    pub coverage_intensity: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub context: ContextMetrics,
    pub network: NetworkLengths,
    pub superblocks: SuperblockMetrics,
    pub heritage_zone: PriorityZoneMetrics,
    pub evidence_based_estimates: EvidenceEstimates,
    pub mode_shift_estimates: ModeShiftEstimates,
    pub environmental_health_estimates: EnvironmentalEstimates,
    pub economic_estimates: EconomicEstimates,
    pub equity_risk_flags: EquityRiskFlags,
}

/// Layers the metrics are computed from
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput<'a> {
    pub segments: &'a [Segment],
    pub boundary: &'a [Segment],
    pub internal: &'a [Segment],
    pub major_roads: &'a [MajorRoad],
    pub heritage_priorities: &'a [HeritagePriority],
    pub superblocks: &'a [Superblock],
    pub priority_zone: &'a MultiPolygon<f64>,
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

fn ratio(part: f64, whole: f64) -> f64 {
    if part <= 0.0 || whole <= 0.0 {
        0.0
    } else {
        (part / whole).clamp(0.0, 1.0)
    }
}

fn length_km<'a>(lines: impl Iterator<Item = &'a LineString<f64>> + Clone, crs: Crs) -> f64 {
    let projection = MetricProjection::estimate(
        crs,
        combined_bounds(lines.clone().filter_map(BoundingRect::bounding_rect)),
    );
    lines
        .map(|line| Euclidean.length(&projection.project(line)))
        .sum::<f64>()
        / 1000.0
}

fn area_km2<'a>(polygons: impl Iterator<Item = &'a Polygon<f64>>, crs: Crs) -> f64 {
    polygons.map(|polygon| metric_area(polygon, crs)).sum::<f64>() / 1_000_000.0
}

fn study_area_km2(segments: &[Segment], crs: Crs) -> f64 {
    if segments.is_empty() {
        return 0.0;
    }
    let network =
        MultiLineString::new(segments.iter().map(|s| s.geometry.clone()).collect());
    let hull = network.convex_hull();
    metric_area(&hull, crs) / 1_000_000.0
}

/// Aggregate statistics of one pipeline run
pub fn compute_metrics(input: MetricsInput<'_>, crs: Crs, config: &PipelineConfig) -> NetworkMetrics {
    let study_area = study_area_km2(input.segments, crs);
    let superblock_area = area_km2(input.superblocks.iter().map(|s| &s.geometry), crs);
    let zone_area = area_km2(input.priority_zone.iter(), crs);
    let coverage = ratio(superblock_area, study_area);

    let network = NetworkLengths {
        total_edges_km: round_to(length_km(input.segments.iter().map(|s| &s.geometry), crs), 2),
        boundary_street_km: round_to(length_km(input.boundary.iter().map(|s| &s.geometry), crs), 2),
        internal_street_km: round_to(length_km(input.internal.iter().map(|s| &s.geometry), crs), 2),
        major_road_km: round_to(
            length_km(input.major_roads.iter().map(|m| &m.segment.geometry), crs),
            2,
        ),
        heritage_priority_km: round_to(
            length_km(
                input.heritage_priorities.iter().map(|h| &h.segment.geometry),
                crs,
            ),
            2,
        ),
    };

    #[allow(clippy::cast_precision_loss)]
    let average_area = if input.superblocks.is_empty() {
        0.0
    } else {
        superblock_area / input.superblocks.len() as f64
    };

    let zone_share = round_to(ratio(zone_area, study_area), 3);
    let perimeter_pressure = if network.boundary_street_km > 0.0 {
        round_to(network.major_road_km / network.boundary_street_km, 2)
    } else {
        0.0
    };
    debug!("Coverage ratio {coverage:.3}, perimeter pressure index {perimeter_pressure}");

    let b = EVIDENCE_BASELINES;
    NetworkMetrics {
        context: ContextMetrics {
            place: config.place_name.clone(),
            study_area_km2: round_to(study_area, 3),
        },
        superblocks: SuperblockMetrics {
            count: input.superblocks.len(),
            total_area_km2: round_to(superblock_area, 3),
            average_area_km2: round_to(average_area, 4),
            coverage_ratio: round_to(coverage, 3),
        },
        heritage_zone: PriorityZoneMetrics {
            area_km2: round_to(zone_area, 3),
            share_of_study_area: zone_share,
        },
        evidence_based_estimates: EvidenceEstimates {
            expected_no2_reduction_percent: round_to(coverage * b.no2_reduction_percent, 2),
            expected_noise_reduction_db: round_to(coverage * b.noise_reduction_db, 2),
            expected_green_space_increase_percent: round_to(
                coverage * b.green_space_increase_percent,
                1,
            ),
            expected_prevented_premature_deaths: round_to(coverage * b.prevented_deaths, 1),
        },
        mode_shift_estimates: ModeShiftEstimates {
            projected_internal_traffic_reduction_percent: round_to(
                coverage * b.traffic_reduction_percent,
                1,
            ),
            projected_walk_mode_share_percent: round_to(coverage * b.walk_mode_share_percent, 1),
            projected_cycle_mode_share_percent: round_to(coverage * b.cycle_mode_share_percent, 1),
            projected_public_transport_uplift_percent: round_to(
                coverage * b.public_transport_increase_percent,
                1,
            ),
        },
        environmental_health_estimates: EnvironmentalEstimates {
            expected_co2_reduction_percent: round_to(coverage * b.co2_reduction_percent, 1),
            expected_life_expectancy_gain_days: round_to(
                coverage * b.life_expectancy_gain_days,
                1,
            ),
        },
        economic_estimates: EconomicEstimates {
            projected_health_economic_savings_eur: round_to(
                coverage * b.economic_savings_eur_billion * 1e9,
                0,
            ),
        },
        equity_risk_flags: EquityRiskFlags {
            gentrification_risk: RiskLevel::classify(zone_share, 0.015, 0.03),
            perimeter_pressure: RiskLevel::classify(perimeter_pressure, 3.0, 5.0),
            coverage_intensity: RiskLevel::classify(coverage, 0.15, 0.3),
        },
        network,
    }
}
