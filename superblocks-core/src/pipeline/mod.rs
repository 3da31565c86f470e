//! Stage functions threading an immutable [`PipelineState`]
//!
//! Each stage takes the previous snapshot by value, checks that the layers
//! it needs exist, and returns a new snapshot with its own layer filled in.
//! Running a stage before its prerequisites yields
//! [`Error::MissingPrerequisite`] naming the stage that has to run first.

mod state;

pub use state::PipelineState;

use log::info;

use crate::{
    Error, PipelineConfig,
    algo::{
        access_control::{
            DirectionPolicy, DominantAxis, LengthPolicy, MetricLength, analyze_permeability,
            calculate_street_directions, identify_modal_filters,
        },
        assign_blocks_to_superblocks, build_blocks as polygonize_blocks,
        build_superblocks as polygonize_superblocks,
    },
    metrics::{MetricsInput, compute_metrics},
    model::Segment,
    streets::{
        classify_streets, detect_major_roads, estimate_capacity, identify_heritage_priorities,
        prepare_priority_zone,
    },
};

/// Validated configuration plus the replaceable access-control policies
pub struct Pipeline {
    config: PipelineConfig,
    direction_policy: Box<dyn DirectionPolicy>,
    length_policy: Box<dyn LengthPolicy>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the configuration fails validation
    pub fn new(config: PipelineConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            direction_policy: Box::new(DominantAxis),
            length_policy: Box::new(MetricLength),
        })
    }

    #[must_use]
    pub fn with_direction_policy(mut self, policy: impl DirectionPolicy + 'static) -> Self {
        self.direction_policy = Box::new(policy);
        self
    }

    #[must_use]
    pub fn with_length_policy(mut self, policy: impl LengthPolicy + 'static) -> Self {
        self.length_policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse tags and estimate capacity for every raw segment
    pub fn enrich(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let segments = estimate_capacity(&state.raw_segments, &self.config);
        info!("Enriched {} segments with capacity", segments.len());
        Ok(PipelineState {
            segments: Some(segments),
            ..state
        })
    }

    pub fn classify(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let classification = classify_streets(state.require_segments()?, &self.config);
        Ok(PipelineState {
            classification: Some(classification),
            ..state
        })
    }

    /// Major corridors, the priority zone and the priority streets inside it
    pub fn detect_priority_layers(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let segments = state.require_segments()?;
        let major_roads = detect_major_roads(segments, &self.config);
        let zone = prepare_priority_zone(
            &state.priority_candidates,
            state.centre(),
            state.crs,
            &self.config,
        );
        let heritage = identify_heritage_priorities(segments, &zone, state.crs, &self.config);
        Ok(PipelineState {
            major_roads: Some(major_roads),
            priority_zone: Some(zone),
            heritage_priorities: Some(heritage),
            ..state
        })
    }

    pub fn build_blocks(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let classification = state.require_classification()?;
        let blocks = polygonize_blocks(&classification.internal, state.crs, &self.config);
        Ok(PipelineState {
            blocks: Some(blocks),
            ..state
        })
    }

    /// Superblocks from boundary streets, minus major corridors when
    /// `exclude_major_roads` is set and the priority layers were detected
    pub fn build_superblocks(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let classification = state.require_classification()?;
        let exclusions: Option<Vec<Segment>> = state
            .major_roads
            .as_ref()
            .filter(|_| self.config.exclude_major_roads)
            .map(|roads| roads.iter().map(|road| road.segment.clone()).collect());
        let superblocks = polygonize_superblocks(
            &classification.boundary,
            state.crs,
            &self.config,
            exclusions.as_deref(),
        );
        Ok(PipelineState {
            superblocks: Some(superblocks),
            ..state
        })
    }

    pub fn assign_blocks(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let blocks = state.require_blocks()?.to_vec();
        let superblocks = state.require_superblocks()?;
        let assigned = assign_blocks_to_superblocks(blocks, state.crs, superblocks, state.crs);
        Ok(PipelineState {
            blocks: Some(assigned),
            ..state
        })
    }

    /// Directions, modal filters and permeability of the internal streets
    pub fn access_control(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let internal = &state.require_classification()?.internal;
        let superblocks = state.require_superblocks()?;

        let directed = calculate_street_directions(
            internal,
            superblocks,
            &self.config,
            self.direction_policy.as_ref(),
        );
        let filters = identify_modal_filters(
            internal,
            superblocks,
            state.crs,
            &self.config,
            self.length_policy.as_ref(),
        );
        let permeability = analyze_permeability(&directed, superblocks);

        Ok(PipelineState {
            directed_streets: Some(directed),
            modal_filters: Some(filters),
            permeability: Some(permeability),
            ..state
        })
    }

    /// Network statistics; priority layers count as empty when not detected
    pub fn analyse_metrics(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let segments = state.require_segments()?;
        let classification = state.require_classification()?;
        let superblocks = state.require_superblocks()?;
        let empty_zone = geo::MultiPolygon::new(vec![]);

        let metrics = compute_metrics(
            MetricsInput {
                segments,
                boundary: &classification.boundary,
                internal: &classification.internal,
                major_roads: state.major_roads.as_deref().unwrap_or_default(),
                heritage_priorities: state.heritage_priorities.as_deref().unwrap_or_default(),
                superblocks,
                priority_zone: state.priority_zone.as_ref().unwrap_or(&empty_zone),
            },
            state.crs,
            &self.config,
        );
        Ok(PipelineState {
            metrics: Some(metrics),
            ..state
        })
    }

    /// Run every stage in order
    pub fn run(&self, state: PipelineState) -> Result<PipelineState, Error> {
        let state = self.enrich(state)?;
        let state = self.classify(state)?;
        let state = self.detect_priority_layers(state)?;
        let state = self.build_blocks(state)?;
        let state = self.build_superblocks(state)?;
        let state = self.assign_blocks(state)?;
        let state = self.access_control(state)?;
        self.analyse_metrics(state)
    }
}
