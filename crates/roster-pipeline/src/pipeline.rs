//! The five-stage allocation pipeline

use crate::{
    AllocationRequest, AllocationResult, AnalysisResult, PipelineConfig, PipelineError,
    ReallocationResult,
};
use roster_allocator::{check_group_count, ConstrainedAllocator};
use roster_analysis::{group_averages, group_profiles, PreservationAnalyzer};
use roster_domain::traits::{CohortSource, RunQuery, RunSink};
use roster_domain::{GroupId, MemberId, Run, RunId, RunRecord, RunStage};
use roster_encoder::{EmbeddingCache, Embeddings, GraphEncoder, RelationalGraphEncoder};
use roster_graph::{CohortGraph, GraphBuilder, GraphDiagnostics};
use std::fmt::Display;
use std::sync::Mutex;
use tracing::{info, warn};

/// Allocation pipeline
///
/// Holds configuration and stateless stage components only. Every call
/// receives the data-access handle explicitly and builds its own graph from
/// a fresh snapshot, so one `Pipeline` can serve concurrent runs. The
/// optional embedding cache is the only shared state; it is locked for
/// lookups and inserts, never while encoding.
///
/// # Examples
///
/// ```no_run
/// use roster_pipeline::{AllocationRequest, Pipeline};
/// use roster_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("roster.db")?;
/// let pipeline = Pipeline::default_config();
///
/// let result = pipeline.allocate(&mut store, &AllocationRequest::new("2025", 4))?;
/// println!("run {} with {} groups", result.run_id, result.total_groups);
///
/// let analysis = pipeline.analyze(&store, Some(result.run_id))?;
/// println!("{} preservation rows", analysis.report.records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    builder: GraphBuilder,
    encoder: RelationalGraphEncoder,
    analyzer: PreservationAnalyzer,
    cache: Option<Mutex<EmbeddingCache>>,
}

impl Pipeline {
    /// Create a pipeline, validating every configuration section
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        let builder = GraphBuilder::new(config.graph.clone())?;
        let encoder = RelationalGraphEncoder::new(config.encoder.clone())?;
        let analyzer = PreservationAnalyzer::new(config.analysis.clone())?;
        let cache = config
            .cache_embeddings
            .then(|| Mutex::new(EmbeddingCache::new(config.cache_capacity)));
        Ok(Self {
            config,
            builder,
            encoder,
            analyzer,
            cache,
        })
    }

    /// Create a pipeline with the default configuration
    pub fn default_config() -> Self {
        Self {
            config: PipelineConfig::default(),
            builder: GraphBuilder::default_config(),
            encoder: RelationalGraphEncoder::default_config(),
            analyzer: PreservationAnalyzer::default_config(),
            cache: Some(Mutex::new(EmbeddingCache::new(PipelineConfig::default().cache_capacity))),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Allocate a cohort and persist the run
    ///
    /// Invalid requests fail before any stage runs; `k > n` fails before
    /// encoding. Nothing is written unless every stage succeeds, and the
    /// write itself is a single transaction.
    pub fn allocate<S>(
        &self,
        store: &mut S,
        request: &AllocationRequest,
    ) -> Result<AllocationResult, PipelineError>
    where
        S: CohortSource + RunSink,
        <S as CohortSource>::Error: Display,
        <S as RunSink>::Error: Display,
    {
        let k = request.group_count;
        if k == 0 {
            return Err(PipelineError::Config("group count must be at least 1".to_string()));
        }

        let mut allocator_config = self.config.allocator.clone();
        if let Some(policy) = request.policy {
            allocator_config.policy = policy;
        }
        if let Some(weights) = &request.weights {
            allocator_config.weights = weights.clone();
        }
        let allocator = ConstrainedAllocator::new(allocator_config)?;

        let mut run = Run::new(&request.cohort, k, allocator.config().policy.as_str());
        info!(run_id = %run.id, cohort = %run.cohort, k, policy = %run.policy, "Run created");

        let (graph, diagnostics) = self.builder.build(&*store, &request.cohort)?;
        check_group_count(graph.len(), k)?;
        log_diagnostics(&run, &diagnostics);
        advance(&mut run, RunStage::GraphBuilt)?;

        let embeddings = self.embed(&graph)?;
        let zero = embeddings.zero_members();
        if !zero.is_empty() {
            warn!(run_id = %run.id, count = zero.len(), "Members embedded as zero vectors");
        }
        advance(&mut run, RunStage::Embedded)?;

        let hints = allocator.hint(&embeddings, k)?;
        advance(&mut run, RunStage::Hinted)?;

        let outcome = allocator.allocate(&graph, &hints, k)?;
        advance(&mut run, RunStage::Allocated)?;

        let report = self.analyzer.analyze(&graph, &outcome.assignment)?;
        let averages = group_averages(
            &graph,
            &outcome.assignment,
            &allocator.config().tracked_attributes,
        )?;
        advance(&mut run, RunStage::Analyzed)?;

        let record = RunRecord {
            run: run.clone(),
            assignment: outcome.assignment,
            preservation: report.records,
            intra_group_edges: report.intra_group_edges,
            group_averages: averages,
        };
        store
            .persist_run(&record)
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;
        advance(&mut run, RunStage::Persisted)?;

        Ok(AllocationResult {
            run_id: run.id,
            cohort: run.cohort,
            total_members: record.assignment.len(),
            total_groups: k,
            groups: record.assignment.groups(),
            group_averages: record.group_averages,
            policy: run.policy,
            objective: outcome.solution.objective,
            stats: outcome.solution.stats,
            diagnostics,
        })
    }

    /// Move one member and persist the result as a new run
    ///
    /// The graph is rebuilt over the parent's assigned members only, so
    /// members added to the cohort afterwards are reported rather than
    /// rejected. The parent run is left untouched. Only the moved member changes group;
    /// the new run may fall outside the balanced size bounds.
    pub fn reallocate<S>(
        &self,
        store: &mut S,
        run_id: RunId,
        member: MemberId,
        from: GroupId,
        to: GroupId,
    ) -> Result<ReallocationResult, PipelineError>
    where
        S: CohortSource + RunSink,
        <S as CohortSource>::Error: Display,
        <S as RunSink>::Error: Display,
    {
        let parent = self.load(&*store, run_id)?;
        let assignment = parent.assignment.with_move(member, from, to)?;

        let mut run = Run::derived_from(&parent.run);
        info!(
            run_id = %run.id,
            parent = %parent.run.id,
            member = %member,
            from = %from,
            to = %to,
            "Reallocation run created"
        );
        advance(&mut run, RunStage::Allocated)?;

        let (graph, diagnostics) = self
            .builder
            .build_for_assignment(&*store, &run.cohort, &assignment)?;
        log_diagnostics(&run, &diagnostics);
        let report = self.analyzer.analyze(&graph, &assignment)?;
        let averages = group_averages(&graph, &assignment, &self.config.allocator.tracked_attributes)?;
        advance(&mut run, RunStage::Analyzed)?;

        let balanced = assignment.is_balanced();
        if !balanced {
            warn!(run_id = %run.id, "Manual move leaves group sizes unbalanced");
        }

        let record = RunRecord {
            run: run.clone(),
            assignment,
            preservation: report.records,
            intra_group_edges: report.intra_group_edges,
            group_averages: averages,
        };
        store
            .persist_run(&record)
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;
        advance(&mut run, RunStage::Persisted)?;

        Ok(ReallocationResult {
            new_run_id: run.id,
            parent_run_id: parent.run.id,
            groups: record.assignment.groups(),
            balanced,
            diagnostics,
        })
    }

    /// Recompute preservation, centrality and profiles for a stored run
    ///
    /// Uses the most recent run when `run_id` is `None`. Only the run's
    /// assigned members take part; membership drift since the run shows up
    /// in the returned diagnostics.
    pub fn analyze<S>(&self, store: &S, run_id: Option<RunId>) -> Result<AnalysisResult, PipelineError>
    where
        S: CohortSource + RunSink,
        <S as CohortSource>::Error: Display,
        <S as RunSink>::Error: Display,
    {
        let run_id = match run_id {
            Some(id) => id,
            None => {
                store
                    .latest_run(None)
                    .map_err(|e| PipelineError::Persistence(e.to_string()))?
                    .ok_or_else(|| PipelineError::Config("no runs have been stored yet".to_string()))?
                    .id
            }
        };
        let record = self.load(store, run_id)?;

        let (graph, diagnostics) = self
            .builder
            .build_for_assignment(store, &record.run.cohort, &record.assignment)?;
        log_diagnostics(&record.run, &diagnostics);
        let report = self.analyzer.analyze(&graph, &record.assignment)?;
        let profiles = group_profiles(
            &graph,
            &record.assignment,
            &self.config.allocator.tracked_attributes,
            self.analyzer.config(),
        )?;
        info!(run_id = %record.run.id, cohort = %record.run.cohort, "Run analyzed");

        Ok(AnalysisResult {
            run: record.run,
            report,
            profiles,
            diagnostics,
        })
    }

    /// Stored runs, newest first
    pub fn runs<S>(&self, store: &S, cohort: Option<&str>) -> Result<Vec<Run>, PipelineError>
    where
        S: RunSink,
        S::Error: Display,
    {
        let query = RunQuery {
            cohort: cohort.map(str::to_string),
            limit: None,
        };
        store
            .list_runs(&query)
            .map_err(|e| PipelineError::Persistence(e.to_string()))
    }

    /// Load a stored run, failing if it does not exist
    pub fn load<S>(&self, store: &S, run_id: RunId) -> Result<RunRecord, PipelineError>
    where
        S: RunSink,
        S::Error: Display,
    {
        store
            .load_run(run_id)
            .map_err(|e| PipelineError::Persistence(e.to_string()))?
            .ok_or_else(|| PipelineError::Config(format!("run {} not found", run_id)))
    }

    fn embed(&self, graph: &CohortGraph) -> Result<Embeddings, PipelineError> {
        let Some(cache) = &self.cache else {
            return Ok(self.encoder.encode(graph)?);
        };

        if let Some(hit) = lock(cache)?.lookup(graph, &self.encoder) {
            return Ok(hit);
        }
        let embeddings = self.encoder.encode(graph)?;
        lock(cache)?.store(graph, &self.encoder, embeddings.clone());
        Ok(embeddings)
    }
}

fn lock(cache: &Mutex<EmbeddingCache>) -> Result<std::sync::MutexGuard<'_, EmbeddingCache>, PipelineError> {
    cache
        .lock()
        .map_err(|_| PipelineError::Worker("embedding cache lock poisoned".to_string()))
}

fn advance(run: &mut Run, stage: RunStage) -> Result<(), PipelineError> {
    run.advance(stage)?;
    info!(run_id = %run.id, cohort = %run.cohort, stage = %stage, "Run stage reached");
    Ok(())
}

fn log_diagnostics(run: &Run, diagnostics: &GraphDiagnostics) {
    if let Some(kind) = diagnostics.kind() {
        for message in diagnostics.messages() {
            warn!(run_id = %run.id, kind = %kind, "{}", message);
        }
    }
}
