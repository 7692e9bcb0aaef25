// Merge Pipeline
//
// Concept: One full pass from uniform rows to the merged catalog
// Synchronization: Stages run strictly in order over one owned row table;
// each stage finishes its full pass before the next one starts.
//
// 1. Known-mistake replacements
// 2. Row standardization (names, binary labels, letters, measurements)
// 3. Alias-as-host unification
// 4. Identity resolution (external lookups)
// 5. Coordinate / binary-label conflict annotation
// 6. Group merge
// 7. Post-merge audit
// 8. Known brown dwarf split

use crate::audit::AuditLog;
use crate::error::MergeResult;
use crate::merge::{split_known_brown_dwarfs, GroupMerger, PostMergeAuditor};
use crate::normalize::{unify_alias_hosts, NameNormalizer, RowStandardizer};
use crate::resolve::{ConeResolver, IdentityResolver, NameResolver};
use crate::types::{MergedEntry, Row};
use crate::validate::ConflictDetector;
use emc_common::config::TomlConfig;
use emc_common::ReplacementPolicy;

/// Everything one run produces
#[derive(Debug)]
pub struct PipelineOutput {
    /// Merged catalog, sorted by display name
    pub catalog: Vec<MergedEntry>,
    /// Entries split off as known brown dwarfs
    pub brown_dwarfs: Vec<MergedEntry>,
    pub audit: AuditLog,
}

/// Merge pipeline over injected resolvers
pub struct MergePipeline<'a> {
    normalizer: NameNormalizer,
    names: &'a dyn NameResolver,
    cones: &'a dyn ConeResolver,
    cone_radii: Vec<f64>,
    detector: ConflictDetector,
    merger: GroupMerger,
    brown_dwarf_mass_limit: f64,
}

impl<'a> MergePipeline<'a> {
    pub fn new(
        policy: ReplacementPolicy,
        names: &'a dyn NameResolver,
        cones: &'a dyn ConeResolver,
        config: &TomlConfig,
    ) -> Self {
        Self {
            normalizer: NameNormalizer::new(policy),
            names,
            cones,
            cone_radii: config.resolver.cone_radii_deg.clone(),
            detector: ConflictDetector::new(config.merge.coordinate_tolerance_deg),
            merger: GroupMerger::new(config.merge.period_bins),
            brown_dwarf_mass_limit: config.merge.brown_dwarf_mass_limit,
        }
    }

    pub async fn run(&self, rows: Vec<Row>) -> MergeResult<PipelineOutput> {
        let mut audit = AuditLog::new();
        tracing::info!("Merge pipeline starting with {} rows", rows.len());

        // Step 1: manual corrections
        let mut rows = self.normalizer.apply_replacements(rows, &mut audit);

        // Step 2: standardization
        RowStandardizer::new(&self.normalizer).standardize(&mut rows);

        // Step 3: hosts that are aliases of other hosts
        unify_alias_hosts(&mut rows, &mut audit);

        // Step 4: canonical identifiers
        IdentityResolver::new(self.names, self.cones, self.cone_radii.clone())
            .resolve(&mut rows, &mut audit)
            .await;

        // Step 5: flags
        self.detector.annotate(&mut rows, &mut audit);

        // Step 6: merge
        let entries = self.merger.merge(&rows, &mut audit)?;

        // Step 7: letter reconciliation + duplicate flags
        let entries = PostMergeAuditor::new().audit_and_repair(entries, &mut audit);

        // Step 8: known brown dwarfs go to their own list
        let (catalog, brown_dwarfs) = split_known_brown_dwarfs(entries, self.brown_dwarf_mass_limit);

        tracing::info!(
            "Merge pipeline complete: {} entries, {} brown dwarfs, {} audit records",
            catalog.len(),
            brown_dwarfs.len(),
            audit.len()
        );

        Ok(PipelineOutput {
            catalog,
            brown_dwarfs,
            audit,
        })
    }
}
