//! Boundary test-case synthesis for activation rules.
//!
//! The synthesizer works on the validated rule trees of `brief-eval` and
//! uses that crate's evaluator as the oracle for every generated case.
//! Snapshots persist the cases for regression checking; the coverage
//! report summarizes what could and could not be generated.

pub mod boundary;
pub mod coverage;
pub mod snapshot;
pub mod synth;

pub use coverage::{CorpusCoverage, CoverageReport, CoverageStatus, RuleCoverage};
pub use snapshot::{
    CaseMismatch, RuleSnapshot, Snapshot, SnapshotCase, SnapshotError, Verification,
};
pub use synth::{
    synthesize, synthesize_all, synthesize_all_parallel, CaseLabel, RuleSynthesis, TestCase,
    Unsynthesizable,
};

use brief_eval::Registry;

/// Synthesize every active rule and aggregate coverage over the result.
pub fn analyze(registry: &Registry) -> (Vec<RuleSynthesis>, CoverageReport) {
    let syntheses = synthesize_all(registry);
    let report = coverage::build(registry, &syntheses);
    (syntheses, report)
}
