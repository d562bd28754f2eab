use dss_types::{CanonicalRecord, Decision};

/// Result of a single pipeline stage.
#[derive(Clone, Debug, PartialEq)]
pub enum StageResult {
    /// Stage passed; continue to the next stage
    Pass,
    /// Stage reached a final decision; later stages are skipped
    Conclude(Decision),
    /// Record is incomplete; classification stops
    Undetermined {
        reason: String,
        missing_fields: Vec<String>,
    },
}

impl StageResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, StageResult::Pass)
    }

    /// Does this result end the pipeline?
    pub fn is_terminal(&self) -> bool {
        !self.is_pass()
    }
}

/// Context passed through the classification stages.
///
/// Owns the canonical record for the lifetime of one request.
pub struct ClassificationContext {
    /// The record being classified
    pub record: CanonicalRecord,
    /// Verbose mode: dump the record at debug level between stages
    pub debug: bool,
    /// Results from each stage (stage_name, result)
    pub stage_results: Vec<(String, StageResult)>,
}

impl ClassificationContext {
    pub fn new(record: CanonicalRecord, debug: bool) -> Self {
        Self {
            record,
            debug,
            stage_results: Vec::new(),
        }
    }

    /// Record a stage result.
    pub fn record_stage(&mut self, stage_name: impl Into<String>, result: StageResult) {
        self.stage_results.push((stage_name.into(), result));
    }

    /// Names of the stages that ran, in order.
    pub fn stages_run(&self) -> Vec<&str> {
        self.stage_results.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The terminal result, if any stage produced one.
    pub fn outcome(&self) -> Option<&StageResult> {
        self.stage_results
            .iter()
            .map(|(_, result)| result)
            .find(|result| result.is_terminal())
    }

    /// Log the record at debug level when verbose mode is on.
    pub fn dump_record(&self, checkpoint: &str) {
        if self.debug {
            tracing::debug!(
                checkpoint,
                record = %self.record.to_value(),
                "Canonical record"
            );
        }
    }
}
