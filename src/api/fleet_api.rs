// ==========================================
// 车队维保管理系统 - 车队汇总与巡检 API
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::Machine;
use crate::engine::{
    EvaluationReport, FleetBucket, FleetEvaluation, FleetSummary, FleetSummaryEngine,
    MachineStanding, ThresholdEvaluator,
};

pub struct FleetApi {
    summary_engine: Arc<FleetSummaryEngine>,
    evaluator: Arc<ThresholdEvaluator>,
}

impl FleetApi {
    pub fn new(summary_engine: Arc<FleetSummaryEngine>, evaluator: Arc<ThresholdEvaluator>) -> Self {
        Self {
            summary_engine,
            evaluator,
        }
    }

    /// 车队四桶计数
    pub fn summarize(&self) -> ApiResult<FleetSummary> {
        Ok(self.summary_engine.summarize()?)
    }

    /// 某一分桶内的机器
    pub fn list_bucket(&self, bucket: FleetBucket) -> ApiResult<Vec<Machine>> {
        Ok(self.summary_engine.list_bucket(bucket)?)
    }

    pub fn standings(&self) -> ApiResult<Vec<MachineStanding>> {
        Ok(self.summary_engine.standings()?)
    }

    /// 手动触发单机评估（会产生告警）
    pub fn evaluate_machine(&self, machine_id: i64) -> ApiResult<EvaluationReport> {
        Ok(self.evaluator.evaluate(machine_id)?)
    }

    /// 全车队巡检
    pub fn evaluate_fleet(&self) -> ApiResult<FleetEvaluation> {
        Ok(self.evaluator.evaluate_fleet()?)
    }
}
