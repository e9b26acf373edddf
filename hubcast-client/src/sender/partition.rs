//! 批次分配（partition）
//!
//! 把 N 个事件切分为至多 W 个工作者独占的有界批次序列。
//! 分配按轮次进行：每轮依序访问工作者 0..W-1，各追加一个至多 `limit`
//! 个事件的完整批次；当已消费量加 `limit` 达到总量时，剩余事件作为
//! 尾批追加到本轮最后一个收到批次的工作者，分配立即结束。
//!
//! 不变式：所有计划内全部批次的事件数之和恰等于 `total`；
//! 尾批的事件数由构造保证小于 `limit`。
//!
use crate::event::Event;

/// 单个工作者独占的批次序列
#[derive(Debug, Default)]
pub struct WorkerPlan {
    batches: Vec<Vec<Event>>,
}

impl WorkerPlan {
    pub fn batches(&self) -> &[Vec<Event>] {
        &self.batches
    }

    /// 该计划内全部批次的事件总数
    pub fn total_events(&self) -> u64 {
        self.batches.iter().map(|b| b.len() as u64).sum()
    }

    pub(crate) fn into_batches(self) -> Vec<Vec<Event>> {
        self.batches
    }
}

/// 将 `total` 个事件分配到至多 `workers` 个计划中
///
/// `supply(n)` 按需产出恰好 n 个事件（生成式）或从既有序列顺序取出
/// 至多 n 个（透传式）。事件不足 `total` 时提前结束，和不变式以实际
/// 产出为准。`total`、`workers` 或 `limit` 为零时返回空结果。
pub(crate) fn partition_events(
    total: u64,
    workers: usize,
    limit: u64,
    supply: &mut dyn FnMut(u64) -> Vec<Event>,
) -> Vec<WorkerPlan> {
    let mut plans: Vec<WorkerPlan> = Vec::new();

    if total == 0 || workers == 0 || limit == 0 {
        return plans;
    }

    let mut consumed = 0u64;
    loop {
        for worker in 0..workers {
            let take = limit.min(total - consumed);
            let batch = supply(take);
            if batch.is_empty() {
                return plans;
            }
            consumed += batch.len() as u64;

            if plans.len() == worker {
                plans.push(WorkerPlan::default());
            }
            plans[worker].batches.push(batch);

            if consumed + limit >= total {
                let left = total - consumed;
                if left > 0 {
                    let remainder = supply(left);
                    if let Some(last) = plans.last_mut() {
                        if !remainder.is_empty() {
                            last.batches.push(remainder);
                        }
                    }
                }
                return plans;
            }
        }
    }
}
