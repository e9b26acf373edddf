//! 并发调度（dispatch）
//!
//! 每个非空 WorkerPlan 对应一个并发工作者任务，严格按分配顺序逐批
//! 调用传输方的批量发送；协调器在全部工作者结束后聚合为 `DispatchReport`。
//! 观察通过 `DispatchNotice` 消息通道完成：协调器在任何任务启动前按
//! 工作者序号发出 `WorkerStarting`，批次级通知经由同一通道自然全序化，
//! 通知失败不影响调度正确性。
//!
//! 批次失败策略由 `FailurePolicy` 显式配置：默认 `CollectAll` 逐批
//! 记录失败并继续；`FailFast` 在首个失败后取消共享令牌，其余工作者
//! 在批次间察觉后提前结束。工作者在自身批次循环结束后立即完成，
//! 不等待任何外部取消信号。
//!
use crate::error::ClientError;
use crate::event::{Event, EventBatch};
use crate::sender::partition::WorkerPlan;
use crate::transport::EventTransport;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 批次发送失败时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 首个失败即取消全部工作者
    FailFast,
    /// 逐批收集失败，所有工作者跑完自己的计划（默认）
    #[default]
    CollectAll,
}

/// 调度过程的结构化观察通知
#[derive(Debug)]
pub enum DispatchNotice {
    /// 工作者即将开始，携带其计划内的事件总数
    WorkerStarting { worker: usize, event_count: u64 },
    /// 某批次发送成功
    BatchSent { worker: usize, event_count: usize },
    /// 某批次发送失败
    BatchFailed { worker: usize, event_count: usize },
    /// 单事件路径：事件即将发送
    MessageSending { event: Event },
    /// 单事件路径：事件已发送
    MessageSent { event: Event },
}

/// 单个批次的失败记录
#[derive(Debug)]
pub struct BatchFailure {
    pub worker: usize,
    pub batch_index: usize,
    pub event_count: usize,
    pub error: ClientError,
}

/// 一次调度的聚合结果
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub batches_sent: usize,
    pub events_sent: u64,
    pub failures: Vec<BatchFailure>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: DispatchReport) {
        self.batches_sent += other.batches_sent;
        self.events_sent += other.events_sent;
        self.failures.extend(other.failures);
    }
}

pub(crate) fn notify(notices: &Option<UnboundedSender<DispatchNotice>>, notice: DispatchNotice) {
    if let Some(tx) = notices {
        // 接收端关闭不影响调度
        let _ = tx.send(notice);
    }
}

/// 并发执行全部工作者计划并等待其完成
pub(crate) async fn dispatch(
    transport: Arc<dyn EventTransport>,
    plans: Vec<WorkerPlan>,
    max_envelope_size: usize,
    policy: FailurePolicy,
    notices: Option<UnboundedSender<DispatchNotice>>,
    token: &CancellationToken,
) -> DispatchReport {
    // 启动通知先于任何任务派生，保证按工作者序号的确定顺序
    for (worker, plan) in plans.iter().enumerate() {
        notify(
            &notices,
            DispatchNotice::WorkerStarting {
                worker,
                event_count: plan.total_events(),
            },
        );
    }

    let child = token.child_token();
    let mut planned = Vec::with_capacity(plans.len());
    let mut handles = Vec::with_capacity(plans.len());
    for (worker, plan) in plans.into_iter().enumerate() {
        planned.push(plan.total_events());
        handles.push(tokio::spawn(run_worker(
            worker,
            plan,
            transport.clone(),
            max_envelope_size,
            policy,
            notices.clone(),
            child.clone(),
        )));
    }

    let mut report = DispatchReport::default();
    for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(partial) => report.merge(partial),
            Err(err) => {
                // 任务中止丢失局部结果，整份计划记为失败以保持事件收支平衡
                warn!(worker, error = %err, "dispatch worker task aborted");
                report.failures.push(BatchFailure {
                    worker,
                    batch_index: 0,
                    event_count: planned[worker] as usize,
                    error: ClientError::transport(format!("worker task aborted: {err}")),
                });
            }
        }
    }

    report
}

async fn run_worker(
    worker: usize,
    plan: WorkerPlan,
    transport: Arc<dyn EventTransport>,
    max_envelope_size: usize,
    policy: FailurePolicy,
    notices: Option<UnboundedSender<DispatchNotice>>,
    token: CancellationToken,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (batch_index, events) in plan.into_batches().into_iter().enumerate() {
        if token.is_cancelled() {
            break;
        }

        let event_count = events.len();
        let batch = EventBatch::from_events(events, max_envelope_size);

        match transport.send_batch(&batch, &token).await {
            Ok(()) => {
                report.batches_sent += 1;
                report.events_sent += event_count as u64;
                notify(
                    &notices,
                    DispatchNotice::BatchSent {
                        worker,
                        event_count,
                    },
                );
            }
            Err(error) => {
                notify(
                    &notices,
                    DispatchNotice::BatchFailed {
                        worker,
                        event_count,
                    },
                );
                warn!(worker, batch_index, error = %error, "batch send failed");
                report.failures.push(BatchFailure {
                    worker,
                    batch_index,
                    event_count,
                    error,
                });

                if policy == FailurePolicy::FailFast {
                    token.cancel();
                    break;
                }
            }
        }
    }

    report
}
