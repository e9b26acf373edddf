//! 传输协作方协议（EventTransport / EventSource）
//!
//! 定义客户端与外部传输实现之间的统一抽象：
//! - `EventTransport`：单事件发送、批量发送与连接关闭；
//! - `EventSource`：按分区订阅处理器、列举可用分区；
//! - `ReceiveHandler`：对入站事件进行消费处理。
//!
//! 该模块仅定义协议，不绑定具体网络实现，可对接任意消息系统或内存实现。
//!
use crate::error::ClientResult;
use crate::event::{Event, EventBatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 订阅起始位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// 从分区最早的事件开始
    Earliest,
    /// 仅接收订阅之后的事件
    Latest,
    /// 从给定时间戳开始
    Timestamp(DateTime<Utc>),
}

/// 事件传输：负责把事件与批量信封交付远端服务
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send(&self, event: &Event, token: &CancellationToken) -> ClientResult<()>;

    async fn send_batch(&self, batch: &EventBatch, token: &CancellationToken) -> ClientResult<()>;

    async fn close(&self, token: &CancellationToken) -> ClientResult<()>;
}

/// 事件来源：负责订阅分区并把入站事件交给处理器
#[async_trait]
pub trait EventSource: Send + Sync {
    /// 以给定消费组与起始位置订阅一个分区
    async fn subscribe(
        &self,
        partition_id: &str,
        handler: Arc<dyn ReceiveHandler>,
        consumer_group: &str,
        start_position: StartPosition,
    ) -> ClientResult<()>;

    /// 列举当前可用的全部分区
    async fn partition_ids(&self, token: &CancellationToken) -> ClientResult<Vec<String>>;

    async fn close(&self, token: &CancellationToken) -> ClientResult<()>;
}

/// 入站事件处理器
#[async_trait]
pub trait ReceiveHandler: Send + Sync {
    async fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}
