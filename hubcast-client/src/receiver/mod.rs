//! 接收子系统（receiver）
//!
//! 面向分区事件流服务的接收端帮助器：
//! - `ReceiverConfig`：不可变配置值（`bon` 构建），由 `Receiver::new` 一次性校验；
//! - `start_listener`：按配置分区（为空时取全部可用分区）订阅过滤处理器；
//! - `stop_listener`：关闭事件来源；
//! - 入站事件先经 `FilterSet` 决策，再到达用户处理器。
//!
pub mod filter;

pub use filter::{FilterSet, PropertyFilter};

use crate::error::{ClientError, ClientResult};
use crate::transport::{EventSource, ReceiveHandler, StartPosition};
use async_trait::async_trait;
use bon::Builder;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 未显式配置时使用的消费组
pub const DEFAULT_CONSUMER_GROUP: &str = "$Default";

/// 接收端配置（不可变值，校验在 `Receiver::new` 中完成）
#[derive(Builder)]
pub struct ReceiverConfig {
    /// 连接目标，必填
    connection: String,
    /// 消费组，留空时使用 `DEFAULT_CONSUMER_GROUP`
    #[builder(default)]
    consumer_group: String,
    /// 监听的分区列表，为空时监听全部可用分区
    #[builder(default)]
    partition_ids: Vec<String>,
    /// 数据过滤子串（OR 组合）
    #[builder(default)]
    data_filters: Vec<String>,
    /// 属性过滤规格（`"key:value"` 或裸值，OR 组合）
    #[builder(default)]
    property_filters: Vec<String>,
    /// 用户接收处理器
    handler: Arc<dyn ReceiveHandler>,
}

/// 接收端：持有校验后的配置、事件来源与过滤处理器
pub struct Receiver {
    source: Arc<dyn EventSource>,
    connection: String,
    consumer_group: String,
    partition_ids: Vec<String>,
    handler: Arc<FilteringHandler>,
}

/// 包裹用户处理器的过滤处理器：决策为 `None` 时静默丢弃
struct FilteringHandler {
    filters: FilterSet,
    inner: Arc<dyn ReceiveHandler>,
}

#[async_trait]
impl ReceiveHandler for FilteringHandler {
    async fn on_event(&self, event: &crate::event::Event) -> anyhow::Result<()> {
        match self.filters.decide(event) {
            Some(delivered) => self.inner.on_event(delivered).await,
            None => Ok(()),
        }
    }
}

impl Receiver {
    /// 校验配置并构造接收端；连接目标缺失时立即失败
    pub fn new(config: ReceiverConfig, source: Arc<dyn EventSource>) -> ClientResult<Self> {
        if config.connection.trim().is_empty() {
            return Err(ClientError::configuration("connection is required"));
        }

        let consumer_group = if config.consumer_group.trim().is_empty() {
            DEFAULT_CONSUMER_GROUP.to_string()
        } else {
            config.consumer_group
        };

        Ok(Self {
            source,
            connection: config.connection,
            consumer_group,
            partition_ids: config.partition_ids,
            handler: Arc::new(FilteringHandler {
                filters: FilterSet::new(config.data_filters, &config.property_filters),
                inner: config.handler,
            }),
        })
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    /// 订阅配置的分区；分区列表为空时先列举全部可用分区。
    /// 订阅从当前时间戳开始，首个订阅错误即返回。
    pub async fn start_listener(&self, token: &CancellationToken) -> ClientResult<()> {
        let partitions = if self.partition_ids.is_empty() {
            self.source.partition_ids(token).await?
        } else {
            self.partition_ids.clone()
        };

        for partition_id in &partitions {
            if let Err(err) = self
                .source
                .subscribe(
                    partition_id,
                    self.handler.clone(),
                    &self.consumer_group,
                    StartPosition::Timestamp(Utc::now()),
                )
                .await
            {
                warn!(partition = %partition_id, error = %err, "subscribe failed");
                return Err(err);
            }
        }

        Ok(())
    }

    /// 关闭事件来源，停止监听
    pub async fn stop_listener(&self, token: &CancellationToken) -> ClientResult<()> {
        self.source.close(token).await
    }
}
