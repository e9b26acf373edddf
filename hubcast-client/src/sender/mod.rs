//! 发送子系统（sender）
//!
//! 面向分区事件流服务的发送端帮助器：
//! - `SenderConfig`：不可变配置值（`bon` 构建），由 `Sender::new` 一次性校验；
//! - `send_message`：顺序的单事件发送循环，首个传输错误即中止并返回；
//! - `send_batch_message`：生成式批量路径（探测 → 分批 → 并发调度）；
//! - `send_events_as_batch`：透传既有事件序列的批量路径，按最大事件探测。
//!
pub mod dispatch;
pub mod generate;
pub mod partition;
pub mod probe;

pub use dispatch::{BatchFailure, DispatchNotice, DispatchReport, FailurePolicy};
pub use partition::WorkerPlan;

use crate::error::{ClientError, ClientResult};
use crate::event::{DEFAULT_MAX_ENVELOPE_SIZE, Event};
use crate::transport::EventTransport;
use bon::Builder;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// 发送端配置（不可变值，校验在 `Sender::new` 中完成）
#[derive(Builder)]
pub struct SenderConfig {
    /// 连接目标，必填
    connection: String,
    /// 重复发送的消息条数（最小为 1）
    #[builder(default = 1)]
    number_of_messages: u64,
    /// 负载为 base64 文本，发送前先解码
    #[builder(default)]
    base64_payload: bool,
    /// 追加随机后缀保证重复发送内容唯一
    #[builder(default)]
    random_suffix: bool,
    /// 属性规格列表，形如 `"key:value"`，一条可用 `';'` 携带多组
    #[builder(default)]
    properties: Vec<String>,
    /// 目标分区列表（分区选择由传输方决定，此处仅随配置携带）
    #[builder(default)]
    partition_ids: Vec<String>,
    /// 批次失败策略，默认逐批收集
    #[builder(default)]
    failure_policy: FailurePolicy,
    /// 观察通知通道（可选）
    notices: Option<UnboundedSender<DispatchNotice>>,
    /// 信封编码尺寸上限
    #[builder(default = DEFAULT_MAX_ENVELOPE_SIZE)]
    max_envelope_size: usize,
}

/// 发送端：持有校验后的配置与传输协作方
pub struct Sender {
    transport: Arc<dyn EventTransport>,
    connection: String,
    number_of_messages: u64,
    base64_payload: bool,
    random_suffix: bool,
    properties: Vec<(String, String)>,
    partition_ids: Vec<String>,
    failure_policy: FailurePolicy,
    notices: Option<UnboundedSender<DispatchNotice>>,
    max_envelope_size: usize,
}

impl Sender {
    /// 校验配置并构造发送端；连接目标缺失时立即失败
    pub fn new(config: SenderConfig, transport: Arc<dyn EventTransport>) -> ClientResult<Self> {
        if config.connection.trim().is_empty() {
            return Err(ClientError::configuration("connection is required"));
        }

        Ok(Self {
            transport,
            connection: config.connection,
            number_of_messages: config.number_of_messages.max(1),
            base64_payload: config.base64_payload,
            random_suffix: config.random_suffix,
            properties: generate::parse_property_specs(&config.properties),
            partition_ids: config.partition_ids,
            failure_policy: config.failure_policy,
            notices: config.notices,
            max_envelope_size: config.max_envelope_size,
        })
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn partition_ids(&self) -> &[String] {
        &self.partition_ids
    }

    /// 以键值映射批量补充事件属性
    pub fn add_properties(&mut self, properties: HashMap<String, String>) {
        for (key, value) in properties {
            self.properties.push((key, value));
        }
    }

    /// 顺序发送 `number_of_messages` 条单事件；首个传输错误即返回
    pub async fn send_message(&self, message: &str, token: &CancellationToken) -> ClientResult<()> {
        for _ in 0..self.number_of_messages {
            let event = self.synthesize(message);

            dispatch::notify(
                &self.notices,
                DispatchNotice::MessageSending {
                    event: event.clone(),
                },
            );
            self.transport.send(&event, token).await?;
            dispatch::notify(&self.notices, DispatchNotice::MessageSent { event });
        }

        Ok(())
    }

    /// 生成式批量发送：探测上限、分批到工作者计划、并发调度
    ///
    /// 代表事件与真实事件同样方式合成（含属性与标志位处理），
    /// 保证探测结果对生成内容成立。
    pub async fn send_batch_message(
        &self,
        message: &str,
        token: &CancellationToken,
    ) -> ClientResult<DispatchReport> {
        let representative = self.synthesize(message);
        let limit = probe::probe_limit(&representative, self.max_envelope_size)?;

        let mut supply = |n: u64| (0..n).map(|_| self.synthesize(message)).collect::<Vec<_>>();
        let plans = partition::partition_events(
            self.number_of_messages,
            available_workers(),
            limit,
            &mut supply,
        );

        Ok(dispatch::dispatch(
            self.transport.clone(),
            plans,
            self.max_envelope_size,
            self.failure_policy,
            self.notices.clone(),
            token,
        )
        .await)
    }

    /// 透传批量发送：以集合内最大事件探测上限，保持调用方顺序
    pub async fn send_events_as_batch(
        &self,
        events: Vec<Event>,
        token: &CancellationToken,
    ) -> ClientResult<DispatchReport> {
        let limit = probe::probe_limit_for(&events, self.max_envelope_size)?;
        let total = events.len() as u64;

        let mut rest = events.into_iter();
        let mut supply = |n: u64| rest.by_ref().take(n as usize).collect::<Vec<_>>();
        let plans = partition::partition_events(total, available_workers(), limit, &mut supply);

        Ok(dispatch::dispatch(
            self.transport.clone(),
            plans,
            self.max_envelope_size,
            self.failure_policy,
            self.notices.clone(),
            token,
        )
        .await)
    }

    pub async fn close(&self, token: &CancellationToken) -> ClientResult<()> {
        self.transport.close(token).await
    }

    fn synthesize(&self, message: &str) -> Event {
        generate::synthesize_event(
            message,
            &self.properties,
            self.base64_payload,
            self.random_suffix,
        )
    }
}

/// 并发工作者数量：宿主可用并行度，探测失败时退化为 1
fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientResult;
    use crate::event::EventBatch;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SpyTransport {
        single_sends: AtomicUsize,
        fail_single_at: Option<usize>,
        closed: AtomicUsize,
    }

    #[async_trait]
    impl EventTransport for SpyTransport {
        async fn send(&self, _event: &Event, _token: &CancellationToken) -> ClientResult<()> {
            let n = self.single_sends.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = self.fail_single_at {
                if n == bad {
                    return Err(ClientError::transport("send rejected"));
                }
            }
            Ok(())
        }

        async fn send_batch(
            &self,
            _batch: &EventBatch,
            _token: &CancellationToken,
        ) -> ClientResult<()> {
            Ok(())
        }

        async fn close(&self, _token: &CancellationToken) -> ClientResult<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config() -> SenderConfig {
        SenderConfig::builder()
            .connection("endpoint://sample".to_string())
            .build()
    }

    #[test]
    fn missing_connection_fails_fast() {
        let config = SenderConfig::builder().connection("  ".to_string()).build();
        let result = Sender::new(config, Arc::new(SpyTransport::default()));
        assert!(matches!(
            result.err(),
            Some(ClientError::Configuration { .. })
        ));
    }

    #[test]
    fn message_count_floors_at_one() {
        let config = SenderConfig::builder()
            .connection("endpoint://sample".to_string())
            .number_of_messages(0)
            .build();
        let sender = Sender::new(config, Arc::new(SpyTransport::default())).expect("sender");
        assert_eq!(sender.number_of_messages, 1);
    }

    #[test]
    fn property_specs_are_parsed_once_at_construction() {
        let config = SenderConfig::builder()
            .connection("endpoint://sample".to_string())
            .properties(vec!["a:1;b:2".to_string(), "broken".to_string()])
            .build();
        let sender = Sender::new(config, Arc::new(SpyTransport::default())).expect("sender");
        assert_eq!(sender.properties.len(), 2);
    }

    #[test]
    fn add_properties_merges_map_entries() {
        let mut sender = Sender::new(config(), Arc::new(SpyTransport::default())).expect("sender");
        let mut extra = HashMap::new();
        extra.insert("messageId".to_string(), "1234".to_string());
        sender.add_properties(extra);
        assert_eq!(sender.properties.len(), 1);
    }

    #[tokio::test]
    async fn send_message_repeats_number_of_messages_times() {
        let transport = Arc::new(SpyTransport::default());
        let config = SenderConfig::builder()
            .connection("endpoint://sample".to_string())
            .number_of_messages(5)
            .build();
        let sender = Sender::new(config, transport.clone()).expect("sender");

        sender
            .send_message("hello", &CancellationToken::new())
            .await
            .expect("all sends succeed");
        assert_eq!(transport.single_sends.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn first_single_send_error_aborts_the_loop() {
        let transport = Arc::new(SpyTransport {
            fail_single_at: Some(2),
            ..Default::default()
        });
        let config = SenderConfig::builder()
            .connection("endpoint://sample".to_string())
            .number_of_messages(10)
            .build();
        let sender = Sender::new(config, transport.clone()).expect("sender");

        let err = sender
            .send_message("hello", &CancellationToken::new())
            .await
            .expect_err("third send fails");
        assert!(matches!(err, ClientError::Transport { .. }));
        // 第 3 次发送失败后循环终止
        assert_eq!(transport.single_sends.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn close_delegates_to_transport() {
        let transport = Arc::new(SpyTransport::default());
        let sender = Sender::new(config(), transport.clone()).expect("sender");
        sender.close(&CancellationToken::new()).await.expect("close");
        assert_eq!(transport.closed.load(Ordering::SeqCst), 1);
    }
}
