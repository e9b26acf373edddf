//! 事件模型（Event / EventBatch）
//!
//! 定义事件在客户端的标准形态与批量信封：
//! - `Event`：构造后不可变的负载（字节序列）与字符串属性映射；
//! - `EventBatch`：有编码尺寸上限的有序事件信封，`try_add` 负责尺寸核算；
//! - 信封的编码尺寸以 JSON 序列化长度度量，探测与分批均以此为准。
//!
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// 信封默认最大编码尺寸（1 MiB）
pub const DEFAULT_MAX_ENVELOPE_SIZE: usize = 1_048_576;

/// 预留的信封帧头安全余量（字节）
pub const SIZE_SAFETY_MARGIN: usize = 100;

/// 事件：构造后不可变的负载与属性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// 事件负载，原始字节序列
    payload: Vec<u8>,
    /// 属性映射，键在单个事件内唯一
    properties: HashMap<String, String>,
}

impl Event {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            properties: HashMap::new(),
        }
    }

    /// 链式附加一个属性（构造期使用）
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// 该事件单独编码后的字节数
    pub fn encoded_size(&self) -> ClientResult<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

/// 批量信封：有序、受编码尺寸上限约束的事件序列
#[derive(Debug, Serialize)]
pub struct EventBatch {
    id: Uuid,
    events: Vec<Event>,
    #[serde(skip)]
    max_size: usize,
    #[serde(skip)]
    encoded_size: usize,
}

impl EventBatch {
    /// 创建一个空信封，`max_size` 为编码尺寸上限
    pub fn new(max_size: usize) -> Self {
        let mut batch = Self {
            id: Uuid::new_v4(),
            events: Vec::new(),
            max_size,
            encoded_size: 0,
        };
        // 空信封自身的框架开销也计入尺寸
        batch.encoded_size = serde_json::to_vec(&batch).map(|b| b.len()).unwrap_or(0);
        batch
    }

    /// 以默认上限创建空信封
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_MAX_ENVELOPE_SIZE)
    }

    /// 尝试加入一个事件；超出尺寸上限时拒绝并返回 `Encoding` 错误
    pub fn try_add(&mut self, event: Event) -> ClientResult<()> {
        let event_size = event.encoded_size()?;
        // JSON 数组的分隔符：首个元素无需逗号
        let extra = event_size + if self.events.is_empty() { 0 } else { 1 };

        if self.encoded_size + extra > self.max_size {
            return Err(ClientError::encoding(format!(
                "event of {} bytes does not fit: batch at {} of {} bytes",
                event_size, self.encoded_size, self.max_size
            )));
        }

        self.events.push(event);
        self.encoded_size += extra;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 当前编码尺寸（含空信封的框架开销）
    pub fn encoded_size(&self) -> usize {
        self.encoded_size
    }

    /// 从既有事件序列组装信封（调度端使用，事件数已由分批器约束）
    pub(crate) fn from_events(events: Vec<Event>, max_size: usize) -> Self {
        let mut batch = Self::new(max_size);
        for (i, event) in events.iter().enumerate() {
            if let Ok(size) = event.encoded_size() {
                batch.encoded_size += size + usize::from(i > 0);
            }
        }
        batch.events = events;
        batch
    }
}
