//! 分区事件流客户端帮助器（hubcast-client）
//!
//! 面向分区事件流服务的发布/消费帮助库，核心是：
//! - 批量发送引擎（`sender`）：尺寸探测（`probe`）、批次分配（`partition`）
//!   与并发调度（`dispatch`），把大量生成或既有事件高效交付传输方；
//! - 过滤决策流水线（`receiver::filter`）：入站事件在到达用户处理器前
//!   经过数据/属性两类谓词的纯同步决策。
//!
//! 本 crate 不绑定具体网络实现：连接生命周期、线协议与重试均委托给
//! `transport` 模块定义的 `EventTransport` / `EventSource` 协作方，
//! 可对接任意消息系统或内存实现。
//!
//! 典型用法：
//! 1. 以 `SenderConfig::builder()` 构造配置并由 `Sender::new` 校验；
//! 2. `send_batch_message` 批量发送生成内容，或 `send_events_as_batch`
//!    透传既有事件，结果见返回的 `DispatchReport`；
//! 3. 以 `ReceiverConfig::builder()` 配置过滤与处理器，`start_listener`
//!    订阅目标分区。
//!
pub mod error;
pub mod event;
pub mod receiver;
pub mod sender;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use event::{DEFAULT_MAX_ENVELOPE_SIZE, Event, EventBatch, SIZE_SAFETY_MARGIN};
pub use receiver::{DEFAULT_CONSUMER_GROUP, FilterSet, PropertyFilter, Receiver, ReceiverConfig};
pub use sender::{
    BatchFailure, DispatchNotice, DispatchReport, FailurePolicy, Sender, SenderConfig, WorkerPlan,
};
pub use transport::{EventSource, EventTransport, ReceiveHandler, StartPosition};
