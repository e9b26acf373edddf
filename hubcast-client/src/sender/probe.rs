//! 尺寸探测（probe）
//!
//! 经验性地发现一个信封最多可容纳多少个代表性事件：
//! 记录空信封尺寸 s0，加入代表事件后尺寸 s1，单事件尺寸为 s1 - s0，
//! `limit = (max_size - SIZE_SAFETY_MARGIN) / 单事件尺寸`。
//!
use crate::error::{ClientError, ClientResult};
use crate::event::{Event, EventBatch, SIZE_SAFETY_MARGIN};

/// 以代表事件探测单信封事件数上限
///
/// 代表事件无法放入空信封（负载与属性本身超限）时返回 `Encoding` 错误，
/// 调用方必须在任何调度开始前中止。
pub(crate) fn probe_limit(representative: &Event, max_size: usize) -> ClientResult<u64> {
    let mut envelope = EventBatch::new(max_size);
    let before = envelope.encoded_size();
    envelope.try_add(representative.clone())?;
    // 首个事件的增量不含数组分隔符，+1 使满批仍落在预算内
    let per_event = envelope.encoded_size() - before + 1;

    let budget = max_size.saturating_sub(SIZE_SAFETY_MARGIN);
    let limit = (budget / per_event) as u64;
    if limit == 0 {
        return Err(ClientError::encoding(format!(
            "event of {} bytes leaves no room under envelope budget of {} bytes",
            per_event, budget
        )));
    }

    Ok(limit)
}

/// 透传路径的探测变体：取事件集中编码尺寸最大者作为代表
///
/// 所有批次以最坏情况为界，因此算出的上限对集合内每个事件都安全。
pub(crate) fn probe_limit_for(events: &[Event], max_size: usize) -> ClientResult<u64> {
    let mut biggest: Option<&Event> = None;
    let mut biggest_size = 0usize;

    for event in events {
        if let Ok(size) = event.encoded_size() {
            if size > biggest_size || biggest.is_none() {
                biggest = Some(event);
                biggest_size = size;
            }
        }
    }

    let representative = biggest.ok_or_else(|| ClientError::encoding("no events to probe"))?;
    probe_limit(representative, max_size)
}
