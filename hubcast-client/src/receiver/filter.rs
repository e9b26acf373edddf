//! 过滤决策流水线（filter）
//!
//! 入站事件在到达用户处理器前经过一次纯同步的三分支决策：
//! 1. 配置了数据过滤时，负载命中任一子串即投递；
//! 2. 配置了属性过滤时（无论分支 1 是否命中），属性命中任一规则即投递，
//!    否则静默丢弃；
//! 3. 未配置属性过滤时无条件投递——即使分支 1 的数据过滤未命中。
//!
//! 分支 3 是沿袭下来的已知怪癖（数据过滤未命中仍投递），为兼容保留，
//! 是否修正有待产品决策。
//!
use crate::event::Event;

/// 属性过滤规则
///
/// `"key:value"` 形式要求键精确匹配、值子串匹配；其余形式作为裸值，
/// 对每个属性的值做子串匹配（任意键）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyFilter {
    KeyValue { key: String, value: String },
    AnyKey { value: String },
}

impl PropertyFilter {
    /// 解析一条属性过滤规格
    pub fn parse(spec: &str) -> Self {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() == 2 {
            PropertyFilter::KeyValue {
                key: parts[0].to_string(),
                value: parts[1].to_string(),
            }
        } else {
            PropertyFilter::AnyKey {
                value: spec.to_string(),
            }
        }
    }

    fn matches(&self, event: &Event) -> bool {
        match self {
            PropertyFilter::KeyValue { key, value } => event
                .property(key)
                .is_some_and(|actual| actual.contains(value)),
            PropertyFilter::AnyKey { value } => event
                .properties()
                .values()
                .any(|actual| actual.contains(value)),
        }
    }
}

/// 一个接收端的静态过滤规则集；同类规则之间按 OR 组合
#[derive(Debug, Default)]
pub struct FilterSet {
    data_filters: Vec<String>,
    property_filters: Vec<PropertyFilter>,
}

impl FilterSet {
    pub fn new(data_filters: Vec<String>, property_specs: &[String]) -> Self {
        Self {
            data_filters,
            property_filters: property_specs
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| PropertyFilter::parse(s))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_filters.is_empty() && self.property_filters.is_empty()
    }

    /// 对单个入站事件做投递决策；返回 `None` 表示静默丢弃
    pub fn decide<'a>(&self, event: &'a Event) -> Option<&'a Event> {
        if !self.data_filters.is_empty() && self.matches_data(event) {
            return Some(event);
        }

        if !self.property_filters.is_empty() {
            if self.matches_property(event) {
                return Some(event);
            }
            return None;
        }

        // 已知怪癖：数据过滤未命中但没有属性过滤时，仍然投递
        Some(event)
    }

    fn matches_data(&self, event: &Event) -> bool {
        let data = String::from_utf8_lossy(event.payload());
        self.data_filters.iter().any(|f| data.contains(f.as_str()))
    }

    fn matches_property(&self, event: &Event) -> bool {
        self.property_filters.iter().any(|f| f.matches(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event::new(b"hello filter1 world".to_vec())
    }

    #[test]
    fn parse_distinguishes_key_value_from_bare_value() {
        assert_eq!(
            PropertyFilter::parse("messageId:value1"),
            PropertyFilter::KeyValue {
                key: "messageId".to_string(),
                value: "value1".to_string(),
            }
        );
        assert_eq!(
            PropertyFilter::parse("value1"),
            PropertyFilter::AnyKey {
                value: "value1".to_string(),
            }
        );
        // 多个 ':' 不构成键值对，整体按裸值处理
        assert_eq!(
            PropertyFilter::parse("a:b:c"),
            PropertyFilter::AnyKey {
                value: "a:b:c".to_string(),
            }
        );
    }

    #[test]
    fn matching_data_filter_delivers() {
        let filters = FilterSet::new(vec!["filter1".to_string()], &[]);
        assert!(filters.decide(&event()).is_some());
    }

    #[test]
    fn unmatched_data_filter_without_property_filters_still_delivers() {
        // 怪癖分支：数据过滤未命中、无属性过滤 → 照常投递
        let filters = FilterSet::new(vec!["nomatch".to_string()], &[]);
        assert!(filters.decide(&event()).is_some());
    }

    #[test]
    fn property_match_delivers_after_data_miss() {
        let filters = FilterSet::new(vec!["nomatch".to_string()], &["value1".to_string()]);
        let event = event().with_property("messageId", "value1");
        assert!(filters.decide(&event).is_some());
    }

    #[test]
    fn key_value_filter_against_wrong_value_drops_silently() {
        let filters = FilterSet::new(Vec::new(), &["messageId:value2".to_string()]);
        let event = event().with_property("messageId", "value1");
        assert!(filters.decide(&event).is_none());
    }

    #[test]
    fn key_value_filter_matches_value_substring_with_exact_key() {
        let filters = FilterSet::new(Vec::new(), &["messageId:alu".to_string()]);
        let event = event().with_property("messageId", "value1");
        assert!(filters.decide(&event).is_some());

        // 键不同则不命中
        let other = self::event().with_property("otherKey", "value1");
        assert!(filters.decide(&other).is_none());
    }

    #[test]
    fn no_filters_configured_always_delivers() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert!(filters.decide(&event()).is_some());
    }

    #[test]
    fn bare_value_filter_scans_every_property() {
        let filters = FilterSet::new(Vec::new(), &["needle".to_string()]);
        let event = event()
            .with_property("a", "nothing")
            .with_property("b", "has-needle-inside");
        assert!(filters.decide(&event).is_some());
    }
}
