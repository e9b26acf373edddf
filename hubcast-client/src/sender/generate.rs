//! 事件合成（generate）
//!
//! 从消息模板、属性规格与标志位按需合成事件：
//! - 属性规格形如 `"key:value"`，一条规格可用 `';'` 携带多组键值；
//! - 可选随机后缀（`'-'` + 12 个随机字母）保证重复发送内容唯一；
//! - base64 标志位指示先解码再发送，解码失败时回退为原始字节。
//!
use crate::event::Event;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;

const SUFFIX_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 12;

/// 将属性规格解析为键值对；格式不合法的片段被静默跳过
pub(crate) fn parse_property_specs(specs: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for spec in specs {
        for entry in spec.split(';') {
            // 恰好 "key:value" 两段才有效，多余或缺失冒号的片段跳过
            let parts: Vec<&str> = entry.split(':').collect();
            match parts.as_slice() {
                [key, value] if !key.is_empty() => {
                    pairs.push((key.to_string(), value.to_string()));
                }
                _ => {}
            }
        }
    }

    pairs
}

/// 生成 `'-'` + 12 个随机大小写字母的后缀
fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    let mut suffix = String::with_capacity(SUFFIX_LEN + 1);
    suffix.push('-');
    for _ in 0..SUFFIX_LEN {
        let idx = rng.gen_range(0..SUFFIX_LETTERS.len());
        suffix.push(SUFFIX_LETTERS[idx] as char);
    }
    suffix
}

/// 按模板与标志位合成一个事件
///
/// 后缀先于 base64 处理附加；解码失败时发送原始文本字节。
pub(crate) fn synthesize_event(
    message: &str,
    properties: &[(String, String)],
    base64_payload: bool,
    with_suffix: bool,
) -> Event {
    let mut text = message.to_string();
    if with_suffix {
        text.push_str(&random_suffix());
    }

    let payload = if base64_payload {
        match BASE64.decode(text.as_bytes()) {
            Ok(decoded) => decoded,
            Err(_) => text.into_bytes(),
        }
    } else {
        text.into_bytes()
    };

    let mut event = Event::new(payload);
    for (key, value) in properties {
        event = event.with_property(key.clone(), value.clone());
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_specs_accepts_key_value_and_semicolon_lists() {
        let specs = vec![
            "messageId:1234".to_string(),
            "a:1;b:2".to_string(),
            "malformed".to_string(),
            ":novalue".to_string(),
            "too:many:colons".to_string(),
        ];

        let pairs = parse_property_specs(&specs);
        assert_eq!(
            pairs,
            vec![
                ("messageId".to_string(), "1234".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn suffix_adds_dash_and_twelve_letters() {
        let event = synthesize_event("msg", &[], false, true);
        let text = String::from_utf8(event.payload().to_vec()).expect("utf8 payload");

        assert_eq!(text.len(), "msg".len() + 1 + SUFFIX_LEN);
        assert_eq!(&text[3..4], "-");
        assert!(text[4..].bytes().all(|b| b.is_ascii_alphabetic()));
    }

    #[test]
    fn base64_payload_is_decoded_before_send() {
        // "aGVsbG8=" 解码为 "hello"
        let event = synthesize_event("aGVsbG8=", &[], true, false);
        assert_eq!(event.payload(), b"hello");
    }

    #[test]
    fn invalid_base64_falls_back_to_raw_bytes() {
        let event = synthesize_event("not-base64!!", &[], true, false);
        assert_eq!(event.payload(), b"not-base64!!");
    }

    #[test]
    fn synthesized_event_carries_parsed_properties() {
        let pairs = vec![("messageId".to_string(), "1234".to_string())];
        let event = synthesize_event("msg", &pairs, false, false);
        assert_eq!(event.property("messageId"), Some("1234"));
    }
}
