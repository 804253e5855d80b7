use serde_json::Value;

/// 递归解码 JSON 中所有字符串里的 HTML 实体（对象键保持不变）。
pub fn decode_entities(value: &mut Value) {
    match value {
        Value::String(text) => {
            if text.contains('&') {
                *text = html_escape::decode_html_entities(text.as_str()).into_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(decode_entities),
        Value::Object(fields) => fields.values_mut().for_each(decode_entities),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::decode_entities;
    use serde_json::json;

    #[test]
    fn decodes_nested_strings() {
        let mut value = json!({
            "name": "5&amp;6",
            "rows": [{ "device": "&lt;core&gt;" }, "&quot;x&quot;", 3],
            "flag": true
        });
        decode_entities(&mut value);
        assert_eq!(
            value,
            json!({
                "name": "5&6",
                "rows": [{ "device": "<core>" }, "\"x\"", 3],
                "flag": true
            })
        );
    }
}
