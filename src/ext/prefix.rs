//! Prefix-key extraction: pull named attributes off a record and join them
//! with `:` into a message prefix, the way a request-scoped logger might
//! prepend `tenant:region` ahead of every line.

use crate::record::{Attribute, Value, MAX_LAZY_RESOLVE_DEPTH};

pub fn extract_prefix(keys: &[String], attrs: &[Attribute]) -> Option<String> {
    if keys.is_empty() {
        return None;
    }
    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        let value = attrs.iter().find(|a| &a.key == key).map(|a| match a.value.resolve(MAX_LAZY_RESOLVE_DEPTH) {
            Value::String(s) => s,
            other => format!("{other:?}"),
        });
        match value {
            Some(v) => parts.push(v),
            None => return None,
        }
    }
    Some(parts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_present_keys_with_colon() {
        let attrs = vec![Attribute::string("tenant", "acme"), Attribute::string("region", "us")];
        let keys = vec!["tenant".to_string(), "region".to_string()];
        assert_eq!(extract_prefix(&keys, &attrs), Some("acme:us".to_string()));
    }

    #[test]
    fn missing_key_yields_no_prefix() {
        let attrs = vec![Attribute::string("tenant", "acme")];
        let keys = vec!["tenant".to_string(), "region".to_string()];
        assert_eq!(extract_prefix(&keys, &attrs), None);
    }

    #[test]
    fn empty_key_list_yields_no_prefix() {
        assert_eq!(extract_prefix(&[], &[]), None);
    }
}
