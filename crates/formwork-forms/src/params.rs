//! The raw input boundary.
//!
//! Raw input arrives as a nested mapping whose keys may be spelled two ways:
//! string-form (`"email"`) or symbol-form (the configured
//! [`symbol_key_prefix`](formwork_core::Settings::symbol_key_prefix)
//! followed by the name, `":email"`). [`RawParams`] folds both spellings into
//! one canonical string key as soon as input enters the system, so the rest
//! of the pipeline only ever looks up plain names.
//!
//! When both spellings of a key are present:
//!
//! - at the top level (the form namespace) the symbol-form entry wins if it
//!   holds anything other than null;
//! - at every nested level (fields) the string-form entry wins if its value
//!   is present, otherwise a present symbol-form value is kept.

use indexmap::IndexMap;

use formwork_core::{Settings, Value};

/// A canonicalized, insertion-ordered parameter map.
///
/// # Examples
///
/// ```
/// use formwork_forms::params::RawParams;
///
/// let params = RawParams::from_json(serde_json::json!({
///     ":signup_form": { "name": "Alice", ":email": "a@example.com" }
/// }));
/// let form = params.namespace("signup_form");
/// assert_eq!(form.get("email").and_then(|v| v.as_str()), Some("a@example.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    map: IndexMap<String, Value>,
}

impl RawParams {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes raw input using the globally configured symbol prefix.
    ///
    /// Anything other than a map yields empty parameters.
    pub fn from_value(value: Value) -> Self {
        Self::from_value_with_prefix(value, &Settings::current().symbol_key_prefix)
    }

    /// Canonicalizes raw input using an explicit symbol prefix.
    pub fn from_value_with_prefix(value: Value, symbol_prefix: &str) -> Self {
        match value {
            Value::Map(map) => Self {
                map: canonicalize(map, symbol_prefix, 0),
            },
            _ => Self::default(),
        }
    }

    /// Canonicalizes a decoded JSON body.
    pub fn from_json(json: serde_json::Value) -> Self {
        Self::from_value(Value::from(json))
    }

    /// Parses an `application/x-www-form-urlencoded` body or query string.
    ///
    /// Bracketed keys nest (`signup_form[name]=Alice`), a trailing `[]`
    /// collects repeated values into a list (`signup_form[tags][]=a`), and a
    /// plain key that repeats keeps its last value. Keys with unbalanced
    /// brackets, or nested more than 100 levels deep, are kept verbatim.
    pub fn from_query_string(query_string: &str) -> Self {
        let mut root = IndexMap::new();

        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            let key = percent_decode(key);
            let segments = split_key(&key);
            insert_path(&mut root, &segments, Value::String(percent_decode(value)));
        }

        Self::from_value(Value::Map(root))
    }

    /// Returns the value stored under a canonical key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Returns `true` if the canonical key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts a value under an already-canonical key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(key.into(), value.into());
    }

    /// Resolves the nested map stored under `key`.
    ///
    /// Returns empty parameters when the key is absent or does not hold a map.
    pub fn namespace(&self, key: &str) -> Self {
        match self.map.get(key) {
            Some(Value::Map(inner)) => Self { map: inner.clone() },
            _ => Self::default(),
        }
    }

    /// Returns the number of top-level keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.map.iter()
    }

    /// Borrows the underlying map.
    pub const fn as_map(&self) -> &IndexMap<String, Value> {
        &self.map
    }

    /// Converts the parameters back into a [`Value::Map`].
    pub fn into_value(self) -> Value {
        Value::Map(self.map)
    }
}

impl From<Value> for RawParams {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<serde_json::Value> for RawParams {
    fn from(json: serde_json::Value) -> Self {
        Self::from_json(json)
    }
}

impl From<IndexMap<String, Value>> for RawParams {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::from_value(Value::Map(map))
    }
}

impl From<&Self> for RawParams {
    fn from(params: &Self) -> Self {
        params.clone()
    }
}

// ============================================================
// Canonicalization
// ============================================================

#[derive(Default)]
struct KeyForms {
    symbol: Option<Value>,
    string: Option<Value>,
}

fn canonicalize(map: IndexMap<String, Value>, prefix: &str, depth: usize) -> IndexMap<String, Value> {
    let mut grouped: IndexMap<String, KeyForms> = IndexMap::new();

    for (key, value) in map {
        let value = canonicalize_value(value, prefix, depth + 1);
        let symbol_name = if prefix.is_empty() {
            None
        } else {
            key.strip_prefix(prefix).map(str::to_string)
        };
        match symbol_name {
            Some(name) => grouped.entry(name).or_default().symbol = Some(value),
            None => grouped.entry(key).or_default().string = Some(value),
        }
    }

    grouped
        .into_iter()
        .map(|(key, forms)| {
            let value = if depth == 0 {
                resolve_namespace(forms)
            } else {
                resolve_field(forms)
            };
            (key, value)
        })
        .collect()
}

fn canonicalize_value(value: Value, prefix: &str, depth: usize) -> Value {
    match value {
        Value::Map(inner) => Value::Map(canonicalize(inner, prefix, depth)),
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| canonicalize_value(item, prefix, depth))
                .collect(),
        ),
        other => other,
    }
}

fn resolve_namespace(forms: KeyForms) -> Value {
    match (forms.symbol, forms.string) {
        (Some(symbol), _) if !symbol.is_null() => symbol,
        (_, Some(string)) => string,
        (symbol, None) => symbol.unwrap_or_default(),
    }
}

fn resolve_field(forms: KeyForms) -> Value {
    match (forms.symbol, forms.string) {
        (_, Some(string)) if string.is_present() => string,
        (Some(symbol), _) if symbol.is_present() => symbol,
        (symbol, string) => string.or(symbol).unwrap_or_default(),
    }
}

// ============================================================
// Query string helpers
// ============================================================

/// Deepest bracket nesting accepted in a query-string key.
const MAX_PARAM_DEPTH: usize = 100;

/// Splits `a[b][]` into `["a", "b", ""]`.
///
/// Keys nested deeper than [`MAX_PARAM_DEPTH`] are kept verbatim as a single
/// segment, which keeps the recursive insert and canonicalize passes bounded.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return vec![key.to_string()];
        };
        let Some(close) = inner.find(']') else {
            return vec![key.to_string()];
        };
        if segments.len() > MAX_PARAM_DEPTH {
            return vec![key.to_string()];
        }
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    segments
}

fn insert_path(map: &mut IndexMap<String, Value>, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        map.insert(head.clone(), value);
        return;
    }

    if rest.len() == 1 && rest[0].is_empty() {
        let slot = map.entry(head.clone()).or_insert_with(|| Value::List(Vec::new()));
        match slot {
            Value::List(items) => items.push(value),
            other => *other = Value::List(vec![value]),
        }
        return;
    }

    let slot = map
        .entry(head.clone())
        .or_insert_with(|| Value::Map(IndexMap::new()));
    if !matches!(slot, Value::Map(_)) {
        *slot = Value::Map(IndexMap::new());
    }
    if let Value::Map(inner) = slot {
        insert_path(inner, rest, value);
    }
}

/// Decodes a percent-encoded string.
fn percent_decode(input: &str) -> String {
    // Replace + with space (form encoding), then decode percent sequences
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(json: serde_json::Value) -> RawParams {
        RawParams::from_value_with_prefix(Value::from(json), ":")
    }

    #[test]
    fn test_namespace_string_key() {
        let p = params(json!({"form": {"name": "Alice"}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_namespace_symbol_key() {
        let p = params(json!({":form": {"name": "Alice"}}));
        assert!(p.contains_key("form"));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_namespace_symbol_wins_at_top_level() {
        let p = params(json!({"form": {"name": "string"}, ":form": {"name": "symbol"}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("symbol")));
    }

    #[test]
    fn test_namespace_null_symbol_falls_back_to_string() {
        let p = params(json!({":form": null, "form": {"name": "string"}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("string")));
    }

    #[test]
    fn test_namespace_missing_or_scalar_is_empty() {
        let p = params(json!({"other": {"name": "x"}, "form": "not a map"}));
        assert!(p.namespace("missing").is_empty());
        assert!(p.namespace("form").is_empty());
    }

    #[test]
    fn test_field_string_wins_when_present() {
        let p = params(json!({"form": {":name": "sym", "name": "str"}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("str")));
    }

    #[test]
    fn test_field_blank_string_keeps_symbol() {
        let p = params(json!({"form": {":name": "sym", "name": "  "}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("sym")));
    }

    #[test]
    fn test_field_both_blank_keeps_string() {
        let p = params(json!({"form": {":name": null, "name": ""}}));
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("")));
    }

    #[test]
    fn test_key_order_follows_first_appearance() {
        let p = params(json!({"form": {"b": "1", ":a": "2", "a": "3", "c": "4"}}));
        let ns = p.namespace("form");
        let keys: Vec<&str> = ns.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_non_map_input_is_empty() {
        assert!(RawParams::from_value_with_prefix(Value::from("x"), ":").is_empty());
    }

    #[test]
    fn test_custom_prefix() {
        let p = RawParams::from_value_with_prefix(Value::from(json!({"@form": {"@name": "x"}})), "@");
        assert_eq!(p.namespace("form").get("name"), Some(&Value::from("x")));
    }

    #[test]
    fn test_query_string_nested() {
        let p = RawParams::from_query_string("signup_form[name]=Alice+Smith&signup_form[email]=a%40b.com");
        let ns = p.namespace("signup_form");
        assert_eq!(ns.get("name"), Some(&Value::from("Alice Smith")));
        assert_eq!(ns.get("email"), Some(&Value::from("a@b.com")));
    }

    #[test]
    fn test_query_string_lists() {
        let p = RawParams::from_query_string("f[tags][]=a&f[tags][]=b&plain=1&plain=2");
        assert_eq!(
            p.namespace("f").get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(p.get("plain"), Some(&Value::from("2")));
    }

    #[test]
    fn test_query_string_malformed_key_kept_verbatim() {
        let p = RawParams::from_query_string("f[name=x&[odd]=y&&empty");
        assert_eq!(p.get("f[name"), Some(&Value::from("x")));
        assert_eq!(p.get("[odd]"), Some(&Value::from("y")));
        assert_eq!(p.get("empty"), Some(&Value::from("")));
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a"), vec!["a"]);
        assert_eq!(split_key("a[b][]"), vec!["a", "b", ""]);
        assert_eq!(split_key("a[b]c"), vec!["a[b]c"]);
    }

    #[test]
    fn test_split_key_depth_limit() {
        let at_limit = format!("f{}", "[a]".repeat(MAX_PARAM_DEPTH));
        assert_eq!(split_key(&at_limit).len(), MAX_PARAM_DEPTH + 1);

        let past_limit = format!("f{}", "[a]".repeat(MAX_PARAM_DEPTH + 1));
        assert_eq!(split_key(&past_limit), vec![past_limit.clone()]);
    }

    #[test]
    fn test_query_string_deep_nesting_is_flattened() {
        let key = format!("f{}", "[a]".repeat(200_000));
        let p = RawParams::from_query_string(&format!("{key}=x&g[b]=y"));

        assert_eq!(p.get(&key), Some(&Value::from("x")));
        assert!(p.namespace("f").is_empty());
        assert_eq!(p.namespace("g").get("b"), Some(&Value::from("y")));
    }

    #[test]
    fn test_into_value_roundtrip() {
        let mut p = RawParams::new();
        p.insert("name", "Alice");
        assert_eq!(p.len(), 1);
        let value = p.clone().into_value();
        assert_eq!(value.as_map().unwrap()["name"], Value::from("Alice"));
    }
}
