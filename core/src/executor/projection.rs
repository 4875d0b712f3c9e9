//! Include/exclude field filtering of task results.

use serde_json::{Map, Value};

use super::types::{path_segments, ProjectionMode, ProjectionSpec};

/// Apply `spec` to a task result.
///
/// When the result looks like a transport envelope (an object whose `data`
/// field is an object or array) the filter targets that inner payload and the
/// envelope metadata is left intact.
pub fn apply(mut data: Value, spec: &ProjectionSpec) -> Value {
    if let Some(inner) = envelope_payload(&mut data) {
        let payload = inner.take();
        *inner = project(payload, spec);
        return data;
    }
    project(data, spec)
}

fn envelope_payload(data: &mut Value) -> Option<&mut Value> {
    match data {
        Value::Object(map) => map
            .get_mut("data")
            .filter(|inner| inner.is_object() || inner.is_array()),
        _ => None,
    }
}

/// Filter without envelope detection. Arrays are mapped element-wise.
pub fn project(value: Value, spec: &ProjectionSpec) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| project(v, spec)).collect()),
        Value::Object(map) => Value::Object(match spec.mode {
            ProjectionMode::Include => include(&map, &spec.fields),
            ProjectionMode::Exclude => exclude(map, &spec.fields),
        }),
        scalar => scalar,
    }
}

fn include(source: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    let mut out = Map::new();
    for field in fields {
        // A literal key wins over a dotted path.
        if let Some(value) = source.get(field) {
            out.insert(field.clone(), value.clone());
            continue;
        }
        let segments: Vec<&str> = path_segments(field).collect();
        pick(source, &mut out, &segments);
    }
    out
}

fn pick(source: &Map<String, Value>, target: &mut Map<String, Value>, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let Some(value) = source.get(*head) else {
        return;
    };
    if rest.is_empty() {
        target.insert(head.to_string(), value.clone());
        return;
    }
    let Value::Object(child) = value else {
        return;
    };
    if !has_path(child, rest) {
        return;
    }
    let slot = target
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(slot) = slot {
        pick(child, slot, rest);
    }
}

fn has_path(map: &Map<String, Value>, segments: &[&str]) -> bool {
    match segments.split_first() {
        None => true,
        Some((head, [])) => map.contains_key(*head),
        Some((head, rest)) => matches!(map.get(*head), Some(Value::Object(child)) if has_path(child, rest)),
    }
}

/// Exclusion drops both the literal key and the dotted path so that a second
/// pass never finds anything left to remove.
fn exclude(mut map: Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    for field in fields {
        map.remove(field);
        let segments: Vec<&str> = path_segments(field).collect();
        omit(&mut map, &segments);
    }
    map
}

fn omit(target: &mut Map<String, Value>, segments: &[&str]) {
    match segments {
        [] => {}
        [leaf] => {
            target.remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(child)) = target.get_mut(*head) {
                omit(child, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_unwrap_exclude() {
        let data = json!({"code": 0, "data": {"a": 1, "b": 2}});
        let out = apply(data, &ProjectionSpec::exclude(["b"]));
        assert_eq!(out, json!({"code": 0, "data": {"a": 1}}));
    }

    #[test]
    fn test_envelope_with_array_payload() {
        let data = json!({"code": 200, "msg": "ok", "data": [{"a": 1, "b": 2}, {"a": 3}]});
        let out = apply(data, &ProjectionSpec::include(["a"]));
        assert_eq!(out, json!({"code": 200, "msg": "ok", "data": [{"a": 1}, {"a": 3}]}));
    }

    #[test]
    fn test_scalar_data_field_is_not_an_envelope() {
        let data = json!({"data": "text", "code": 1, "extra": true});
        let out = apply(data, &ProjectionSpec::include(["data", "code"]));
        assert_eq!(out, json!({"data": "text", "code": 1}));
    }

    #[test]
    fn test_include_missing_fields_are_absent() {
        let out = project(json!({"a": 1, "b": 2}), &ProjectionSpec::include(["a", "z"]));
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_nested_paths() {
        let data = json!({"user": {"id": 1, "secret": "x", "profile": {"age": 3}}, "n": 0});
        let picked = project(data.clone(), &ProjectionSpec::include(["user.id", "user.nope.x"]));
        assert_eq!(picked, json!({"user": {"id": 1}}));

        let omitted = project(data, &ProjectionSpec::exclude(["user.secret", "n"]));
        assert_eq!(omitted, json!({"user": {"id": 1, "profile": {"age": 3}}}));
    }

    #[test]
    fn test_literal_dotted_key_wins_on_include() {
        let data = json!({"a.b": 1, "a": {"b": 2}});
        assert_eq!(project(data, &ProjectionSpec::include(["a.b"])), json!({"a.b": 1}));
    }

    #[test]
    fn test_exclude_drops_literal_and_path() {
        let spec = ProjectionSpec::exclude(["a.b"]);
        let once = project(json!({"a.b": 1, "a": {"b": 2, "c": 3}}), &spec);
        assert_eq!(once, json!({"a": {"c": 3}}));
        assert_eq!(project(once.clone(), &spec), once);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(apply(json!(5), &ProjectionSpec::include(["a"])), json!(5));
        assert_eq!(apply(Value::Null, &ProjectionSpec::exclude(["a"])), Value::Null);
    }

    #[test]
    fn test_include_is_idempotent() {
        let spec = ProjectionSpec::include(["a"]);
        let data = json!({"code": 0, "data": [{"a": 1, "b": 2}]});
        let once = apply(data, &spec);
        let twice = apply(once.clone(), &spec);
        assert_eq!(once, twice);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const KEYS: &[&str] = &["a", "b", "c", "data", "a.b"];
        const FIELDS: &[&str] = &["a", "b", "data", "a.b", "b.c", "a.b.c", "data.a", "a[0]"];

        fn leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                (-5i64..5).prop_map(Value::from),
                "[a-z]{0,3}".prop_map(Value::from),
            ]
        }

        fn value() -> impl Strategy<Value = Value> {
            leaf().prop_recursive(4, 48, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::vec((prop::sample::select(KEYS), inner), 0..5).prop_map(|entries| {
                        Value::Object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                    }),
                ]
            })
        }

        fn enveloped() -> impl Strategy<Value = Value> {
            prop_oneof![
                value(),
                (value(), -1i64..2).prop_map(|(data, code)| json!({"code": code, "msg": "ok", "data": data})),
            ]
        }

        fn spec() -> impl Strategy<Value = ProjectionSpec> {
            (any::<bool>(), prop::collection::vec(prop::sample::select(FIELDS), 0..4)).prop_map(
                |(include, fields)| {
                    if include {
                        ProjectionSpec::include(fields)
                    } else {
                        ProjectionSpec::exclude(fields)
                    }
                },
            )
        }

        proptest! {
            #[test]
            fn projection_is_idempotent(data in enveloped(), spec in spec()) {
                let once = apply(data, &spec);
                let twice = apply(once.clone(), &spec);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
