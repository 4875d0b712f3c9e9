use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accumulated successful results of one aggregate call, keyed by task id.
///
/// Grows monotonically: a key, once written, is never replaced or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task result. Returns false (and keeps the first value) if the
    /// id was already present.
    pub fn insert(&mut self, id: impl Into<String>, value: Value) -> bool {
        let id = id.into();
        if self.values.contains_key(&id) {
            return false;
        }
        self.values.insert(id, value);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }

    /// Look up a dotted path such as `user.profile.id` or `list[0].name`.
    ///
    /// The first segment names a task id; the rest walk into its result.
    /// Numeric segments index into arrays.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path_segments(path.trim());
        let head = segments.next()?;
        let mut current = self.values.get(head)?;
        for segment in segments {
            current = step(current, segment)?;
        }
        Some(current)
    }
}

impl From<Map<String, Value>> for ExecutionContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Split `a.b[0].c` into `a`, `b`, `0`, `c`. Empty segments are skipped.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
        .flat_map(|part| part.split('['))
        .map(|segment| segment.trim_end_matches(']'))
        .filter(|segment| !segment.is_empty())
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
