use crate::models::Detection;
use crate::planning::QueryState;
use std::collections::HashSet;

pub const MARKERS_PARAM: &str = "markers";

/// Detection ids chosen for a route.
///
/// Iteration follows insertion order, which becomes the stop order of the
/// computed route. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl PartialEq for SelectionSet {
    fn eq(&self, other: &Self) -> bool {
        self.ids.len() == other.ids.len() && self.ids.iter().all(|id| other.contains(id))
    }
}

impl Eq for SelectionSet {}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the comma-joined `markers` parameter. Blank entries and
    /// repeats are ignored.
    pub fn from_query(query: &QueryState) -> Self {
        query
            .get(MARKERS_PARAM)
            .map(|raw| raw.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }

    /// Writes the set back to `markers`, removing the parameter when empty.
    pub fn write_to(&self, query: &mut QueryState) {
        if self.ids.is_empty() {
            query.delete(MARKERS_PARAM);
        } else {
            query.set(MARKERS_PARAM, self.ids.join(","));
        }
    }

    /// Checks that `id` survives the `markers` codec unchanged: non-empty,
    /// no comma, no surrounding whitespace.
    pub fn check_id(id: &str) -> Result<(), String> {
        if id.is_empty() {
            return Err("Marker id must not be empty".to_string());
        }
        if id.contains(',') || id.trim() != id {
            return Err(format!(
                "Invalid marker id '{}': commas and surrounding whitespace are not allowed",
                id
            ));
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if id.is_empty() || self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Returns `false` if the id was not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: &str, selected: bool) {
        if selected {
            self.insert(id);
        } else {
            self.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Selected detections among `visible`, in selection order. Ids that do
    /// not match a visible detection are skipped.
    pub fn resolve<'a>(&self, visible: &'a [Detection]) -> Vec<&'a Detection> {
        self.ids
            .iter()
            .filter_map(|id| visible.iter().find(|d| &d.id == id))
            .collect()
    }

    /// The subset of this selection still present in `visible`.
    pub fn effective(&self, visible: &[Detection]) -> SelectionSet {
        let visible_ids: HashSet<&str> = visible.iter().map(|d| d.id.as_str()).collect();
        self.ids
            .iter()
            .filter(|id| visible_ids.contains(id.as_str()))
            .cloned()
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
