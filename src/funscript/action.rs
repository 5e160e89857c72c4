use serde::{Deserialize, Serialize};

/// A single point on a motion track: a position in `[0, 100]` at a time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub at_s: f32,
    pub pos: f32,
}

impl Action {
    pub fn new(at_s: f32, pos: f32) -> Self {
        Self { at_s, pos }
    }
}

/// Actions ordered by time with unique timestamps.
///
/// Inserting at a timestamp that already exists replaces the old action, the
/// same way the editor treats a point dropped on top of another one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunscriptArray {
    actions: Vec<Action>,
}

impl FunscriptArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions<I: IntoIterator<Item = Action>>(actions: I) -> Self {
        let mut arr = Self::new();
        for a in actions {
            arr.insert(a);
        }
        arr
    }

    pub fn insert(&mut self, action: Action) {
        // NaN timestamps can't be ordered
        if !action.at_s.is_finite() {
            return;
        }
        match self
            .actions
            .binary_search_by(|probe| probe.at_s.total_cmp(&action.at_s))
        {
            Ok(idx) => self.actions[idx] = action,
            Err(idx) => self.actions.insert(idx, action),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    pub fn first(&self) -> Option<&Action> {
        self.actions.first()
    }

    pub fn last(&self) -> Option<&Action> {
        self.actions.last()
    }

    /// Time of the last action, 0 for an empty script.
    pub fn duration(&self) -> f32 {
        self.last().map(|a| a.at_s.max(0.0)).unwrap_or(0.0)
    }
}

impl<'a> IntoIterator for &'a FunscriptArray {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_time_order() {
        let arr = FunscriptArray::from_actions([
            Action::new(2.0, 10.0),
            Action::new(0.5, 90.0),
            Action::new(1.0, 0.0),
        ]);
        let times: Vec<f32> = arr.iter().map(|a| a.at_s).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0]);
        assert_eq!(arr.duration(), 2.0);
    }

    #[test]
    fn duplicate_timestamp_replaces() {
        let mut arr = FunscriptArray::new();
        arr.insert(Action::new(1.0, 10.0));
        arr.insert(Action::new(1.0, 80.0));
        assert_eq!(arr.len(), 1);
        assert_eq!(arr.first().map(|a| a.pos), Some(80.0));
    }

    #[test]
    fn nan_time_is_dropped() {
        let mut arr = FunscriptArray::new();
        arr.insert(Action::new(f32::NAN, 10.0));
        assert!(arr.is_empty());
        assert_eq!(arr.duration(), 0.0);
    }
}
