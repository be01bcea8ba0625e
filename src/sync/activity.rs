use std::collections::HashSet;

use serde_json::Value;

use crate::backend::payload::ActivityEvent;

/// Retained activity entries plus the incremental-fetch cursor.
#[derive(Debug)]
pub struct ActivityFeed {
    entries: Vec<ActivityEvent>,
    cursor: f64,
    retention: usize,
    page_size: usize,
}

fn numeric_id(id: &Value) -> Option<f64> {
    match id {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        _ => None,
    }
}

fn identity_key(id: &Value) -> String {
    match id {
        Value::Number(_) => match numeric_id(id) {
            Some(value) => format!("n:{value}"),
            None => format!("n:{id}"),
        },
        Value::String(text) => format!("s:{text}"),
        other => format!("j:{other}"),
    }
}

impl ActivityFeed {
    pub fn new(retention: usize, page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0.0,
            retention: retention.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Parameters for the next incremental fetch: `(since_id, limit)`.
    pub fn request(&self) -> (f64, usize) {
        (self.cursor, self.page_size)
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn entries(&self) -> &[ActivityEvent] {
        &self.entries
    }

    /// Prepends `batch`, drops repeated ids (first occurrence wins) and trims to the retention
    /// window. Returns how many entries of the batch were not already retained.
    pub fn merge(&mut self, batch: Vec<ActivityEvent>) -> usize {
        if let Some(batch_max) = batch
            .iter()
            .filter_map(|event| numeric_id(&event.id))
            .reduce(f64::max)
            && batch_max > self.cursor
        {
            self.cursor = batch_max;
        }

        let retained_keys = self
            .entries
            .iter()
            .map(|event| identity_key(&event.id))
            .collect::<HashSet<_>>();
        let fresh = batch
            .iter()
            .map(|event| identity_key(&event.id))
            .collect::<HashSet<_>>()
            .difference(&retained_keys)
            .count();

        let mut seen = HashSet::with_capacity(batch.len() + self.entries.len());
        let mut merged = Vec::with_capacity((batch.len() + self.entries.len()).min(self.retention));
        for event in batch.into_iter().chain(self.entries.drain(..)) {
            if merged.len() >= self.retention {
                break;
            }
            if seen.insert(identity_key(&event.id)) {
                merged.push(event);
            }
        }
        self.entries = merged;

        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn event(id: Value, summary: &str) -> ActivityEvent {
        ActivityEvent {
            id,
            summary: summary.to_owned(),
            ..ActivityEvent::default()
        }
    }

    fn batch(ids: &[u64]) -> Vec<ActivityEvent> {
        ids.iter()
            .map(|id| event(json!(id), &format!("event {id}")))
            .collect()
    }

    fn ids(feed: &ActivityFeed) -> Vec<Value> {
        feed.entries().iter().map(|event| event.id.clone()).collect()
    }

    #[test]
    fn cursor_tracks_batch_maximum_and_never_decreases() {
        let mut feed = ActivityFeed::new(50, 20);
        feed.merge(batch(&[5, 7, 2]));
        assert_eq!(feed.cursor(), 7.0);

        feed.merge(batch(&[9, 7]));
        assert_eq!(feed.cursor(), 9.0);

        feed.merge(batch(&[3]));
        assert_eq!(feed.cursor(), 9.0);
        assert_eq!(feed.request(), (9.0, 20));
    }

    #[test]
    fn non_numeric_ids_leave_cursor_alone() {
        let mut feed = ActivityFeed::new(50, 20);
        feed.merge(batch(&[4]));
        feed.merge(vec![
            event(json!("12"), "string id"),
            event(Value::Null, "missing id"),
        ]);

        assert_eq!(feed.cursor(), 4.0);
        assert_eq!(feed.entries().len(), 3);
    }

    #[test]
    fn repeated_ids_keep_first_occurrence_in_merged_order() {
        let mut feed = ActivityFeed::new(50, 20);
        feed.merge(vec![event(json!(2), "old two"), event(json!(1), "one")]);
        let fresh = feed.merge(vec![event(json!(3), "three"), event(json!(2), "new two")]);

        assert_eq!(fresh, 1);
        assert_eq!(ids(&feed), vec![json!(3), json!(2), json!(1)]);
        assert_eq!(feed.entries()[1].summary, "new two");
    }

    #[test]
    fn retention_window_is_bounded() {
        let mut feed = ActivityFeed::new(50, 100);
        feed.merge(batch(&(1..=40).rev().collect::<Vec<_>>()));
        feed.merge(batch(&(41..=70).rev().collect::<Vec<_>>()));

        assert_eq!(feed.entries().len(), 50);
        assert_eq!(feed.entries().first().map(|e| e.id.clone()), Some(json!(70)));
        assert_eq!(feed.entries().last().map(|e| e.id.clone()), Some(json!(21)));
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(ids_a in proptest::collection::vec(0u64..40, 0..30),
                               ids_b in proptest::collection::vec(0u64..40, 0..30)) {
            let mut feed = ActivityFeed::new(50, 20);
            feed.merge(batch(&ids_a));
            feed.merge(batch(&ids_b));
            let once = ids(&feed);
            let cursor = feed.cursor();

            let fresh = feed.merge(batch(&ids_b));
            prop_assert_eq!(fresh, 0);
            prop_assert_eq!(ids(&feed), once);
            prop_assert_eq!(feed.cursor(), cursor);
        }

        #[test]
        fn merged_feed_has_unique_ids_and_monotone_cursor(
            batches in proptest::collection::vec(proptest::collection::vec(0u64..500, 0..20), 1..8)
        ) {
            let mut feed = ActivityFeed::new(50, 20);
            let mut previous_cursor = feed.cursor();
            for ids_batch in &batches {
                feed.merge(batch(ids_batch));
                prop_assert!(feed.cursor() >= previous_cursor);
                previous_cursor = feed.cursor();

                let unique = feed
                    .entries()
                    .iter()
                    .map(|event| identity_key(&event.id))
                    .collect::<HashSet<_>>();
                prop_assert_eq!(unique.len(), feed.entries().len());
                prop_assert!(feed.entries().len() <= 50);
            }
        }
    }
}
