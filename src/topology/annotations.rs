use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub node_id: String,
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Newest-first list holding at most one annotation per node.
#[derive(Debug)]
pub struct AnnotationLog {
    entries: VecDeque<Annotation>,
    capacity: usize,
}

impl AnnotationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.entries
            .retain(|existing| existing.node_id != annotation.node_id);
        self.entries.push_front(annotation);
        self.entries.truncate(self.capacity);
    }

    pub fn for_node(&self, node_id: &str) -> Option<&Annotation> {
        self.entries.iter().find(|entry| entry.node_id == node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(node_id: &str, message: &str, timestamp: f64) -> Annotation {
        Annotation {
            node_id: node_id.to_owned(),
            message: message.to_owned(),
            timestamp,
        }
    }

    #[test]
    fn newer_annotation_supersedes_older_for_same_node() {
        let mut log = AnnotationLog::new(8);
        log.push(note("orders", "slow", 1.0));
        log.push(note("payments", "errors", 2.0));
        log.push(note("orders", "recovered", 3.0));

        assert_eq!(log.len(), 2);
        assert_eq!(log.for_node("orders").map(|a| a.message.as_str()), Some("recovered"));
        let order = log.iter().map(|a| a.node_id.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["orders", "payments"]);
    }

    #[test]
    fn bounded_to_capacity() {
        let mut log = AnnotationLog::new(2);
        log.push(note("a", "1", 1.0));
        log.push(note("b", "2", 2.0));
        log.push(note("c", "3", 3.0));

        assert_eq!(log.len(), 2);
        assert!(log.for_node("a").is_none());
    }
}
