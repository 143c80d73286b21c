use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::{Category, CategoryOrder, Event, EventPattern, pattern::PatternId};

struct Queued {
    seq: u64,
    event: Event,
}

/// Per-category FIFO storage plus the set of forbidden patterns.
///
/// The router never blocks and never matches on its own: it keeps events
/// in arrival order per category and answers "which of these categories
/// has something queued". The [`EventQueue`](crate::EventQueue) drives it.
///
/// A category keeps its slot once it has been seen, even after its queue
/// drains, so [`available`](Self::available) always reports categories in
/// first-ever-seen order.
#[derive(Default)]
pub struct Router {
    queues: IndexMap<Category, VecDeque<Queued>>,
    forbidden: Vec<EventPattern>,
    next_seq: u64,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` at the tail of its category.
    ///
    /// Forbidden patterns are not consulted here; an event is only checked
    /// once something pops it.
    pub fn append(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::trace!(
            event_id = %event.id().short(),
            kind = %event.kind(),
            seq,
            "event queued"
        );
        self.queues
            .entry(event.category().clone())
            .or_default()
            .push_back(Queued { seq, event });
    }

    /// Add patterns to the forbidden set. Already forbidden ones are skipped.
    pub fn forbid(&mut self, patterns: &[EventPattern]) {
        for pattern in patterns {
            if !self.is_forbidden(pattern) {
                tracing::debug!(pattern = %pattern, id = %pattern.id(), "pattern forbidden");
                self.forbidden.push(pattern.clone());
            }
        }
    }

    /// Remove exactly these patterns (by identity) from the forbidden set.
    pub fn unforbid(&mut self, patterns: &[EventPattern]) {
        let ids: Vec<PatternId> = patterns.iter().map(EventPattern::id).collect();
        self.forbidden.retain(|p| !ids.contains(&p.id()));
    }

    pub fn unforbid_all(&mut self) {
        self.forbidden.clear();
    }

    pub fn is_forbidden(&self, pattern: &EventPattern) -> bool {
        self.forbidden.iter().any(|p| p.id() == pattern.id())
    }

    pub fn forbidden(&self) -> &[EventPattern] {
        &self.forbidden
    }

    /// Returns the first forbidden pattern `event` matches, if any.
    pub fn check_forbidden(&self, event: &Event) -> Option<&EventPattern> {
        self.forbidden.iter().find(|p| p.matches(event))
    }

    /// The requested categories that currently hold events, in the order
    /// the categories were first seen.
    pub fn available(&self, requested: &[Category]) -> Vec<Category> {
        self.queues
            .iter()
            .filter(|(category, queue)| !queue.is_empty() && requested.contains(category))
            .map(|(category, _)| category.clone())
            .collect()
    }

    /// Pick the category a wait on `requested` should drain next.
    pub fn select(&self, requested: &[Category], order: CategoryOrder) -> Option<Category> {
        let mut candidates = self
            .queues
            .iter()
            .filter(|(category, _)| requested.contains(category))
            .filter_map(|(category, queue)| queue.front().map(|head| (category, head.seq)));

        let picked = match order {
            CategoryOrder::FirstSeen => candidates.next(),
            CategoryOrder::Arrival => candidates.min_by_key(|(_, seq)| *seq),
        };
        picked.map(|(category, _)| category.clone())
    }

    /// Remove and return the oldest event of `category`.
    pub fn pop_next(&mut self, category: &Category) -> Option<Event> {
        self.queues
            .get_mut(category)
            .and_then(VecDeque::pop_front)
            .map(|queued| queued.event)
    }

    /// Drop every event queued under `category`. Returns how many were dropped.
    pub fn flush(&mut self, category: &Category) -> usize {
        self.queues.get_mut(category).map_or(0, |queue| {
            let n = queue.len();
            queue.clear();
            n
        })
    }

    /// Number of events queued across all categories.
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Queue length per category, in first-seen order.
    pub fn queue_lengths(&self) -> Vec<(Category, usize)> {
        self.queues
            .iter()
            .map(|(category, queue)| (category.clone(), queue.len()))
            .collect()
    }

    /// Queued events across all categories, in arrival order.
    pub fn pending(&self) -> Vec<&Event> {
        let mut all: Vec<&Queued> = self.queues.values().flatten().collect();
        all.sort_by_key(|q| q.seq);
        all.into_iter().map(|q| &q.event).collect()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("queued", &self.len())
            .field("categories", &self.queues.len())
            .field("forbidden", &self.forbidden.len())
            .finish()
    }
}
