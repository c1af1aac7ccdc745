//! Pluggable query functions.
//!
//! The engine treats aggregation, join matching, and filtering as opaque
//! behavior supplied by the query definition. Functions run synchronously on
//! the owning operator's processing task and must be pure: no shared mutable
//! state, no I/O. Plain `fn` items and capture-free closures implement the
//! traits directly through the blanket impls.

use anyhow::Result;

use eventide_core::{Event, Timestamp};

/// Batch aggregation over one closed window's events.
///
/// Invoked exactly once per window, at the moment the watermark closes it,
/// with the window's full event set in insertion order. Produced events are
/// emitted downstream in the order returned.
pub trait AggregateFn: Send + Sync {
    fn apply(&self, window_start: Timestamp, events: &[Event]) -> Result<Vec<Event>>;
}

impl<F> AggregateFn for F
where
    F: Fn(Timestamp, &[Event]) -> Result<Vec<Event>> + Send + Sync,
{
    fn apply(&self, window_start: Timestamp, events: &[Event]) -> Result<Vec<Event>> {
        self(window_start, events)
    }
}

/// Pairwise join predicate and combinator.
///
/// `left` is always the event from the first (left) input source and `right`
/// from the second; the argument order is part of the contract, not
/// incidental. Returns `None` when the pair does not match.
pub trait JoinFn: Send + Sync {
    fn apply(
        &self,
        output_timestamp: Timestamp,
        left: &Event,
        right: &Event,
    ) -> Result<Option<Event>>;
}

impl<F> JoinFn for F
where
    F: Fn(Timestamp, &Event, &Event) -> Result<Option<Event>> + Send + Sync,
{
    fn apply(
        &self,
        output_timestamp: Timestamp,
        left: &Event,
        right: &Event,
    ) -> Result<Option<Event>> {
        self(output_timestamp, left, right)
    }
}

/// Per-event predicate for the filter operator.
pub trait FilterFn: Send + Sync {
    fn apply(&self, event: &Event) -> Result<bool>;
}

impl<F> FilterFn for F
where
    F: Fn(&Event) -> Result<bool> + Send + Sync,
{
    fn apply(&self, event: &Event) -> Result<bool> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn count_events(window_start: Timestamp, events: &[Event]) -> Result<Vec<Event>> {
        Ok(vec![Event::encode(window_start, &(events.len() as i64))?])
    }

    #[test]
    fn test_fn_item_as_aggregate() {
        let agg: Arc<dyn AggregateFn> = Arc::new(count_events);
        let events = vec![Event::regular(1, vec![]), Event::regular(2, vec![])];
        let out = agg.apply(0, &events).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].decode::<i64>().unwrap(), 2);
    }

    #[test]
    fn test_closure_as_join() {
        let join: Arc<dyn JoinFn> = Arc::new(
            |ts: Timestamp, left: &Event, right: &Event| -> Result<Option<Event>> {
                if left.timestamp < right.timestamp {
                    Ok(Some(Event::regular(ts, vec![])))
                } else {
                    Ok(None)
                }
            },
        );

        let a = Event::regular(1, vec![]);
        let b = Event::regular(5, vec![]);
        assert!(join.apply(9, &a, &b).unwrap().is_some());
        assert!(join.apply(9, &b, &a).unwrap().is_none());
    }

    #[test]
    fn test_closure_as_filter() {
        let filter: Arc<dyn FilterFn> =
            Arc::new(|event: &Event| -> Result<bool> { Ok(event.timestamp % 2 == 0) });
        assert!(filter.apply(&Event::regular(4, vec![])).unwrap());
        assert!(!filter.apply(&Event::regular(5, vec![])).unwrap());
    }

    #[test]
    fn test_function_failure_propagates() {
        let agg: Arc<dyn AggregateFn> = Arc::new(
            |_: Timestamp, _: &[Event]| -> Result<Vec<Event>> {
                anyhow::bail!("cannot aggregate")
            },
        );
        assert!(agg.apply(0, &[]).is_err());
    }
}
