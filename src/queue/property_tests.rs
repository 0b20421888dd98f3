//! Property-Based Tests for the Request Queue
//!
//! Drives the queue from a current-thread runtime via `tokio_test::block_on`.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::CacheError;
use crate::queue::RequestQueue;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // *For any* list of producer latencies, side effects happen in enqueue
    // order and never interleave.
    #[test]
    fn prop_fifo_execution(delays in prop::collection::vec(0u64..6, 1..12)) {
        let events = tokio_test::block_on(async {
            let queue = RequestQueue::new(Duration::ZERO);
            let events = Arc::new(Mutex::new(Vec::new()));

            let mut pending = Vec::new();
            for (i, delay) in delays.iter().copied().enumerate() {
                let events = events.clone();
                pending.push(queue.enqueue(None, move || async move {
                    events.lock().unwrap().push((i, "start"));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    events.lock().unwrap().push((i, "end"));
                    Ok(i)
                }));
            }
            for (i, fut) in pending.into_iter().enumerate() {
                assert_eq!(fut.await.unwrap(), i);
            }

            let events = events.lock().unwrap().clone();
            events
        });

        let expected: Vec<(usize, &str)> = (0..delays.len())
            .flat_map(|i| [(i, "start"), (i, "end")])
            .collect();
        prop_assert_eq!(events, expected);
    }

    // *For any* subset of queued keys cancelled before the loop starts,
    // exactly the cancelled producers are skipped and the rest keep their order.
    #[test]
    fn prop_cancelled_entries_never_run(
        count in 1usize..12,
        cancel_mask in prop::collection::vec(any::<bool>(), 12)
    ) {
        let (ran, outcomes) = tokio_test::block_on(async {
            let queue = RequestQueue::new(Duration::ZERO);
            let ran = Arc::new(Mutex::new(Vec::new()));

            let mut pending = Vec::new();
            for i in 0..count {
                let ran = ran.clone();
                pending.push(queue.enqueue(Some(&format!("key{i}")), move || async move {
                    ran.lock().unwrap().push(i);
                    Ok(i)
                }));
            }

            // Nothing has started yet: the loop task has not been polled.
            for i in 0..count {
                if cancel_mask[i] {
                    assert!(queue.cancel(&format!("key{i}")));
                }
            }

            let mut outcomes = Vec::new();
            for fut in pending {
                outcomes.push(matches!(fut.await, Err(CacheError::Cancelled(_))));
            }
            let ran = ran.lock().unwrap().clone();
            (ran, outcomes)
        });

        let expected_ran: Vec<usize> = (0..count).filter(|i| !cancel_mask[*i]).collect();
        prop_assert_eq!(&ran, &expected_ran);

        let cancelled: HashSet<usize> = (0..count).filter(|i| cancel_mask[*i]).collect();
        for (i, was_cancelled) in outcomes.into_iter().enumerate() {
            prop_assert_eq!(was_cancelled, cancelled.contains(&i));
        }
    }
}
