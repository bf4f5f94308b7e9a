//! Enumeration behaviour: laziness, re-enumeration, cancellation, faults.

mod common;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt, TryStreamExt};
use qflow::core::cancel::CancellationSignal;
use qflow::core::config::EngineConfig;
use qflow::core::error::Error;
use qflow::core::source::{OnceSource, StreamSource};
use qflow::core::state::EnumerationState;
use qflow::exec::replay::{hash_outputs, verify_repeatable};
use qflow::exec::Engine;
use qflow::operators::Selector;
use qflow::planner::Query;

use common::oracle::TouchedSource;
use common::{collect, counting, shaped, SHAPES};

#[derive(Debug, PartialEq)]
struct Boom(i32);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boom at {}", self.0)
    }
}

impl std::error::Error for Boom {}

fn scenario() -> Query<i32> {
    Query::from_vec("outer", vec![1, 2, 3])
        .join(
            Query::from_vec("inner", vec![1, 2, 3]),
            Selector::sync(|x: i32| x + 3),
            Selector::sync(|x: i32| x + 3),
            Selector::sync(|(x, y): (i32, i32)| x + 3 - y),
        )
        .unwrap()
}

#[tokio::test]
async fn re_enumeration_yields_identical_results() {
    let q = scenario();
    let first = collect(&q).await.unwrap();
    let second = collect(&q).await.unwrap();
    assert_eq!(first, vec![3, 3, 3]);
    assert_eq!(first, second);

    let digest = verify_repeatable(&Engine::default(), &q, &CancellationSignal::none())
        .await
        .unwrap();
    assert_eq!(digest, hash_outputs(&[3, 3, 3]).unwrap());
}

#[tokio::test]
async fn concurrent_enumerations_are_independent() {
    let q = scenario();
    let engine = Engine::default();
    let cancel = CancellationSignal::none();
    let (a, b) = tokio::join!(engine.collect(&q, &cancel), engine.collect(&q, &cancel));
    assert_eq!(a.unwrap(), vec![3, 3, 3]);
    assert_eq!(b.unwrap(), vec![3, 3, 3]);
}

#[tokio::test]
async fn each_enumeration_gets_its_own_cursor() {
    let q = scenario();
    let engine = Engine::default();
    let cancel = CancellationSignal::none();
    let a = engine.stream(&q, &cancel).unwrap();
    let b = engine.stream(&q, &cancel).unwrap();
    assert_ne!(a.cursor_id(), b.cursor_id());
    assert_eq!(a.plan_hash(), b.plan_hash());
}

#[tokio::test]
async fn inner_is_fully_read_before_outer_is_pulled() {
    let (outer, outer_touch) = TouchedSource::new("outer", vec![1, 2, 3]);
    let (inner, inner_touch) = TouchedSource::new("inner", vec![3, 2, 1, 2]);
    let q = Query::from_source(outer)
        .join(
            Query::from_source(inner),
            Selector::sync(|x: i32| x),
            Selector::sync(|x: i32| x),
            Selector::sync(|(x, y): (i32, i32)| x * 10 + y),
        )
        .unwrap();

    let mut s = Engine::default()
        .stream(&q, &CancellationSignal::none())
        .unwrap();
    assert_eq!(s.try_next().await.unwrap(), Some(11));
    assert_eq!(inner_touch.pulled(), 4);
    assert_eq!(outer_touch.pulled(), 1);

    let rest: Vec<i32> = s.try_collect().await.unwrap();
    assert_eq!(rest, vec![22, 22, 33]);
}

#[tokio::test]
async fn empty_inner_never_reads_outer() {
    let (outer, outer_touch) = TouchedSource::new("outer", vec![1, 2, 3]);
    let q = Query::from_source(outer)
        .join(
            Query::from_vec("inner", Vec::<i32>::new()),
            Selector::sync(|x: i32| x),
            Selector::sync(|x: i32| x),
            Selector::sync(|(x, _): (i32, i32)| x),
        )
        .unwrap();
    assert!(collect(&q).await.unwrap().is_empty());
    assert_eq!(outer_touch.pulled(), 0);
}

#[tokio::test]
async fn cancelled_before_start_reads_nothing() {
    let (outer, outer_touch) = TouchedSource::new("outer", vec![1, 2, 3]);
    let (inner, inner_touch) = TouchedSource::new("inner", vec![1, 2, 3]);
    let q = Query::from_source(outer)
        .join(
            Query::from_source(inner),
            Selector::sync(|x: i32| x),
            Selector::sync(|x: i32| x),
            Selector::sync(|(x, _): (i32, i32)| x),
        )
        .unwrap();

    let cancel = CancellationSignal::new();
    cancel.cancel();
    let err = Engine::default().collect(&q, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(outer_touch.untouched());
    assert!(inner_touch.untouched());
}

#[tokio::test]
async fn cancel_mid_stream_stops_after_current_element() {
    let q = scenario();
    let cancel = CancellationSignal::new();
    let mut s = Engine::default().stream(&q, &cancel).unwrap();

    assert_eq!(s.try_next().await.unwrap(), Some(3));
    cancel.cancel();
    assert!(matches!(s.next().await, Some(Err(Error::Cancelled))));
    assert_eq!(s.state(), EnumerationState::Cancelled);
    assert!(s.next().await.is_none());
    assert_eq!(s.rows_yielded(), 1);
}

#[tokio::test]
async fn cancelling_one_enumeration_leaves_others_running() {
    let q = scenario();
    let engine = Engine::default();
    let root = CancellationSignal::new();
    let other = CancellationSignal::new();

    let mut doomed = engine.stream(&q, &root).unwrap();
    root.cancel();
    assert!(doomed.try_next().await.unwrap_err().is_cancelled());
    assert_eq!(engine.collect(&q, &other).await.unwrap(), vec![3, 3, 3]);
}

#[tokio::test]
async fn cancellation_during_a_selector_is_reported_after_it_settles() {
    let settled = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&settled);
    let q = Query::from_vec("nums", vec![1, 2, 3])
        .select(Selector::cancellable(move |x: i32, cancel: CancellationSignal| {
            let observed = Arc::clone(&observed);
            async move {
                if x == 2 {
                    cancel.cancelled().await;
                    observed.fetch_add(1, Ordering::SeqCst);
                }
                x
            }
        }))
        .unwrap();

    let cancel = CancellationSignal::new();
    let trigger = cancel.clone();
    let mut s = Engine::default().stream(&q, &cancel).unwrap();
    assert_eq!(s.try_next().await.unwrap(), Some(1));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });
    let err = s.try_next().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(settled.load(Ordering::SeqCst), 1);
    assert_eq!(s.state(), EnumerationState::Cancelled);
}

#[tokio::test]
async fn selector_fault_is_surfaced_verbatim_after_earlier_elements() {
    for shape in SHAPES {
        let q = Query::from_vec("nums", vec![1, 2, 3, 4])
            .select(match shape {
                qflow::operators::CallbackShape::Sync => Selector::try_sync(|x: i32| {
                    if x == 3 {
                        Err(Boom(x))
                    } else {
                        Ok(x * 10)
                    }
                }),
                qflow::operators::CallbackShape::Async => Selector::try_async(|x: i32| async move {
                    if x == 3 {
                        Err(Boom(x))
                    } else {
                        Ok(x * 10)
                    }
                }),
                qflow::operators::CallbackShape::AsyncCancellable => {
                    Selector::try_cancellable(|x: i32, _cancel| async move {
                        if x == 3 {
                            Err(Boom(x))
                        } else {
                            Ok(x * 10)
                        }
                    })
                }
            })
            .unwrap();

        let mut s = Engine::default()
            .stream(&q, &CancellationSignal::none())
            .unwrap();
        let mut seen = Vec::new();
        let err = loop {
            match s.try_next().await {
                Ok(Some(x)) => seen.push(x),
                Ok(None) => panic!("expected a fault for shape {:?}", shape),
                Err(e) => break e,
            }
        };
        assert_eq!(seen, vec![10, 20], "shape {:?}", shape);
        assert_eq!(err.downcast_callback::<Boom>(), Some(&Boom(3)));
        assert_eq!(err.to_string(), "boom at 3");
        assert_eq!(s.state(), EnumerationState::Faulted);
        assert!(s.next().await.is_none());
    }
}

#[tokio::test]
async fn fault_in_inner_key_selector_stops_before_outer() {
    let (outer, outer_touch) = TouchedSource::new("outer", vec![1, 2, 3]);
    let q = Query::from_source(outer)
        .join(
            Query::from_vec("inner", vec![1, 2, 3]),
            Selector::sync(|x: i32| x),
            Selector::try_sync(|x: i32| if x == 2 { Err(Boom(x)) } else { Ok(x) }),
            Selector::sync(|(x, _): (i32, i32)| x),
        )
        .unwrap();
    let err = collect(&q).await.unwrap_err();
    assert_eq!(err.downcast_callback::<Boom>(), Some(&Boom(2)));
    assert_eq!(outer_touch.pulled(), 0);
}

#[tokio::test]
async fn source_fault_propagates() {
    let q = Query::from_source(StreamSource::try_new("flaky", || {
        stream::iter(vec![
            Ok(1),
            Err(Error::Source {
                source_name: "flaky".into(),
                message: "connection reset".into(),
            }),
        ])
    }));
    let err = collect(&q).await.unwrap_err();
    assert!(matches!(err, Error::Source { .. }));
}

#[tokio::test]
async fn once_source_cannot_be_enumerated_twice() {
    let q = Query::from_source(OnceSource::new("once", stream::iter(vec![1, 2, 3])));
    assert_eq!(collect(&q).await.unwrap(), vec![1, 2, 3]);
    let err = collect(&q).await.unwrap_err();
    assert!(matches!(err, Error::SourceExhausted { .. }));
}

#[tokio::test]
async fn lookup_limit_faults_the_enumeration() {
    let engine = Engine::new(EngineConfig::default().with_max_lookup_elements(2)).unwrap();
    let cancel = CancellationSignal::none();

    let small = Query::from_vec("outer", vec![1, 2])
        .join(
            Query::from_vec("inner", vec![1, 2]),
            Selector::sync(|x: i32| x),
            Selector::sync(|x: i32| x),
            Selector::sync(|(x, y): (i32, i32)| x + y),
        )
        .unwrap();
    assert_eq!(engine.collect(&small, &cancel).await.unwrap(), vec![2, 4]);

    let err = engine.collect(&scenario(), &cancel).await.unwrap_err();
    assert!(matches!(err, Error::LookupLimit { limit: 2 }));
}

#[tokio::test]
async fn operators_compose_end_to_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orders = Query::from_vec(
        "orders",
        vec![("ann", 5), ("bob", 7), ("ann", 11), ("cid", 2), ("bob", 1)],
    );

    let per_customer = orders
        .filter(counting(&calls, |(_, amount): (&'static str, i32)| amount > 1))
        .unwrap()
        .group_by(Selector::sync(|(name, _): (&'static str, i32)| name))
        .unwrap()
        .select(Selector::sync(|g: qflow::operators::Grouping<&'static str, (&'static str, i32)>| {
            (g.key, g.iter().map(|(_, a)| a).sum::<i32>())
        }))
        .unwrap();
    assert_eq!(
        collect(&per_customer).await.unwrap(),
        vec![("ann", 16), ("bob", 7), ("cid", 2)]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let total = orders
        .aggregate(0i64, Selector::sync(|(acc, (_, a)): (i64, (&'static str, i32))| acc + a as i64))
        .unwrap();
    assert_eq!(collect(&total).await.unwrap(), vec![26]);

    let count = orders.count().unwrap();
    assert_eq!(collect(&count).await.unwrap(), vec![5]);

    let letters = orders
        .select_many(Selector::sync(|(name, _): (&'static str, i32)| {
            name.chars().take(1).collect::<Vec<char>>()
        }))
        .unwrap();
    assert_eq!(
        collect(&letters).await.unwrap(),
        vec!['a', 'b', 'a', 'c', 'b']
    );
}

#[tokio::test]
async fn group_join_keeps_unmatched_outer_elements() {
    for shape in SHAPES {
        let q = Query::from_vec("outer", vec![1, 2, 3])
            .group_join(
                Query::from_vec("inner", vec![3, 1, 3]),
                shaped(shape, |x: i32| x),
                shaped(shape, |x: i32| x),
                shaped(shape, |(x, ys): (i32, Vec<i32>)| (x, ys.len())),
            )
            .unwrap();
        assert_eq!(
            collect(&q).await.unwrap(),
            vec![(1, 1), (2, 0), (3, 2)],
            "shape {:?}",
            shape
        );
    }
}

#[tokio::test]
async fn aggregate_over_empty_source_yields_seed() {
    let q = Query::from_vec("none", Vec::<i32>::new())
        .aggregate(7, Selector::sync(|(acc, x): (i32, i32)| acc + x))
        .unwrap();
    assert_eq!(collect(&q).await.unwrap(), vec![7]);
}

#[tokio::test]
async fn run_report_describes_completed_enumeration() {
    let q = scenario();
    let (rows, report) = Engine::default()
        .run(&q, &CancellationSignal::none())
        .await
        .unwrap();
    assert_eq!(rows, vec![3, 3, 3]);
    assert_eq!(report.rows_yielded, 3);
    assert_eq!(report.outcome, EnumerationState::Completed);
    assert_eq!(report.outputs_digest, Some(hash_outputs(&rows).unwrap()));
    assert!(report.finished_ms >= report.started_ms);
}
