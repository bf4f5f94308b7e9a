//! Join and group join must produce identical results for every callback
//! shape, and match a nested-loop reference.

#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod common;

use qflow::core::comparer::{ignore_ascii_case, Comparer};
use qflow::operators::{CallbackShape, Selector};
use qflow::planner::Query;
use quickcheck::{QuickCheck, TestResult};

use common::{collect, oracle, shaped, SHAPES};

fn scenario_join(
    outer_shape: CallbackShape,
    inner_shape: CallbackShape,
    result_shape: CallbackShape,
) -> Query<i32> {
    let outer = Query::from_vec("outer", vec![1, 2, 3]);
    let inner = Query::from_vec("inner", vec![1, 2, 3]);
    outer
        .join(
            inner,
            shaped(outer_shape, |x: i32| x + 3),
            shaped(inner_shape, |x: i32| x + 3),
            shaped(result_shape, |(x, y): (i32, i32)| x + 3 - y),
        )
        .unwrap()
}

#[tokio::test]
async fn scenario_yields_three_threes_for_every_shape() {
    for shape in SHAPES {
        let rows = collect(&scenario_join(shape, shape, shape)).await.unwrap();
        assert_eq!(rows, vec![3, 3, 3], "shape {:?}", shape);
    }
}

#[tokio::test]
async fn scenario_mixed_shapes_agree() {
    for a in SHAPES {
        for b in SHAPES {
            for c in SHAPES {
                let rows = collect(&scenario_join(a, b, c)).await.unwrap();
                assert_eq!(rows, vec![3, 3, 3], "shapes {:?}/{:?}/{:?}", a, b, c);
            }
        }
    }
}

#[tokio::test]
async fn scenario_with_explicit_natural_comparer() {
    let outer = Query::from_vec("outer", vec![1, 2, 3]);
    let inner = Query::from_vec("inner", vec![1, 2, 3]);
    let joined = outer
        .join_with(
            inner,
            Selector::sync(|x: i32| x + 3),
            Selector::sync(|x: i32| x + 3),
            Selector::sync(|(x, y): (i32, i32)| x + 3 - y),
            Comparer::natural(),
        )
        .unwrap();
    assert_eq!(collect(&joined).await.unwrap(), vec![3, 3, 3]);
}

#[tokio::test]
async fn case_insensitive_comparer_matches_across_case() {
    let outer = Query::from_vec("people", vec!["Ada".to_string(), "bob".to_string()]);
    let inner = Query::from_vec(
        "pets",
        vec![
            ("ADA".to_string(), "cat"),
            ("Bob".to_string(), "dog"),
            ("ada".to_string(), "owl"),
        ],
    );
    let joined = outer
        .join_with(
            inner,
            Selector::sync(|p: String| p),
            Selector::sync(|(owner, _): (String, &'static str)| owner),
            Selector::sync(|(p, (_, pet)): (String, (String, &'static str))| {
                format!("{}:{}", p, pet)
            }),
            ignore_ascii_case(),
        )
        .unwrap();
    assert_eq!(
        collect(&joined).await.unwrap(),
        vec!["Ada:cat", "Ada:owl", "bob:dog"]
    );
}

#[tokio::test]
async fn group_join_matches_reference_for_every_shape() {
    let outer_items = vec![1, 2, 3, 4];
    let inner_items = vec![2, 4, 4, 6, 8];
    let expected = oracle::group_join(
        &outer_items,
        &inner_items,
        |o| o * 2,
        |i| *i,
        |o, is| (*o, is),
        |a, b| a == b,
    );
    for shape in SHAPES {
        let outer = Query::from_vec("outer", outer_items.clone());
        let inner = Query::from_vec("inner", inner_items.clone());
        let q = outer
            .group_join(
                inner,
                shaped(shape, |o: i32| o * 2),
                shaped(shape, |i: i32| i),
                shaped(shape, |(o, is): (i32, Vec<i32>)| (o, is)),
            )
            .unwrap();
        assert_eq!(collect(&q).await.unwrap(), expected, "shape {:?}", shape);
    }
}

// Small key domain so that collisions and fan-out are common.
fn run_join(outer: Vec<u8>, inner: Vec<u8>, shape: CallbackShape) -> Vec<(u8, u8)> {
    let q = Query::from_vec("outer", outer)
        .join(
            Query::from_vec("inner", inner),
            shaped(shape, |o: u8| o % 5),
            shaped(shape, |i: u8| i % 5),
            shaped(shape, |pair: (u8, u8)| pair),
        )
        .unwrap();
    block_on(collect(&q)).unwrap()
}

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

#[test]
fn join_equals_nested_loop_reference() {
    fn prop(outer: Vec<u8>, inner: Vec<u8>) -> bool {
        let expected = oracle::join(
            &outer,
            &inner,
            |o| o % 5,
            |i| i % 5,
            |o, i| (*o, *i),
            |a, b| a == b,
        );
        SHAPES
            .iter()
            .all(|shape| run_join(outer.clone(), inner.clone(), *shape) == expected)
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> bool);
}

#[quickcheck]
fn join_cardinality_is_sum_of_match_counts(outer: Vec<u8>, inner: Vec<u8>) -> TestResult {
    if outer.len() > 64 || inner.len() > 64 {
        return TestResult::discard();
    }
    let expected: usize = outer
        .iter()
        .map(|o| inner.iter().filter(|i| *i % 5 == o % 5).count())
        .sum();
    TestResult::from_bool(run_join(outer, inner, CallbackShape::Sync).len() == expected)
}

#[quickcheck]
fn group_by_equals_reference(items: Vec<u8>) -> bool {
    let expected: Vec<(u8, Vec<u8>)> = oracle::group_by(&items, |x| x % 7, |a, b| a == b);
    let q = Query::from_vec("items", items)
        .group_by(Selector::sync(|x: u8| x % 7))
        .unwrap();
    let groups: Vec<(u8, Vec<u8>)> = block_on(collect(&q))
        .unwrap()
        .into_iter()
        .map(|g| (g.key, g.elements))
        .collect();
    groups == expected
}

fn mod4() -> Comparer<u8> {
    Comparer::by_key(|k: &u8| k % 4)
}

fn run_join_mod4(outer: Vec<u8>, inner: Vec<u8>, shape: CallbackShape) -> Vec<(u8, u8)> {
    let q = Query::from_vec("outer", outer)
        .join_with(
            Query::from_vec("inner", inner),
            shaped(shape, |o: u8| o % 7),
            shaped(shape, |i: u8| i % 7),
            shaped(shape, |pair: (u8, u8)| pair),
            mod4(),
        )
        .unwrap();
    block_on(collect(&q)).unwrap()
}

#[test]
fn join_with_explicit_comparer_matches_reference_for_every_shape() {
    let outer = vec![0, 3, 5, 9, 11, 14, 20];
    let inner = vec![4, 1, 7, 13, 2, 6];
    let expected = oracle::join(
        &outer,
        &inner,
        |o| o % 7,
        |i| i % 7,
        |o, i| (*o, *i),
        |a, b| a % 4 == b % 4,
    );
    assert!(!expected.is_empty());
    for shape in SHAPES {
        let got = run_join_mod4(outer.clone(), inner.clone(), shape);
        assert_eq!(got, expected, "shape {:?}", shape);
    }
}

#[test]
fn join_with_explicit_comparer_equals_reference() {
    fn prop(outer: Vec<u8>, inner: Vec<u8>) -> bool {
        let expected = oracle::join(
            &outer,
            &inner,
            |o| o % 7,
            |i| i % 7,
            |o, i| (*o, *i),
            |a, b| a % 4 == b % 4,
        );
        SHAPES
            .iter()
            .all(|shape| run_join_mod4(outer.clone(), inner.clone(), *shape) == expected)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> bool);
}

#[tokio::test]
async fn group_join_with_explicit_comparer_matches_reference_for_every_shape() {
    let outer_items: Vec<u8> = vec![1, 2, 3, 4, 12];
    let inner_items: Vec<u8> = vec![8, 5, 6, 13, 2];
    let expected = oracle::group_join(
        &outer_items,
        &inner_items,
        |o| *o,
        |i| *i,
        |o, is| (*o, is),
        |a, b| a % 4 == b % 4,
    );
    for shape in SHAPES {
        let outer = Query::from_vec("outer", outer_items.clone());
        let inner = Query::from_vec("inner", inner_items.clone());
        let q = outer
            .group_join_with(
                inner,
                shaped(shape, |o: u8| o),
                shaped(shape, |i: u8| i),
                shaped(shape, |(o, is): (u8, Vec<u8>)| (o, is)),
                mod4(),
            )
            .unwrap();
        assert_eq!(collect(&q).await.unwrap(), expected, "shape {:?}", shape);
    }
}

#[tokio::test]
async fn group_by_with_explicit_comparer_keeps_first_key_for_every_shape() {
    let items: Vec<u8> = vec![5, 2, 9, 6, 4, 13, 8];
    let expected = oracle::group_by(&items, |x| *x, |a, b| a % 4 == b % 4);
    for shape in SHAPES {
        let q = Query::from_vec("items", items.clone())
            .group_by_with(shaped(shape, |x: u8| x), mod4())
            .unwrap();
        let groups: Vec<(u8, Vec<u8>)> = collect(&q)
            .await
            .unwrap()
            .into_iter()
            .map(|g| (g.key, g.elements))
            .collect();
        assert_eq!(groups, expected, "shape {:?}", shape);
    }
}
