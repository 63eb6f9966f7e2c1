//! Integration tests for pull evaluation across links.

use std::cell::Cell;
use std::rc::Rc;

use dg_core::DgError;
use dg_signal::{Signal, SignalBase, SignalLink};

fn counted<T: Clone + 'static>(
    name: &str,
    calls: &Rc<Cell<usize>>,
    mut f: impl FnMut(i64) -> Result<T, DgError> + 'static,
) -> Signal<T> {
    let calls = Rc::clone(calls);
    Signal::computed(name, move |t| {
        calls.set(calls.get() + 1);
        f(t)
    })
}

#[test]
fn new_time_pulls_upstream_exactly_once() {
    let b_calls = Rc::new(Cell::new(0));
    let a_calls = Rc::new(Cell::new(0));

    let b = counted("b", &b_calls, |t| Ok(t as f64 * 10.0));
    let link = SignalLink::new("a.in");
    link.bind(&b);

    let input = link.clone();
    let a = counted("a", &a_calls, move |t| Ok(input.get(t)? + 1.0));
    a.add_dependency(&link);

    assert_eq!(a.get(1).unwrap(), 11.0);
    assert_eq!(a.get(1).unwrap(), 11.0);
    assert_eq!((a_calls.get(), b_calls.get()), (1, 1));

    assert_eq!(a.get(2).unwrap(), 21.0);
    assert_eq!((a_calls.get(), b_calls.get()), (2, 2));
    assert_eq!(SignalBase::dependencies(&a), vec!["a.in"]);
}

#[test]
fn diamond_evaluates_shared_source_once() {
    // source -> left, right -> sum
    let source_calls = Rc::new(Cell::new(0));
    let source = counted("source", &source_calls, |t| Ok(t as f64));

    let left_in = SignalLink::new("left.in");
    left_in.bind(&source);
    let right_in = SignalLink::new("right.in");
    right_in.bind(&source);

    let l = left_in.clone();
    let left = Signal::computed("left", move |t| Ok(l.get(t)? + 1.0));
    let r = right_in.clone();
    let right = Signal::computed("right", move |t| Ok(r.get(t)? * 2.0));

    let sum_left = SignalLink::new("sum.left");
    sum_left.bind(&left);
    let sum_right = SignalLink::new("sum.right");
    sum_right.bind(&right);
    let (sl, sr) = (sum_left.clone(), sum_right.clone());
    let sum = Signal::computed("sum", move |t| Ok(sl.get(t)? + sr.get(t)?));

    assert_eq!(sum.get(3).unwrap(), 4.0 + 6.0);
    assert_eq!(source_calls.get(), 1);
}

#[test]
fn upstream_failure_aborts_the_whole_pull() {
    let upstream: Signal<f64> = Signal::new("upstream");
    let link = SignalLink::new("mid.in");
    link.bind(&upstream);
    let l = link.clone();
    let mid = Signal::computed("mid", move |t| l.get(t));

    let mid_in = SignalLink::new("top.in");
    mid_in.bind(&mid);
    let m = mid_in.clone();
    let top = Signal::computed("top", move |t| Ok(m.get(t)? + 1.0));

    let err = top.get(0).unwrap_err();
    match &err {
        DgError::StaleInput { signal, source } => {
            assert_eq!(signal, "top");
            assert!(matches!(**source, DgError::StaleInput { ref signal, .. } if signal == "mid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.root_cause(),
        &DgError::UnboundSignal {
            signal: "upstream".into()
        }
    );
    assert_eq!(top.last_value(), None);

    // Fixing the binding and asking again succeeds.
    upstream.set_constant(1.0);
    assert_eq!(top.get(0).unwrap(), 2.0);
}

#[test]
fn two_signal_cycle_is_detected() {
    let a_in: SignalLink<f64> = SignalLink::new("a.in");
    let b_in: SignalLink<f64> = SignalLink::new("b.in");
    let (ai, bi) = (a_in.clone(), b_in.clone());
    let a = Signal::computed("a", move |t| ai.get(t));
    let b = Signal::computed("b", move |t| bi.get(t));
    a_in.bind(&b);
    b_in.bind(&a);

    let err = a.get(0).unwrap_err();
    assert_eq!(
        err.root_cause(),
        &DgError::CycleDetected { signal: "a".into() }
    );

    // Breaking the cycle makes both computable again.
    b_in.set_constant(7.0);
    assert_eq!(a.get(1).unwrap(), 7.0);
}
