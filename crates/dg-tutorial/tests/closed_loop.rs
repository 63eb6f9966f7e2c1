//! The tutorial graph driven through the factory and the pool.

use nalgebra::{DMatrix, DVector};

use dg_core::{DgError, Value};
use dg_entity::{Factory, Pool};
use dg_signal::ValueRegistry;
use dg_tutorial::{FeedbackControl, InvertedPendulum, register};

fn context() -> (Factory, ValueRegistry) {
    let factory = Factory::new();
    let registry = ValueRegistry::with_builtin();
    register(&factory, &registry).unwrap();
    (factory, registry)
}

#[test]
fn one_increment_overrides_the_state_constant() {
    let (factory, _) = context();
    let mut pool = Pool::new();
    pool.create(&factory, "InvertedPendulum", "p").unwrap();
    let p = pool.downcast::<InvertedPendulum>("p").unwrap();

    p.state()
        .set_constant(DVector::from_vec(vec![0.0, 0.1, 0.0, 0.0]));
    pool.execute("p", "incr", &[Value::Double(0.01)]).unwrap();

    // Upright parameters: a = [[2, cos], [cos, 1]], b = [0, g sin].
    let (sin, cos) = 0.1_f64.sin_cos();
    let det = 2.0 - cos * cos;
    let b = 9.81 * sin;
    let expected = DVector::from_vec(vec![
        0.0,
        0.1,
        0.01 * (-cos * b / det),
        0.01 * (2.0 * b / det),
    ]);

    for t in [0, 1, 1000, -5] {
        let state = p.state().get(t).unwrap();
        assert!((state - &expected).amax() < 1e-12);
    }
}

#[test]
fn zero_force_keeps_rest_state() {
    let (factory, _) = context();
    let p = factory.create("InvertedPendulum", "p").unwrap();
    p.execute("incr", &[Value::Double(0.01)]).unwrap();
    assert_eq!(
        p.signal("state").unwrap().value(42).unwrap(),
        Value::Vector(DVector::zeros(4))
    );
}

#[test]
fn controller_stabilizes_small_tilt() {
    let (factory, _) = context();
    let mut pool = Pool::new();
    pool.create(&factory, "InvertedPendulum", "pendulum").unwrap();
    pool.create(&factory, "FeedbackControl", "controller").unwrap();
    pool.plug("pendulum.state", "controller.state").unwrap();
    pool.plug("controller.force", "pendulum.forcein").unwrap();

    let gain = DMatrix::from_row_slice(1, 4, &[-1.0, -50.0, -2.0, -10.0]);
    pool.execute("controller", "setGain", &[Value::Matrix(gain)])
        .unwrap();

    let pendulum = pool.downcast::<InvertedPendulum>("pendulum").unwrap();
    pendulum
        .state()
        .set_constant(DVector::from_vec(vec![0.0, 0.1, 0.0, 0.0]));

    for _ in 0..1000 {
        pool.execute("pendulum", "incr", &[Value::Double(0.01)])
            .unwrap();
    }
    let state = pendulum.state().get(0).unwrap();
    assert!(state[1].abs() < 0.01, "angle did not settle: {state}");
    assert_eq!(pendulum.state().time(), 1000);

    let controller = pool.downcast::<FeedbackControl>("controller").unwrap();
    assert_eq!(controller.force().time(), 1000);
}

#[test]
fn open_loop_pendulum_falls() {
    let (factory, _) = context();
    let p = factory.create("InvertedPendulum", "p").unwrap();
    let p = p.as_any().downcast_ref::<InvertedPendulum>().unwrap();
    p.state()
        .set_constant(DVector::from_vec(vec![0.0, 0.05, 0.0, 0.0]));
    for _ in 0..50 {
        p.incr(0.01).unwrap();
    }
    assert!(p.state().get(0).unwrap()[1] > 0.05);
}

#[test]
fn state_round_trips_through_the_stream_casts() {
    let (factory, registry) = context();
    let p = factory.create("InvertedPendulum", "p").unwrap();
    let state = p.signal("state").unwrap();

    state
        .read_constant(&registry, &mut "[4](1,0.5,0,0)".as_bytes())
        .unwrap();
    let mut out = Vec::new();
    state.write_value(0, &registry, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "[4](1,0.5,0,0)");
}

#[test]
fn removing_the_controller_unplugs_the_force() {
    let (factory, _) = context();
    let mut pool = Pool::new();
    pool.create(&factory, "InvertedPendulum", "pendulum").unwrap();
    pool.create(&factory, "FeedbackControl", "controller").unwrap();
    pool.plug("controller.force", "pendulum.forcein").unwrap();
    pool.plug("pendulum.state", "controller.state").unwrap();

    pool.remove("controller").unwrap();
    let err = pool
        .execute("pendulum", "incr", &[Value::Double(0.01)])
        .unwrap_err();
    assert!(matches!(err, DgError::UnboundLink { .. }));
}
