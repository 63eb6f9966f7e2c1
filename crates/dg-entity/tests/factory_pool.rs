//! Integration tests for the factory and the pool.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use dg_core::{DgError, DgResult, Direction, Value};
use dg_entity::{Entity, EntityClass, EntityCore, Factory, Getter, Pool, Setter};
use dg_signal::{Signal, SignalLink};

/// Emits a settable constant.
struct Source {
    core: EntityCore,
}

impl EntityClass for Source {
    const CLASS_NAME: &'static str = "Source";

    fn create(name: &str) -> DgResult<Self> {
        let mut core = EntityCore::new(Self::CLASS_NAME, name);
        let out = Signal::constant(core.signal_name(Direction::Output, "double", "out"), 0.0);
        core.register_signal(&out)?;
        let level = Rc::new(RefCell::new(0.0_f64));
        let sig = out.clone();
        core.register_command(
            "setLevel",
            Setter::new(
                &level,
                move |l: &mut f64, v: f64| {
                    *l = v;
                    sig.set_constant(v);
                },
                "Set the emitted level",
            ),
        )?;
        core.register_command("getLevel", Getter::new(&level, |l: &f64| *l, ""))?;
        Ok(Self { core })
    }
}

/// Adds one to its input.
struct Increment {
    core: EntityCore,
}

impl EntityClass for Increment {
    const CLASS_NAME: &'static str = "Increment";

    fn create(name: &str) -> DgResult<Self> {
        let mut core = EntityCore::new(Self::CLASS_NAME, name);
        let input = SignalLink::<f64>::new(core.signal_name(Direction::Input, "double", "in"));
        let link = input.clone();
        let out = Signal::computed(
            core.signal_name(Direction::Output, "double", "out"),
            move |t| Ok(link.get(t)? + 1.0),
        );
        out.add_dependency(&input);
        core.register_signal(&input)?;
        core.register_signal(&out)?;
        Ok(Self { core })
    }
}

macro_rules! impl_entity {
    ($ty:ty) => {
        impl Entity for $ty {
            fn core(&self) -> &EntityCore {
                &self.core
            }
            fn core_mut(&mut self) -> &mut EntityCore {
                &mut self.core
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

impl_entity!(Source);
impl_entity!(Increment);

fn factory() -> Factory {
    let factory = Factory::new();
    factory.register::<Source>().unwrap();
    factory.register::<Increment>().unwrap();
    factory
}

#[test]
fn create_by_class_name() {
    let factory = factory();
    let entity = factory.create("Source", "bar").unwrap();
    assert_eq!(entity.class_name(), "Source");
    assert_eq!(entity.name(), "bar");
    assert_eq!(factory.class_names(), vec!["Increment", "Source"]);
}

#[test]
fn unknown_class_is_rejected() {
    let factory = factory();
    let err = factory.create("Unknown", "x").err().unwrap();
    assert_eq!(
        err,
        DgError::UnknownClass {
            class: "Unknown".into()
        }
    );
}

#[test]
fn duplicate_class_keeps_first_constructor() {
    let factory = factory();
    let err = factory
        .register_entity_type("Source", |name| {
            Increment::create(name).map(|e| Box::new(e) as Box<dyn Entity>)
        })
        .unwrap_err();
    assert!(matches!(err, DgError::DuplicateName { what: "entity class", .. }));
    let entity = factory.create("Source", "s").unwrap();
    assert!(entity.as_any().is::<Source>());
}

#[test]
fn mismatched_constructor_is_reported() {
    let factory = Factory::new();
    factory
        .register_entity_type("Liar", |name| {
            Source::create(name).map(|e| Box::new(e) as Box<dyn Entity>)
        })
        .unwrap();
    assert!(matches!(
        factory.create("Liar", "l"),
        Err(DgError::InvalidArg { .. })
    ));
}

#[test]
fn pool_plugs_and_pulls() {
    let factory = factory();
    let mut pool = Pool::new();
    pool.create(&factory, "Source", "src").unwrap();
    pool.create(&factory, "Increment", "inc").unwrap();

    assert!(matches!(
        pool.signal("inc.out").unwrap().value(0),
        Err(DgError::StaleInput { .. })
    ));

    pool.plug("src.out", "inc.in").unwrap();
    pool.execute("src", "setLevel", &[Value::Double(4.0)]).unwrap();
    assert_eq!(pool.signal("inc.out").unwrap().value(1).unwrap(), Value::Double(5.0));
    assert_eq!(
        pool.execute("src", "getLevel", &[]).unwrap(),
        Some(Value::Double(4.0))
    );
    assert_eq!(
        pool.signal("inc.in").unwrap().plugged_to().as_deref(),
        Some("Source(src)::output(double)::out")
    );
}

#[test]
fn pool_names_are_unique() {
    let factory = factory();
    let mut pool = Pool::new();
    pool.create(&factory, "Source", "a").unwrap();
    let err = pool.create(&factory, "Increment", "a").err().unwrap();
    assert!(matches!(err, DgError::DuplicateName { what: "entity", .. }));
    assert_eq!(pool.len(), 1);
    assert!(pool.downcast::<Source>("a").is_ok());
    assert!(pool.downcast::<Increment>("a").is_err());
}

#[test]
fn plugging_into_an_output_is_refused() {
    let factory = factory();
    let mut pool = Pool::new();
    pool.create(&factory, "Source", "a").unwrap();
    pool.create(&factory, "Source", "b").unwrap();
    assert!(matches!(
        pool.plug("a.out", "b.out"),
        Err(DgError::NotPlugable { .. })
    ));
}

#[test]
fn destroying_a_producer_unbinds_its_consumers() {
    let factory = factory();
    let mut pool = Pool::new();
    pool.create(&factory, "Source", "src").unwrap();
    pool.create(&factory, "Increment", "inc").unwrap();
    pool.plug("src.out", "inc.in").unwrap();
    assert_eq!(pool.signal("inc.out").unwrap().value(0).unwrap(), Value::Double(1.0));

    pool.remove("src").unwrap();
    let err = pool.signal("inc.out").unwrap().value(1).unwrap_err();
    assert!(matches!(err.root_cause(), DgError::UnboundLink { .. }));
}
