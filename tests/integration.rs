//! End-to-end scenarios across operators, buses and schedulers.

use std::{
  cell::{Cell, RefCell},
  panic::{catch_unwind, AssertUnwindSafe},
  rc::Rc,
  time::Duration,
};

use rxflow::prelude::*;

fn ms(n: u64) -> Duration { Duration::from_millis(n) }

fn collect<T, O>(o: &O) -> Rc<RefCell<Vec<T>>>
where
  T: Clone + 'static,
  O: Observable<T, std::convert::Infallible>,
{
  let seen = Rc::new(RefCell::new(vec![]));
  let c_seen = seen.clone();
  o.on_value(move |v| c_seen.borrow_mut().push(v));
  seen
}

#[rxflow_macro::test]
fn subscribe_then_unsubscribe_restores_the_node() {
  let bus = Bus::<i32>::new();
  let mapped = bus.map(|v| v + 1);
  for _ in 0..3 {
    let before = mapped.node().subscriber_count(Channel::Value);
    let listener = mapped.on_value(|_| {});
    assert!(mapped.is_active());
    assert!(bus.is_active());
    mapped.off(&listener);
    assert_eq!(mapped.node().subscriber_count(Channel::Value), before);
    assert!(!mapped.is_active());
    assert!(!bus.is_active());
  }
}

#[rxflow_macro::test]
fn end_listeners_do_not_activate() {
  let bus = Bus::<i32>::new();
  let filtered = bus.filter(|v| *v > 0);
  let ended = Rc::new(Cell::new(false));
  let c_ended = ended.clone();
  filtered.on_end(move || c_ended.set(true));
  assert!(!bus.is_active());
  bus.end();
  assert!(ended.get());
}

#[rxflow_macro::test]
fn unlistened_interval_never_ticks() {
  TestScheduler::init();
  let ticks_seen = Rc::new(Cell::new(0));
  let c_ticks = ticks_seen.clone();
  let s: Stream<i32> = from_poll(
    ms(10),
    move || {
      c_ticks.set(c_ticks.get() + 1);
      0
    },
    TestScheduler,
  );
  let _chain = s.map(|v| v * 2).filter(|_| true);
  TestScheduler::advance_by(ms(1_000));
  assert_eq!(ticks_seen.get(), 0);
  assert!(TestScheduler::is_empty());
}

#[rxflow_macro::test]
fn listened_generator_keeps_running_without_its_handle() {
  TestScheduler::init();
  let seen = Rc::new(RefCell::new(vec![]));
  let c_seen = seen.clone();
  sequentially::<_, std::convert::Infallible, _>(ms(10), vec![1, 2, 3], TestScheduler)
    .on_value(move |v| c_seen.borrow_mut().push(v));
  TestScheduler::advance_by(ms(50));
  assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  assert!(TestScheduler::is_empty());
}

#[rxflow_macro::test]
fn panicking_listener_unwinds_through_push() {
  let bus = Bus::<i32>::new();
  let first = Rc::new(RefCell::new(vec![]));
  let c_first = first.clone();
  bus.on_value(move |v| {
    c_first.borrow_mut().push(v);
    assert_ne!(v, 1, "listener rejects 1");
  });
  let second = collect(&bus);

  let result = catch_unwind(AssertUnwindSafe(|| {
    bus.push(1);
  }));
  assert!(result.is_err());
  assert_eq!(*first.borrow(), vec![1]);
  assert!(second.borrow().is_empty());

  bus.push(2);
  assert_eq!(*first.borrow(), vec![1, 2]);
  assert_eq!(*second.borrow(), vec![2]);
  assert!(bus.is_active());
}

#[rxflow_macro::test]
fn property_value_and_replay() {
  let bus = Bus::<i32>::new();
  let prop = bus.to_property();
  // Keeps the property fed without listening to its values.
  let feeder = prop.on_error(|_| {});
  bus.push(4);
  assert_eq!(prop.get_value(), Ok(4));

  let seen = collect(&prop);
  bus.push(5);
  assert_eq!(*seen.borrow(), vec![4, 5]);
  prop.off(&feeder);
}

#[rxflow_macro::test]
fn combine_emits_after_every_source() {
  let a = Bus::<i32>::new();
  let b = Bus::<i32>::new();
  let seen = collect(&combine([a.clone(), b.clone()]));
  a.push(1);
  b.push(2);
  a.push(3);
  assert_eq!(*seen.borrow(), vec![vec![1, 2], vec![3, 2]]);
}

#[rxflow_macro::test]
fn take_three() {
  let bus = Bus::<i32>::new();
  let taken = bus.take(3);
  let seen = collect(&taken);
  for v in 1..=4 {
    bus.push(v);
  }
  assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  assert!(taken.is_ended());
}

#[rxflow_macro::test]
fn throttle_window() {
  TestScheduler::init();
  let bus = Bus::<i32>::new();
  let throttled = bus.throttle(ms(100), ThrottleOptions::default(), TestScheduler);
  let log = Rc::new(RefCell::new(vec![]));
  let c_log = log.clone();
  throttled.on_value(move |v| c_log.borrow_mut().push((TestScheduler::now(), v)));

  for (t, v) in [(0, 0), (30, 30), (60, 60), (150, 150)] {
    TestScheduler::advance_to(ms(t));
    bus.push(v);
  }
  TestScheduler::flush();
  assert_eq!(*log.borrow(), vec![(ms(0), 0), (ms(100), 60), (ms(200), 150)]);
}

#[rxflow_macro::test]
fn skip_while_stops_filtering() {
  let bus = Bus::<i32>::new();
  let seen = collect(&bus.skip_while(|v| *v < 3));
  for v in [1, 2, 3, 4, 1] {
    bus.push(v);
  }
  assert_eq!(*seen.borrow(), vec![3, 4, 1]);
}

#[rxflow_macro::test]
fn merge_ends_after_both_sources() {
  let a = Bus::<i32>::new();
  let b = Bus::<i32>::new();
  let merged = merge([a.clone(), b.clone()]);
  let seen = collect(&merged);
  b.push(1);
  b.end();
  a.push(2);
  assert!(!merged.is_ended());
  a.end();
  assert!(merged.is_ended());
  assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[rxflow_macro::test]
fn search_box_pipeline() {
  TestScheduler::init();
  let keys = Bus::<&'static str>::new();
  let results = keys
    .skip_duplicates()
    .throttle(ms(50), ThrottleOptions::trailing(), TestScheduler)
    .flat_map_latest(|query: &'static str| {
      later(ms(20), format!("results for {query}"), TestScheduler)
    });
  let seen = collect(&results);

  keys.push("r").push("ru").push("ru");
  TestScheduler::advance_by(ms(60));
  keys.push("rust");
  TestScheduler::advance_by(ms(200));
  assert_eq!(*seen.borrow(), vec!["results for ru".to_string(), "results for rust".to_string()]);
}

#[rxflow_macro::test]
fn sampled_counter() {
  TestScheduler::init();
  let clicks = Bus::<()>::new();
  let count = clicks.scan(0, |n, _| n + 1);
  let sampler: Stream<()> = ticks(ms(100), TestScheduler);
  let seen = collect(&count.sampled_by(&sampler));

  clicks.push(()).push(());
  TestScheduler::advance_by(ms(100));
  clicks.push(());
  TestScheduler::advance_by(ms(100));
  assert_eq!(*seen.borrow(), vec![2, 3]);
}

#[rxflow_macro::test]
fn reentrant_push_from_a_listener() {
  let bus = Bus::<i32>::new();
  let seen = collect(&bus);
  let c_bus = bus.clone();
  bus.on_value(move |v| {
    if v < 3 {
      c_bus.push(v + 1);
    }
  });
  bus.push(1);
  assert_eq!(*seen.borrow(), vec![1, 2, 3]);
}

#[rxflow_macro::test]
fn stop_listening_from_a_listener() {
  let bus = Bus::<i32>::new();
  let seen = Rc::new(RefCell::new(vec![]));
  let c_seen = seen.clone();
  bus.on_value(move |v| {
    c_seen.borrow_mut().push(v);
    if v == 2 { Flow::StopListening } else { Flow::Continue }
  });
  for v in 1..=3 {
    bus.push(v);
  }
  assert_eq!(*seen.borrow(), vec![1, 2]);
  assert!(!bus.is_active());
}

#[rxflow_macro::test]
fn custom_operator() {
  struct Pairs;

  impl Operator<i32, std::convert::Infallible> for Pairs {
    type Out = (i32, i32);

    fn handle_value(
      &self, value: i32, _: bool, out: &NodeRef<(i32, i32), std::convert::Infallible>,
    ) {
      out.send_value((value, value * value));
    }
  }

  let bus = Bus::<i32>::new();
  let seen = collect(&bus.with_operator("pairs", Pairs));
  bus.push(3);
  assert_eq!(*seen.borrow(), vec![(3, 9)]);
}

#[cfg(feature = "tokio-scheduler")]
#[rxflow_macro::test]
async fn tokio_driven_delay() {
  let bus = Bus::<i32>::new();
  let seen = collect(&bus.delay(ms(30), LocalScheduler));
  bus.push(1);
  tokio::time::sleep(ms(10)).await;
  assert!(seen.borrow().is_empty());
  tokio::time::sleep(ms(30)).await;
  assert_eq!(*seen.borrow(), vec![1]);
}
