use crate::sim::{Event, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<(u32, SimTime)>>>;

#[derive(Default)]
struct CountingWorld {
    ticks: usize,
}

impl World for CountingWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks += 1;
    }
}

/// 记录 (id, 执行时刻)
struct Mark {
    id: u32,
    log: Log,
}

impl Event for Mark {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        self.log.lock().expect("log lock").push((self.id, sim.now()));
    }
}

/// 执行时再调度一个事件到 `at`
struct Chain {
    id: u32,
    next_id: u32,
    at: SimTime,
    log: Log,
}

impl Event for Chain {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let Chain {
            id,
            next_id,
            at,
            log,
        } = *self;
        log.lock().expect("log lock").push((id, sim.now()));
        sim.schedule(at, Mark { id: next_id, log });
    }
}

fn ids(log: &Log) -> Vec<u32> {
    log.lock().expect("log lock").iter().map(|(id, _)| *id).collect()
}

fn mark(id: u32, log: &Log) -> Mark {
    Mark {
        id,
        log: Arc::clone(log),
    }
}

#[test]
fn events_run_by_time_then_schedule_order() {
    let log = Log::default();
    let mut sim = Simulator::default();
    sim.schedule(SimTime(10), mark(1, &log));
    sim.schedule(SimTime(5), mark(2, &log));
    sim.schedule(SimTime(10), mark(3, &log));
    assert_eq!(sim.pending(), 3);

    let mut world = CountingWorld::default();
    sim.run(&mut world);

    assert_eq!(ids(&log), [2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(sim.executed(), 3);
    assert_eq!(sim.pending(), 0);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn same_time_event_scheduled_from_inside_runs_after_current() {
    let log = Log::default();
    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        Chain {
            id: 1,
            next_id: 2,
            at: SimTime::ZERO,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(SimTime::ZERO, mark(3, &log));

    sim.run(&mut CountingWorld::default());
    assert_eq!(ids(&log), [1, 3, 2]);
}

#[test]
fn scheduling_in_the_past_is_clamped_to_now() {
    let log = Log::default();
    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(100),
        Chain {
            id: 1,
            next_id: 2,
            at: SimTime(10),
            log: Arc::clone(&log),
        },
    );

    sim.run(&mut CountingWorld::default());
    let log = log.lock().expect("log lock");
    assert_eq!(*log, vec![(1, SimTime(100)), (2, SimTime(100))]);
}

#[test]
fn run_until_stops_before_later_events_and_advances_clock() {
    let log = Log::default();
    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, mark(1, &log));
    sim.schedule(SimTime(10), mark(2, &log));

    let mut world = CountingWorld::default();
    sim.run_until(SimTime(5), &mut world);
    assert_eq!(ids(&log), [1]);
    assert_eq!(sim.now(), SimTime(5));
    assert_eq!(sim.pending(), 1);

    sim.run(&mut world);
    assert_eq!(ids(&log), [1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn run_until_includes_events_exactly_at_the_horizon() {
    let log = Log::default();
    let mut sim = Simulator::default();
    sim.schedule(SimTime(5), mark(1, &log));

    sim.run_until(SimTime(5), &mut CountingWorld::default());
    assert_eq!(ids(&log), [1]);
    assert_eq!(sim.now(), SimTime(5));
}

#[test]
fn run_until_advances_an_idle_clock() {
    let mut sim = Simulator::default();
    let mut world = CountingWorld::default();
    sim.run_until(SimTime(7), &mut world);
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(world.ticks, 0);
    assert_eq!(sim.executed(), 0);
}
