//! Integration test: work-item batch semantics.
//!
//! Covers resumption across `process` calls, once-per-batch
//! notifications and recalculation, the forced-completion contract,
//! the reentrancy guard, and items enqueued from inside an update.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;

use warren_core::SchedulerError;
use warren_engine::{BatchEvent, FnWorkItem, NavWorld, Progress, WorldConfig};
use warren_test_utils::GridGraph;

fn scanned_grid(width: u32, height: u32) -> NavWorld<GridGraph> {
    let mut world = NavWorld::new(GridGraph::new(width, height), WorldConfig::linear()).unwrap();
    world.scan().unwrap();
    world
}

fn record(world: &mut NavWorld<GridGraph>) -> Rc<RefCell<Vec<BatchEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    world.subscribe(move |event| sink.borrow_mut().push(event));
    log
}

#[test]
fn pending_item_resumes_without_rerunning_init() {
    const PENDING: u32 = 4;
    let mut world = scanned_grid(2, 2);
    let inits = Rc::new(Cell::new(0));
    let updates = Rc::new(Cell::new(0));

    let (i, u) = (Rc::clone(&inits), Rc::clone(&updates));
    world.enqueue(
        FnWorkItem::new("slow", move |_, _| {
            u.set(u.get() + 1);
            Ok(if u.get() <= PENDING {
                Progress::Pending
            } else {
                Progress::Done
            })
        })
        .with_init(move |_| {
            i.set(i.get() + 1);
            Ok(())
        }),
    );

    for _ in 0..PENDING {
        assert!(!world.process_work_items(false, true).unwrap());
        assert_eq!(world.pending_work_items(), 1);
    }
    assert!(world.process_work_items(false, true).unwrap());

    assert_eq!(updates.get(), PENDING + 1);
    assert_eq!(inits.get(), 1);
    assert_eq!(world.pending_work_items(), 0);
    assert_eq!(world.last_metrics().process_calls, PENDING + 1);
}

#[test]
fn five_dirtying_items_share_one_recalculation() {
    let mut world = scanned_grid(8, 8);
    let log = record(&mut world);
    let recalculations = world.hierarchy().stats().recalculations;

    for i in 0..5u32 {
        world.enqueue(FnWorkItem::<GridGraph>::once(format!("wall-{i}"), move |ctx| {
            ctx.prepare_for_update();
            let node = ctx.graph().node(i, 3);
            ctx.graph_mut().set_walkable(node, false);
            ctx.mark_dirty(node);
            Ok(())
        }));
    }
    assert!(world.process_work_items(false, true).unwrap());

    assert_eq!(
        *log.borrow(),
        vec![
            BatchEvent::BeforeBatch,
            BatchEvent::BeforeAreaRecalculation,
            BatchEvent::AfterUpdate,
        ]
    );
    assert_eq!(
        world.hierarchy().stats().recalculations,
        recalculations + 1
    );
    let metrics = world.last_metrics();
    assert_eq!(metrics.items_completed, 5);
    assert_eq!(metrics.nodes_marked_dirty, 5);
    assert!(metrics.recalculated);
}

#[test]
fn wall_across_grid_splits_it() {
    let mut world = scanned_grid(6, 6);
    world.enqueue(FnWorkItem::<GridGraph>::once("wall", |ctx| {
        for y in 0..6 {
            let node = ctx.graph().node(3, y);
            ctx.graph_mut().set_walkable(node, false);
            ctx.mark_dirty(node);
        }
        Ok(())
    }));
    world.flush_work_items().unwrap();

    let left = world.graph().node(0, 0);
    let right = world.graph().node(5, 5);
    assert!(!world.is_reachable(left, right));
    assert!(world.is_reachable(left, world.graph().node(2, 5)));
}

#[test]
fn forced_item_that_stays_pending_is_an_error() {
    let mut world = scanned_grid(2, 2);
    world.enqueue(FnWorkItem::new("stubborn", |_, _| Ok(Progress::Pending)));
    let err = world.process_work_items(true, true).unwrap_err();
    assert_eq!(
        err,
        SchedulerError::ForcedItemUnfinished {
            name: "stubborn".into()
        }
    );
    assert_eq!(world.pending_work_items(), 0);
}

#[test]
fn force_finishes_cooperative_items() {
    let mut world = scanned_grid(2, 2);
    world.enqueue(FnWorkItem::new("budgeted", |_, force| {
        Ok(if force {
            Progress::Done
        } else {
            Progress::Pending
        })
    }));
    assert!(!world.process_work_items(false, true).unwrap());
    world.flush_work_items().unwrap();
    assert_eq!(world.pending_work_items(), 0);
}

#[test]
fn flushing_from_inside_an_item_is_rejected() {
    let mut world = scanned_grid(2, 2);
    let outcome = Rc::new(RefCell::new(None));
    let o = Rc::clone(&outcome);
    world.enqueue(FnWorkItem::once("impatient", move |ctx| {
        *o.borrow_mut() = Some(ctx.flush_work_items(true));
        Ok(())
    }));
    world.enqueue(FnWorkItem::once("after", |_| Ok(())));

    assert!(world.process_work_items(false, true).unwrap());
    assert_eq!(*outcome.borrow(), Some(Err(SchedulerError::Reentrant)));
    assert_eq!(world.last_metrics().items_completed, 2);

    // The guard is released: the world keeps working.
    world.enqueue(FnWorkItem::once("later", |_| Ok(())));
    assert!(world.process_work_items(false, true).unwrap());
}

#[test]
fn items_enqueued_during_update_run_in_the_same_batch() {
    let mut world = scanned_grid(2, 2);
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = Rc::clone(&order);
    world.enqueue(FnWorkItem::once("parent", move |ctx| {
        o.borrow_mut().push("parent");
        let child = Rc::clone(&o);
        ctx.enqueue(FnWorkItem::once("child", move |_| {
            child.borrow_mut().push("child");
            Ok(())
        }));
        Ok(())
    }));
    let o = Rc::clone(&order);
    world.enqueue(FnWorkItem::once("sibling", move |_| {
        o.borrow_mut().push("sibling");
        Ok(())
    }));

    assert!(world.process_work_items(false, true).unwrap());
    assert_eq!(*order.borrow(), vec!["parent", "sibling", "child"]);
    assert_eq!(world.last_metrics().items_completed, 3);
}

proptest! {
    #[test]
    fn queued_items_resume_until_done(pendings in prop::collection::vec(0u32..6, 1..5)) {
        let mut world = scanned_grid(2, 2);
        let inits = Rc::new(Cell::new(0u32));
        let updates = Rc::new(Cell::new(0u32));
        for (k, &pending) in pendings.iter().enumerate() {
            let (i, u) = (Rc::clone(&inits), Rc::clone(&updates));
            let mut calls = 0;
            world.enqueue(
                FnWorkItem::new(format!("item-{k}"), move |_, _| {
                    calls += 1;
                    u.set(u.get() + 1);
                    Ok(if calls <= pending {
                        Progress::Pending
                    } else {
                        Progress::Done
                    })
                })
                .with_init(move |_| {
                    i.set(i.get() + 1);
                    Ok(())
                }),
            );
        }

        // Each pending update ends a call; the next item starts in the
        // same call that finishes the one before it.
        let expected_rounds = pendings.iter().sum::<u32>() + 1;
        let mut rounds = 1;
        while !world.process_work_items(false, true).unwrap() {
            rounds += 1;
            prop_assert!(rounds <= expected_rounds);
        }
        prop_assert_eq!(rounds, expected_rounds);
        prop_assert_eq!(inits.get(), pendings.len() as u32);
        prop_assert_eq!(updates.get(), pendings.iter().map(|p| p + 1).sum::<u32>());
        prop_assert_eq!(world.last_metrics().process_calls, expected_rounds);
        prop_assert_eq!(world.last_metrics().items_completed, pendings.len() as u32);
        prop_assert_eq!(world.pending_work_items(), 0);
    }
}
