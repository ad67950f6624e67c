//! Time routing through sequential, parallel and nested timelines.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use kinetic_core::{
    EasingFunction, EventMask, Mode, MutableFloat, Node, Phase, Shared, Timeline, Tween,
    TweenCallback, TweenEngine, TweenEvent, shared,
};

const EPSILON: f32 = 0.0001;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

type Log = Arc<Mutex<Vec<(&'static str, TweenEvent)>>>;

fn tagged(log: &Log, tag: &'static str) -> TweenCallback {
    let sink = Arc::clone(log);
    TweenCallback::on(EventMask::ANY, move |event, _| {
        sink.lock().unwrap().push((tag, event));
    })
}

fn linear_to(
    engine: &TweenEngine,
    target: &Shared<MutableFloat>,
    value: f32,
    duration: f32,
) -> Result<Tween> {
    Ok(engine
        .to(target, 0, duration)?
        .target(&[value])?
        .ease(EasingFunction::Linear))
}

fn per_node(log: &Log) -> BTreeMap<&'static str, Vec<TweenEvent>> {
    let mut grouped: BTreeMap<&'static str, Vec<TweenEvent>> = BTreeMap::new();
    for (tag, event) in std::mem::take(&mut *log.lock().unwrap()) {
        grouped.entry(tag).or_default().push(event);
    }
    grouped
}

#[test]
fn test_calls_and_pauses_repeat_in_order() -> Result<()> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let call = |id: u32| {
        let sink = Arc::clone(&calls);
        Tween::call(move |_, _| sink.lock().unwrap().push(id))
    };
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut timeline = Timeline::sequence()
        .push(call(1))?
        .push_pause(1.0)?
        .push(call(2))?
        .push_pause(1.0)?
        .push(call(3))?
        .repeat(2, 1.0)?
        .add_callback(tagged(&log, "tl"))
        .build()?;
    assert_eq!(timeline.lifecycle().duration(), 2.0);
    assert_eq!(timeline.lifecycle().full_duration(), Some(8.0));

    timeline.start()?;
    for _ in 0..36 {
        timeline.update(0.25)?;
    }

    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3, 1, 2, 3, 1, 2, 3]);
    let events: Vec<TweenEvent> = log.lock().unwrap().iter().map(|(_, e)| *e).collect();
    assert_eq!(
        events,
        vec![
            TweenEvent::Begin,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Complete,
        ]
    );
    assert!(timeline.lifecycle().is_finished());
    Ok(())
}

#[test]
fn test_parallel_children_complete_before_parent() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut timeline = Timeline::parallel()
        .push(linear_to(&engine, &a, 1.0, 1.0)?.add_callback(tagged(&log, "a")))?
        .push(linear_to(&engine, &b, 1.0, 2.0)?.add_callback(tagged(&log, "b")))?
        .add_callback(tagged(&log, "tl"))
        .build()?;
    assert_eq!(timeline.mode(), Mode::Parallel);
    assert_eq!(timeline.lifecycle().duration(), 2.0);

    timeline.start()?;
    for _ in 0..5 {
        timeline.update(0.5)?;
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("tl", TweenEvent::Begin),
            ("tl", TweenEvent::Start),
            ("a", TweenEvent::Begin),
            ("a", TweenEvent::Start),
            ("b", TweenEvent::Begin),
            ("b", TweenEvent::Start),
            ("a", TweenEvent::End),
            ("a", TweenEvent::Complete),
            ("b", TweenEvent::End),
            ("b", TweenEvent::Complete),
            ("tl", TweenEvent::End),
            ("tl", TweenEvent::Complete),
        ]
    );
    assert_eq!(a.lock().value(), 1.0);
    assert_eq!(b.lock().value(), 1.0);
    assert!(approx_eq(timeline.children()[1].lifecycle().current_time(), 2.0));
    Ok(())
}

#[test]
fn test_sequence_plays_forwards_backwards_forwards() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let value = shared(MutableFloat::new(0.0));
    let mut timeline = Timeline::sequence()
        .push(linear_to(&engine, &value, 10.0, 1.0)?)?
        .push(linear_to(&engine, &value, 20.0, 1.0)?)?
        .build()?;
    timeline.start()?;

    let mut drive = |delta: f32| -> Result<Vec<f32>> {
        let mut seen = Vec::new();
        for _ in 0..4 {
            timeline.update(delta)?;
            seen.push(value.lock().value());
        }
        Ok(seen)
    };
    let close = |seen: &[f32], expected: &[f32]| {
        seen.len() == expected.len() && seen.iter().zip(expected).all(|(a, b)| approx_eq(*a, *b))
    };

    assert!(close(&drive(0.5)?, &[5.0, 10.0, 15.0, 20.0]));
    assert!(close(&drive(-0.5)?, &[15.0, 10.0, 5.0, 0.0]));
    assert!(close(&drive(0.5)?, &[5.0, 10.0, 15.0, 20.0]));
    Ok(())
}

#[test]
fn test_nested_parallel_block() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let c = shared(MutableFloat::new(0.0));

    let mut timeline = Timeline::sequence()
        .push(linear_to(&engine, &a, 1.0, 1.0)?)?
        .begin_parallel()
        .push(linear_to(&engine, &b, 1.0, 1.0)?)?
        .push(linear_to(&engine, &c, 1.0, 0.5)?)?
        .end()?
        .build()?;
    assert_eq!(timeline.lifecycle().duration(), 2.0);
    assert!(timeline.contains_target(&c));

    timeline.start()?;
    timeline.update(1.25)?;
    assert_eq!(a.lock().value(), 1.0);
    assert_eq!(b.lock().value(), 0.25);
    assert_eq!(c.lock().value(), 0.5);

    for _ in 0..3 {
        timeline.update(0.25)?;
    }
    assert_eq!(a.lock().value(), 1.0);
    assert_eq!(b.lock().value(), 1.0);
    assert_eq!(c.lock().value(), 1.0);
    assert!(timeline.lifecycle().is_finished());
    assert!(timeline.children().iter().all(|child| child.is_finished()));
    Ok(())
}

#[test]
fn test_auto_reverse_timeline_plays_children_backwards() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let value = shared(MutableFloat::new(0.0));
    let mut timeline = Timeline::sequence()
        .push(linear_to(&engine, &value, 10.0, 1.0)?)?
        .repeat_auto_reverse(1, 0.0)?
        .build()?;
    timeline.start()?;

    let mut seen = Vec::new();
    for _ in 0..4 {
        timeline.update(0.5)?;
        seen.push(value.lock().value());
    }
    assert_eq!(seen, vec![5.0, 10.0, 5.0, 0.0]);
    assert!(timeline.lifecycle().is_finished());
    Ok(())
}

#[test]
fn test_killed_child_is_skipped() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let first = linear_to(&engine, &a, 10.0, 1.0)?;
    let handle = first.handle();
    let mut timeline = Timeline::sequence()
        .push(first)?
        .push(linear_to(&engine, &b, 10.0, 1.0)?)?
        .build()?;
    timeline.start()?;

    handle.kill();
    timeline.update(0.5)?;

    assert_eq!(a.lock().value(), 0.0);
    assert_eq!(b.lock().value(), 5.0);
    assert_eq!(timeline.current_index(), 1);
    Ok(())
}

#[test]
fn test_parallel_overshoot_in_one_call() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut timeline = Timeline::parallel()
        .push(linear_to(&engine, &a, 1.0, 1.0)?.add_callback(tagged(&log, "a")))?
        .push(linear_to(&engine, &b, 1.0, 2.0)?.add_callback(tagged(&log, "b")))?
        .add_callback(tagged(&log, "tl"))
        .build()?;
    timeline.start()?;
    timeline.update(3.0)?;

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("tl", TweenEvent::Begin),
            ("tl", TweenEvent::Start),
            ("a", TweenEvent::Begin),
            ("a", TweenEvent::Start),
            ("a", TweenEvent::End),
            ("a", TweenEvent::Complete),
            ("b", TweenEvent::Begin),
            ("b", TweenEvent::Start),
            ("b", TweenEvent::End),
            ("b", TweenEvent::Complete),
            ("tl", TweenEvent::End),
            ("tl", TweenEvent::Complete),
        ]
    );
    // The shorter child keeps the time it was handed past its end.
    assert!(approx_eq(timeline.children()[0].lifecycle().current_time(), 2.0));
    assert!(approx_eq(timeline.children()[1].lifecycle().current_time(), 2.0));
    assert_eq!(timeline.lifecycle().current_time(), 3.0);
    assert_eq!(a.lock().value(), 1.0);
    assert_eq!(b.lock().value(), 1.0);
    Ok(())
}

#[test]
fn test_reverse_out_of_child_repeat_delay() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut timeline = Timeline::sequence()
        .push(
            linear_to(&engine, &a, 10.0, 1.0)?
                .repeat(1, 0.5)?
                .add_callback(tagged(&log, "a")),
        )?
        .push(linear_to(&engine, &b, 10.0, 1.0)?)?
        .build()?;
    assert_eq!(timeline.lifecycle().duration(), 3.5);
    timeline.start()?;

    timeline.update(1.25)?;
    assert_eq!(a.lock().value(), 10.0);
    timeline.update(-1.25)?;

    assert_eq!(timeline.lifecycle().current_time(), 0.0);
    assert_eq!(a.lock().value(), 0.0);
    assert_eq!(timeline.children()[0].lifecycle().phase(), Phase::Finished);
    assert_eq!(
        per_node(&log)["a"],
        vec![
            TweenEvent::Begin,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::BackStart,
            TweenEvent::BackEnd,
            TweenEvent::BackComplete,
        ]
    );

    timeline.update(3.5)?;
    assert_eq!(a.lock().value(), 10.0);
    assert_eq!(b.lock().value(), 10.0);
    assert!(timeline.lifecycle().is_finished());
    Ok(())
}

#[test]
fn test_reverse_out_of_timeline_repeat_delay() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let value = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut timeline = Timeline::sequence()
        .push(linear_to(&engine, &value, 10.0, 1.0)?)?
        .repeat(1, 0.5)?
        .add_callback(tagged(&log, "tl"))
        .build()?;
    timeline.start()?;

    timeline.update(1.25)?;
    assert!(timeline.lifecycle().is_in_delay());
    timeline.update(-1.25)?;
    assert_eq!(value.lock().value(), 0.0);
    assert_eq!(timeline.lifecycle().iteration(), 0);

    timeline.update(2.5)?;
    assert_eq!(
        per_node(&log)["tl"],
        vec![
            TweenEvent::Begin,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::BackStart,
            TweenEvent::BackEnd,
            TweenEvent::BackComplete,
            TweenEvent::Begin,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Complete,
        ]
    );
    assert_eq!(value.lock().value(), 10.0);
    assert!(timeline.lifecycle().is_finished());
    Ok(())
}

/// A sequence holding a delayed tween, a parallel block with a repeating
/// child and an auto-reversing tween, repeated once after a delay.
fn nested_scene(
    engine: &TweenEngine,
    values: &[Shared<MutableFloat>; 4],
    log: &Log,
) -> Result<Timeline> {
    Ok(Timeline::sequence()
        .push(
            linear_to(engine, &values[0], 1.0, 0.5)?
                .delay(0.25)?
                .add_callback(tagged(log, "a")),
        )?
        .begin_parallel()
        .push(
            linear_to(engine, &values[1], 1.0, 0.5)?
                .repeat(1, 0.25)?
                .add_callback(tagged(log, "b")),
        )?
        .push(
            linear_to(engine, &values[2], 1.0, 0.25)?
                .delay(0.25)?
                .add_callback(tagged(log, "c")),
        )?
        .add_callback(tagged(log, "block"))
        .end()?
        .push(
            linear_to(engine, &values[3], 1.0, 0.5)?
                .repeat_auto_reverse(1, 0.25)?
                .add_callback(tagged(log, "d")),
        )?
        .repeat(1, 0.5)?
        .add_callback(tagged(log, "root"))
        .build()?)
}

#[test]
fn test_frame_steps_match_one_large_step() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let frame = 1.0_f32 / 60.0;

    let whole_values: [Shared<MutableFloat>; 4] =
        std::array::from_fn(|_| shared(MutableFloat::new(0.0)));
    let whole_log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut whole = nested_scene(&engine, &whole_values, &whole_log)?;
    assert_eq!(whole.lifecycle().duration(), 3.25);
    assert_eq!(whole.lifecycle().full_duration(), Some(7.0));

    let stepped_values: [Shared<MutableFloat>; 4] =
        std::array::from_fn(|_| shared(MutableFloat::new(0.0)));
    let stepped_log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut stepped = nested_scene(&engine, &stepped_values, &stepped_log)?;

    let values_of = |values: &[Shared<MutableFloat>; 4]| -> Vec<f32> {
        values.iter().map(|value| value.lock().value()).collect()
    };

    whole.start()?;
    stepped.start()?;
    whole.update(10.0)?;
    for _ in 0..600 {
        stepped.update(frame)?;
    }

    let forwards = per_node(&whole_log);
    assert_eq!(forwards, per_node(&stepped_log));
    assert_eq!(forwards.len(), 6);
    assert_eq!(
        forwards["b"],
        vec![
            TweenEvent::Begin,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Start,
            TweenEvent::End,
            TweenEvent::Complete,
        ]
        .repeat(2)
    );
    assert_eq!(values_of(&whole_values), vec![1.0, 1.0, 1.0, 0.0]);
    assert_eq!(values_of(&stepped_values), vec![1.0, 1.0, 1.0, 0.0]);
    assert!(whole.lifecycle().is_finished());
    assert!(stepped.lifecycle().is_finished());

    whole.update(-12.0)?;
    for _ in 0..720 {
        stepped.update(-frame)?;
    }

    let backwards = per_node(&whole_log);
    assert_eq!(backwards, per_node(&stepped_log));
    assert_eq!(
        backwards["root"],
        vec![
            TweenEvent::BackBegin,
            TweenEvent::BackStart,
            TweenEvent::BackEnd,
            TweenEvent::BackStart,
            TweenEvent::BackEnd,
            TweenEvent::BackComplete,
        ]
    );
    assert_eq!(values_of(&whole_values), vec![0.0; 4]);
    assert_eq!(values_of(&stepped_values), vec![0.0; 4]);
    assert!(whole.lifecycle().is_finished());
    assert!(stepped.lifecycle().is_finished());
    Ok(())
}

#[test]
fn test_set_progress_moves_children() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let a = shared(MutableFloat::new(0.0));
    let b = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut node = Node::from(
        Timeline::sequence()
            .push(linear_to(&engine, &a, 10.0, 1.0)?.add_callback(tagged(&log, "a")))?
            .push(linear_to(&engine, &b, 10.0, 1.0)?)?
            .add_callback(tagged(&log, "tl"))
            .build()?,
    );
    node.start()?;

    node.set_progress(0.75, true)?;
    assert_eq!(a.lock().value(), 10.0);
    assert_eq!(b.lock().value(), 5.0);
    assert_eq!(node.as_timeline().map(Timeline::current_index), Some(1));

    node.set_progress(0.25, false)?;
    assert_eq!(a.lock().value(), 5.0);
    assert_eq!(b.lock().value(), 0.0);
    assert_eq!(node.lifecycle().current_time(), 0.5);
    assert!(!node.lifecycle().direction());
    assert_eq!(node.as_timeline().map(Timeline::current_index), Some(0));
    assert!(log.lock().unwrap().is_empty());

    node.update(-0.5)?;
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("a", TweenEvent::BackEnd),
            ("a", TweenEvent::BackComplete),
            ("tl", TweenEvent::BackEnd),
            ("tl", TweenEvent::BackComplete),
        ]
    );
    Ok(())
}

#[test]
fn test_timeline_update_actions_and_cleared_callbacks() -> Result<()> {
    let engine = TweenEngine::new().with_primitives();
    let value = shared(MutableFloat::new(0.0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let updates = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&updates);

    let mut timeline = Timeline::sequence()
        .push(linear_to(&engine, &value, 1.0, 1.0)?)?
        .add_callback(tagged(&log, "tl"))
        .clear_callbacks()
        .on_update_end(move |_| *counter.lock().unwrap() += 1)
        .build()?;
    assert_eq!(timeline.lifecycle().callback_count(), 0);
    timeline.start()?;

    for _ in 0..3 {
        timeline.update(0.5)?;
    }
    assert_eq!(*updates.lock().unwrap(), 3);
    assert!(log.lock().unwrap().is_empty());
    assert!(timeline.lifecycle().is_finished());
    Ok(())
}
