//! Console tracer: plays a tween and a timeline forwards, backwards and
//! forwards again, printing every lifecycle event as it fires.

use anyhow::{Context, Result, bail};
use kinetic_config::KineticConfig;
use kinetic_core::{
    EventMask, MutableFloat, Node, Shared, Timeline, Tween, TweenCallback, TweenEngine, shared,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = KineticConfig::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!(
        "Starting kinetic tracer v{} (step {}s)",
        env!("CARGO_PKG_VERSION"),
        config.demo.step
    );

    let engine = TweenEngine::from_config(&config.engine).with_primitives();
    match config.demo.scene.as_deref() {
        None => {
            trace_tween(&engine, config.demo.step)?;
            trace_timeline(config.demo.step)?;
        }
        Some("tween") => trace_tween(&engine, config.demo.step)?,
        Some("timeline") => trace_timeline(config.demo.step)?,
        Some(other) => bail!("unknown scene '{other}', expected 'tween' or 'timeline'"),
    }
    Ok(())
}

/// Prints `<tag> <EVENT>   lt <local time>   v <value>` for every event.
fn printer(tag: &'static str, value: Option<Shared<MutableFloat>>) -> TweenCallback {
    TweenCallback::on(EventMask::ANY, move |event, node| {
        let v = value.as_ref().map_or(0.0, |value| value.lock().value());
        println!(
            "{tag} {}   lt {:.2}   v {:.2}",
            event.label(),
            node.current_time(),
            v
        );
    })
}

fn trace_tween(engine: &TweenEngine, step: f32) -> Result<()> {
    let value = shared(MutableFloat::new(0.0));
    let tween = engine
        .to(&value, 0, 1.0)?
        .target(&[1.0])?
        .repeat(2, 1.0)?
        .delay(1.0)?
        .add_callback(printer("T ", Some(value.clone())));

    info!("tween trace");
    drive(Node::from(tween), step)
}

fn trace_timeline(step: f32) -> Result<()> {
    let call = |name: &'static str| {
        Tween::call(move |_, node| println!("   {name} fired at lt {:.2}", node.current_time()))
    };
    let timeline = Timeline::sequence()
        .push(call("t1"))?
        .push_pause(1.0)?
        .push(call("t2"))?
        .push_pause(1.0)?
        .push(call("t3"))?
        .repeat(2, 1.0)?
        .add_callback(printer("TL", None))
        .build()?;

    info!("timeline trace");
    drive(Node::from(timeline), step)
}

/// Runs the node to one second past its end, back to where it started, then
/// forwards again.
fn drive(mut node: Node, step: f32) -> Result<()> {
    if step <= 0.0 {
        bail!("step must be positive, got {step}");
    }
    let span = node
        .full_duration()
        .context("cannot trace a node that repeats forever")?;
    let steps = ((span + 1.0) / step).round() as usize;

    node.start()?;
    for (pass, delta) in [("forwards", step), ("backwards", -step), ("forwards", step)] {
        info!(pass, steps, "driving");
        for _ in 0..steps {
            node.update(delta)?;
        }
    }
    node.free();
    Ok(())
}
