//! Behavioural tests for the bridge bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::directory::StatsSnapshot;

use super::support::{self, HealthEvent, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_successful_loader();
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a configuration loader with a blank base DN")]
fn given_blank_base_dn(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_blank_base_dn();
}

#[when("the bridge bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.bridge().is_some(), "bridge should have been built");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[then("the reporter recorded bootstrap failure mentioning \"{text}\"")]
fn then_reporter_failure_mentions(world: &RefCell<TestWorld>, text: String) {
    let events = world.borrow().reporter.events();
    let mentioned = events.iter().any(|event| match event {
        HealthEvent::BootstrapFailed(message) => message.contains(&text),
        _ => false,
    });
    assert!(mentioned, "no failure mentioning '{text}': {events:?}");
}

#[then("the listener socket directory exists")]
fn then_socket_directory_exists(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let bridge = world.bridge().expect("bridge missing");
    let path = bridge
        .config()
        .listen_socket()
        .unix_path()
        .expect("test listener uses a unix socket");
    let parent = path.parent().expect("socket path has a parent");
    assert!(parent.is_dir(), "{parent} was not created");
}

#[then("every counter starts at zero")]
fn then_counters_zero(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let bridge = world.bridge().expect("bridge missing");
    assert_eq!(bridge.stats().snapshot(), StatsSnapshot::default());
}

#[scenario(
    path = "tests/features/bridge_bootstrap.feature",
    name = "Bootstrap succeeds with a valid configuration"
)]
fn bootstrap_succeeds(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_bootstrap.feature",
    name = "Bootstrap fails when configuration cannot be loaded"
)]
fn bootstrap_fails_on_configuration(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_bootstrap.feature",
    name = "Bootstrap rejects a blank base DN"
)]
fn bootstrap_rejects_blank_base_dn(world: RefCell<TestWorld>) {
    let _ = world;
}
