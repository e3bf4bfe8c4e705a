//! Group fan-out: flatten order, per-leaf templating, concurrency, dry-run
//! inheritance and cycle rejection.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cnctl::application::{Agent, AgentRef, AgentRegistry, Operation, aggregate_exit_code};
use cnctl::domain::{AgentError, RegistryError, Tag};

use crate::helpers::{Harness, StandIn, harness};

fn leaf(h: &Harness, name: &str) -> AgentRef {
    Agent::local(name).build(&h.wiring).unwrap()
}

#[tokio::test]
async fn test_flatten_follows_member_order_through_nested_groups() {
    let h = harness(StandIn::shell());
    let outer = Agent::group("outer", "", false).unwrap();
    let inner = Agent::group("inner", "", false).unwrap();
    outer.add(leaf(&h, "a")).unwrap();
    outer.add(leaf(&h, "b")).unwrap();
    outer.connect().await.unwrap();
    let names: Vec<String> = outer.flatten().await.into_iter().map(|s| s.agent).collect();
    assert_eq!(names, ["a", "b"]);

    inner.add(leaf(&h, "c")).unwrap();
    inner.add(leaf(&h, "d")).unwrap();
    outer.add(Arc::clone(&inner)).unwrap();
    outer.connect().await.unwrap();
    let handles = outer.flatten().await;
    let names: Vec<&str> = handles.iter().map(|s| s.agent.as_str()).collect();
    assert_eq!(names, ["a", "b", "c", "d"]);
    assert!(handles.iter().all(|s| s.pid.is_some()));

    outer.reset().await;
    assert!(outer.flatten().await.is_empty());
}

#[test]
fn test_cycles_rejected_when_added() {
    let outer = Agent::group("outer", "", false).unwrap();
    let inner = Agent::group("inner", "", false).unwrap();
    outer.add(Arc::clone(&inner)).unwrap();
    assert!(matches!(
        outer.add(Arc::clone(&outer)),
        Err(AgentError::Cycle { .. })
    ));
    assert!(matches!(inner.add(outer), Err(AgentError::Cycle { .. })));
}

#[tokio::test]
async fn test_group_shell_substitutes_per_leaf() {
    let h = harness(StandIn::shell());
    let group = Agent::group("web", "web tier", false).unwrap();
    for name in ["w1", "w2", "w3"] {
        group.add(leaf(&h, name)).unwrap();
    }

    let reports = group
        .serialize(&[Operation::shell("echo <(name)> <(desc)>")], false)
        .await
        .unwrap();

    let got: Vec<(&str, &[String])> = reports
        .iter()
        .map(|r| (r.agent.as_str(), r.stdout.as_slice()))
        .collect();
    assert_eq!(got.len(), 3);
    for (i, name) in ["w1", "w2", "w3"].iter().enumerate() {
        assert_eq!(got[i].0, *name);
        assert_eq!(got[i].1, [name.to_string()]);
        assert_eq!(h.sink.messages(name, Tag::Input), [format!("echo {name} ")]);
    }
    assert_eq!(aggregate_exit_code(&reports), Some(0));
}

#[tokio::test]
async fn test_group_reports_each_member_exit_code() {
    let h = harness(StandIn::shell());
    let group = Agent::group("pair", "", false).unwrap();
    group.add(leaf(&h, "ok")).unwrap();
    group.add(leaf(&h, "bad")).unwrap();
    let reports = group
        .serialize(
            &[Operation::shell("test <(name)> = ok || exit 5")],
            true,
        )
        .await
        .unwrap();
    assert_eq!(reports[0].exit_code, Some(0));
    assert_eq!(reports[1].exit_code, Some(5));
    assert_eq!(aggregate_exit_code(&reports), Some(5));
}

#[tokio::test]
async fn test_fan_out_runs_members_concurrently() {
    let h = harness(StandIn::shell());
    let group = Agent::group("fleet", "", false).unwrap();
    for name in ["n1", "n2", "n3", "n4"] {
        group.add(leaf(&h, name)).unwrap();
    }
    let started = Instant::now();
    let reports = group
        .serialize(&[Operation::shell("sleep 1")], true)
        .await
        .unwrap();
    assert_eq!(reports.len(), 4);
    assert!(
        started.elapsed() < Duration::from_millis(3500),
        "fan-out took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_leaf_shared_by_two_groups_runs_once() {
    let h = harness(StandIn::shell());
    let shared = leaf(&h, "shared");
    let left = Agent::group("left", "", false).unwrap();
    let right = Agent::group("right", "", false).unwrap();
    let both = Agent::group("both", "", false).unwrap();
    left.add(Arc::clone(&shared)).unwrap();
    right.add(shared).unwrap();
    both.add(left).unwrap();
    both.add(right).unwrap();

    let reports = both
        .serialize(&[Operation::shell("echo hi")], true)
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(h.connector.calls().len(), 1);
}

#[tokio::test]
async fn test_dry_run_group_logs_per_leaf_without_connecting() {
    let h = harness(StandIn::shell());
    let group = Agent::group("web", "", true).unwrap();
    group.add(leaf(&h, "w1")).unwrap();
    group.add(leaf(&h, "w2")).unwrap();

    group.shell("deploy <(name)>", false).await.unwrap();
    let reports = group.flush(false).await.unwrap();

    assert!(h.connector.calls().is_empty());
    assert_eq!(h.sink.messages("w1", Tag::Input), ["deploy w1"]);
    assert_eq!(h.sink.messages("w2", Tag::Input), ["deploy w2"]);
    assert!(reports.iter().all(|r| r.exit_code.is_none()));
}

#[tokio::test]
async fn test_member_failure_is_returned_after_all_members_finish() {
    let h = harness(StandIn::shell());
    let group = Agent::group("mixed", "", false).unwrap();
    group.add(leaf(&h, "fine")).unwrap();
    group
        .add(Agent::unbound("ghost").build(&h.wiring).unwrap())
        .unwrap();

    let err = group.connect().await.unwrap_err();
    assert!(matches!(err, AgentError::UnimplementedCapability(ref n) if n == "ghost"));
    let connected: Vec<String> = group.flatten().await.into_iter().map(|s| s.agent).collect();
    assert_eq!(connected, ["fine"]);
    group.reset().await;
}

#[test]
fn test_registry_rejects_duplicate_and_keeps_first() {
    let h = harness(StandIn::shell());
    let mut agents = AgentRegistry::new();
    agents
        .add(Agent::local("web1").description("first").build(&h.wiring).unwrap())
        .unwrap();
    let err = agents
        .add(Agent::local("web1").description("second").build(&h.wiring).unwrap())
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEntry { ref name, .. } if name == "web1"));
    assert_eq!(agents.get("web1").unwrap().description(), "first");
}
