//! Tasks and dispatch against real sessions: targeting, dependency order,
//! scripted inventory tasks, background steps and the `task!` macro.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cnctl::application::{Agent, AgentRef, AgentRegistry, Dispatcher, Inventory, TaskRegistry};
use cnctl::domain::{InventoryConfig, Tag, TaskError};

use crate::helpers::{Harness, StandIn, harness};

fn inventory(h: &Harness, yaml: &str) -> Inventory {
    let config: InventoryConfig = serde_yaml::from_str(yaml).unwrap();
    Inventory::build(&config, &h.wiring, false).unwrap()
}

const FLEET: &str = r"
agents:
  - name: w1
    kind: remote
    host: w1.internal
    user: deploy
  - name: w2
    kind: remote
    host: w2.internal
    user: deploy
  - name: dbHost
    kind: remote
    host: db.internal
    user: postgres
groups:
  - name: webGroup
    members: [w1, w2]
tasks:
  - name: prepare
    commands: ['echo prepare <(name)>']
  - name: migrate
    limit: [dbHost]
    commands: ['echo migrate <(host)>']
  - name: restart
    limit: [webGroup]
    depends: [prepare, dbHost.migrate]
    commands: ['echo restart <(name)>']
";

#[tokio::test]
async fn test_limit_skips_agents_outside_the_group() {
    let h = harness(StandIn::shell());
    let inv = inventory(&h, FLEET);
    let d = inv.dispatcher(false);

    let steps = d.dispatch("restart", "dbHost").await.unwrap();
    let restart = steps.last().unwrap();
    assert_eq!(restart.task, "restart");
    assert!(!restart.invoked);
    assert!(h.sink.messages("dbHost", Tag::Output).iter().all(|l| !l.starts_with("restart")));
}

#[tokio::test]
async fn test_dependencies_run_first_on_their_agents() {
    let h = harness(StandIn::shell());
    let inv = inventory(&h, FLEET);

    let steps = inv.dispatcher(false).dispatch("restart", "w1").await.unwrap();
    let order: Vec<(String, String)> = steps
        .iter()
        .map(|s| (s.agent.clone(), s.task.clone()))
        .collect();
    assert_eq!(
        order,
        [
            ("w1".to_string(), "prepare".to_string()),
            ("dbHost".to_string(), "migrate".to_string()),
            ("w1".to_string(), "restart".to_string()),
        ]
    );
    assert!(steps.iter().all(|s| s.invoked));
    assert_eq!(
        h.sink.messages("w1", Tag::Output),
        ["prepare w1", "restart w1"]
    );
    assert_eq!(h.sink.messages("dbHost", Tag::Output), ["migrate db.internal"]);
}

#[tokio::test]
async fn test_group_target_runs_every_member() {
    let h = harness(StandIn::shell());
    let inv = inventory(&h, FLEET);

    let steps = inv
        .dispatcher(true)
        .dispatch("prepare", "webGroup")
        .await
        .unwrap();
    let agents: Vec<&str> = steps[0].reports.iter().map(|r| r.agent.as_str()).collect();
    assert_eq!(agents, ["w1", "w2"]);
    assert_eq!(steps[0].reports[1].stdout, ["prepare w2"]);
}

#[tokio::test]
async fn test_unknown_names_fail_planning() {
    let h = harness(StandIn::shell());
    let inv = inventory(&h, FLEET);
    let d = inv.dispatcher(true);
    assert!(matches!(
        d.dispatch("nope", "w1").await,
        Err(TaskError::UnknownTask(_))
    ));
    assert!(matches!(
        d.dispatch("prepare", "nowhere").await,
        Err(TaskError::UnknownAgent(_))
    ));
}

#[tokio::test]
async fn test_background_steps_overlap_but_dependents_wait() {
    let h = harness(StandIn::shell());
    let inv = inventory(
        &h,
        r"
agents:
  - name: a
  - name: b
tasks:
  - name: slow
    background: true
    commands: ['sleep 1; echo slept']
  - name: all
    depends: [a.slow, b.slow]
    commands: ['echo done']
",
    );
    let started = Instant::now();
    let steps = inv.dispatcher(false).dispatch("all", "local").await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1900), "took {elapsed:?}");

    let order: Vec<(&str, &str)> = steps
        .iter()
        .map(|s| (s.agent.as_str(), s.task.as_str()))
        .collect();
    assert_eq!(order, [("a", "slow"), ("b", "slow"), ("local", "all")]);
    assert_eq!(steps.iter().filter(|s| s.background).count(), 2);

    let output: Vec<String> = h
        .sink
        .all()
        .into_iter()
        .filter(|(_, tag, _)| *tag == Tag::Output)
        .map(|(_, _, line)| line)
        .collect();
    assert_eq!(output, ["slept", "slept", "done"]);
}

#[tokio::test]
async fn test_failing_step_stops_the_plan() {
    let h = harness(StandIn::shell());
    let inv = inventory(
        &h,
        r"
agents:
  - name: ghost
    kind: unbound
tasks:
  - name: first
    commands: ['true']
  - name: second
    depends: [first]
    commands: ['echo unreachable']
",
    );
    let err = inv
        .dispatcher(true)
        .dispatch("second", "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Failed { ref task, .. } if task == "first"));
}

async fn greet(agent: AgentRef) -> anyhow::Result<()> {
    agent.shell("echo hello from <(name)>", false).await?;
    Ok(())
}

async fn wave(agent: AgentRef) -> anyhow::Result<()> {
    agent.shell("echo wave", false).await?;
    Ok(())
}

#[tokio::test]
async fn test_task_macro_registers_functions_by_name() {
    let h = harness(StandIn::shell());
    let mut agents = AgentRegistry::new();
    agents.add(Agent::local("box").build(&h.wiring).unwrap()).unwrap();
    agents.add(Agent::local("other").build(&h.wiring).unwrap()).unwrap();

    let mut tasks = TaskRegistry::new();
    cnctl::task!(&mut tasks, greet).unwrap();
    cnctl::task!(&mut tasks, wave, depends_on = &["greet"], limit = &["box"]).unwrap();
    assert_eq!(tasks.names(), ["greet", "wave"]);

    let d = Dispatcher::new(Arc::new(agents), Arc::new(tasks));
    d.dispatch("wave", "box").await.unwrap();
    assert_eq!(
        h.sink.messages("box", Tag::Output),
        ["hello from box", "wave"]
    );

    let steps = d.dispatch("wave", "other").await.unwrap();
    assert!(steps[0].invoked);
    assert!(!steps[1].invoked);
}

#[tokio::test]
async fn test_task_macro_describes_tasks_from_doc_comments() {
    let h = harness(StandIn::shell());
    let mut agents = AgentRegistry::new();
    agents.add(Agent::local("box").build(&h.wiring).unwrap()).unwrap();

    let mut tasks = TaskRegistry::new();
    cnctl::task!(
        &mut tasks,
        /// Prints the kernel
        /// name.
        ///
        /// Not part of the listing.
        async fn kernel(agent: AgentRef) -> anyhow::Result<()> {
            agent.shell("echo linux", false).await?;
            Ok(())
        }
    )
    .unwrap();
    cnctl::task!(
        &mut tasks,
        /// Reports after the kernel.
        #[task(depends_on = &["kernel"], background = true)]
        async fn report(agent: AgentRef) -> anyhow::Result<()> {
            agent.shell("echo reported", false).await?;
            Ok(())
        }
    )
    .unwrap();

    let kernel = tasks.get("kernel").unwrap();
    assert_eq!(kernel.description(), "Prints the kernel name.");
    let report = tasks.get("report").unwrap();
    assert_eq!(report.description(), "Reports after the kernel.");
    assert!(report.background());
    assert_eq!(report.depends_on()[0].task, "kernel");

    let d = Dispatcher::new(Arc::new(agents), Arc::new(tasks));
    d.dispatch("report", "box").await.unwrap();
    assert_eq!(h.sink.messages("box", Tag::Output), ["linux", "reported"]);
}
