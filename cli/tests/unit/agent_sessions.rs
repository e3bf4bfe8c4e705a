//! Leaf agents driving real sessions: templating, both transmission modes,
//! exit status, deadlines and batch reset.

use std::time::{Duration, Instant};

use cnctl::application::{Agent, Operation};
use cnctl::domain::{AgentError, Tag, TransmitMode};

use crate::helpers::{StandIn, harness};

#[tokio::test]
async fn test_remote_shell_transmits_substituted_host() {
    let h = harness(StandIn::echo());
    let db = Agent::remote("db1", "alice", "db1")
        .build(&h.wiring)
        .unwrap();

    db.shell("ping <(host)>", false).await.unwrap();
    db.end(false).await.unwrap();
    let reports = db.flush(false).await.unwrap();

    assert_eq!(reports[0].stdout, ["ping db1", "exit"]);
    assert_eq!(h.sink.messages("db1", Tag::Input), ["ping db1"]);
    let (program, args) = &h.connector.calls()[0];
    assert_eq!(program, "ssh");
    assert_eq!(args, &["db1", "-p", "22", "-l", "alice"]);
}

#[tokio::test]
async fn test_local_hostname_and_start_path_tokens() {
    let h = harness(StandIn::echo());
    let agent = Agent::remote("web1", "deploy", "10.0.0.5")
        .start_path("/srv/app")
        .build(&h.wiring)
        .unwrap();
    let reports = agent
        .serialize(
            &[Operation::shell("from <(local)> to <(user)>@<(host)>:<(startPath)>")],
            true,
        )
        .await
        .unwrap();
    assert_eq!(reports[0].stdout[0], "from controller to deploy@10.0.0.5:/srv/app");
}

#[tokio::test]
async fn test_immediate_mode_reports_all_channels() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box").build(&h.wiring).unwrap();

    let reports = agent
        .serialize(
            &[
                Operation::shell("echo out"),
                Operation::shell("echo first >&2; echo >&2; echo second >&2"),
            ],
            false,
        )
        .await
        .unwrap();

    let report = &reports[0];
    assert_eq!(report.stdout, ["out"]);
    assert_eq!(report.stderr, ["first", "second"]);
    assert_eq!(report.exit_code, Some(0));
    assert_eq!(h.sink.messages("box", Tag::Output), ["out"]);
    assert_eq!(h.sink.messages("box", Tag::Error), ["first", "second"]);
    assert_eq!(h.sink.messages("box", Tag::Return), ["0"]);
}

#[tokio::test]
async fn test_quiet_keeps_only_errors_and_exit_codes() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box").build(&h.wiring).unwrap();
    agent
        .serialize(&[Operation::shell("echo hidden; echo loud >&2")], true)
        .await
        .unwrap();
    assert_eq!(
        h.sink.all(),
        [
            ("box".to_string(), Tag::Error, "loud".to_string()),
            ("box".to_string(), Tag::Return, "0".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_exit_status_of_session_is_reported() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box").build(&h.wiring).unwrap();
    let reports = agent
        .serialize(&[Operation::shell("exit 3")], true)
        .await
        .unwrap();
    assert_eq!(reports[0].exit_code, Some(3));
}

#[tokio::test]
async fn test_buffered_batch_attributes_output_per_command() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box")
        .mode(TransmitMode::Buffered)
        .build(&h.wiring)
        .unwrap();

    agent.shell("echo alice", false).await.unwrap();
    agent.shell("echo /home/alice", false).await.unwrap();
    agent.shell("false", false).await.unwrap();
    let snapshot = agent.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_commands, 3);
    assert!(!snapshot.executed);

    agent.end(false).await.unwrap();
    let reports = agent.flush(false).await.unwrap();
    let outcomes = &reports[0].outcomes;
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].command, "echo alice");
    assert_eq!(outcomes[0].output, ["alice"]);
    assert_eq!(outcomes[0].exit_code, Some(0));
    assert_eq!(outcomes[1].output, ["/home/alice"]);
    assert!(outcomes[2].output.is_empty());
    assert_eq!(outcomes[2].exit_code, Some(1));
    assert_eq!(
        h.sink.messages("box", Tag::Output),
        ["alice", "/home/alice"]
    );
    assert_eq!(h.sink.messages("box", Tag::Return), ["0", "0", "1", "0"]);
    agent.reset().await;
}

#[tokio::test]
async fn test_buffered_execute_transmits_once() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box")
        .mode(TransmitMode::Buffered)
        .build(&h.wiring)
        .unwrap();
    let reports = agent
        .serialize(
            &[
                Operation::shell("echo once"),
                Operation::Execute,
                Operation::Execute,
            ],
            true,
        )
        .await
        .unwrap();
    assert_eq!(reports[0].outcomes.len(), 1);
    assert_eq!(reports[0].outcomes[0].output, ["once"]);
}

#[tokio::test]
async fn test_serialize_leaves_agent_ready_for_next_batch() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box")
        .mode(TransmitMode::Buffered)
        .build(&h.wiring)
        .unwrap();

    agent
        .serialize(&[Operation::shell("echo one")], true)
        .await
        .unwrap();
    let snapshot = agent.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_commands, 0);
    assert_eq!(snapshot.buffered_output, 0);
    assert!(!snapshot.executed);
    assert!(!snapshot.connected);

    let reports = agent
        .serialize(&[Operation::shell("echo two")], true)
        .await
        .unwrap();
    assert_eq!(reports[0].outcomes.len(), 1);
    assert_eq!(reports[0].outcomes[0].output, ["two"]);
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("box").build(&h.wiring).unwrap();
    agent.connect().await.unwrap();
    let first = agent.flatten().await;
    agent.connect().await.unwrap();
    agent.shell("true", true).await.unwrap();
    assert_eq!(agent.flatten().await, first);
    assert_eq!(h.connector.calls().len(), 1);
    agent.reset().await;
    assert!(agent.flatten().await.is_empty());
}

#[tokio::test]
async fn test_hung_session_is_killed_at_deadline() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("slow")
        .timeout(Some(Duration::from_millis(300)))
        .build(&h.wiring)
        .unwrap();

    let started = Instant::now();
    let err = agent
        .serialize(&[Operation::shell("sleep 30")], true)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Timeout { .. }), "got: {err}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!agent.snapshot().await.unwrap().connected);
}

#[tokio::test]
async fn test_buffered_batch_larger_than_pipe_completes() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("bulk")
        .mode(TransmitMode::Buffered)
        .timeout(Some(Duration::from_secs(30)))
        .build(&h.wiring)
        .unwrap();
    let ops = vec![Operation::shell("seq 1 200"); 500];

    let reports = agent.serialize(&ops, true).await.unwrap();
    let outcomes = &reports[0].outcomes;
    assert_eq!(outcomes.len(), 500);
    assert!(outcomes.iter().all(|o| o.output.len() == 200 && o.exit_code == Some(0)));
    assert_eq!(reports[0].exit_code, Some(0));
}

#[tokio::test]
async fn test_immediate_output_larger_than_pipe_completes() {
    let h = harness(StandIn::shell());
    let agent = Agent::local("bulk")
        .timeout(Some(Duration::from_secs(30)))
        .build(&h.wiring)
        .unwrap();
    let ops = vec![Operation::shell("seq 1 200"); 1000];

    let reports = agent.serialize(&ops, true).await.unwrap();
    assert_eq!(reports[0].stdout.len(), 200_000);
    assert_eq!(reports[0].exit_code, Some(0));
}

#[tokio::test]
async fn test_dry_run_templates_and_logs_without_spawning() {
    let h = harness(StandIn::shell());
    let agent = Agent::remote("db1", "alice", "db1")
        .dry_run(true)
        .build(&h.wiring)
        .unwrap();
    let reports = agent
        .serialize(&[Operation::shell("ping <(host)>")], false)
        .await
        .unwrap();
    assert!(h.connector.calls().is_empty());
    assert_eq!(h.sink.messages("db1", Tag::Input), ["ping db1"]);
    assert_eq!(reports[0].exit_code, None);
}
