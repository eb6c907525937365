use assert_cmd::Command;
use predicates::prelude::*;

fn tubescribe() -> Command {
    Command::cargo_bin("tubescribe").unwrap()
}

#[test]
fn help_lists_subcommands() {
    tubescribe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("channel"))
        .stdout(predicate::str::contains("video"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn channel_help_mentions_api_key_env() {
    tubescribe()
        .args(["channel", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("YOUTUBE_API_KEY"))
        .stdout(predicate::str::contains("--limit"));
}

#[test]
fn rejects_unknown_format() {
    tubescribe()
        .args(["channel", "Kurzgesagt", "--format", "srt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn channel_requires_a_name() {
    tubescribe()
        .arg("channel")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME_OR_ID"));
}
