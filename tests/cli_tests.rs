//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn wrist_query_bin() -> Command {
    let mut cmd = Command::cargo_bin("wrist-query").expect("binary should be built");
    cmd.env_remove("RUST_LOG").env_remove("WRIST_QUERY_SOCKET");
    cmd
}

#[test]
fn help_output() {
    wrist_query_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("question"))
        .stdout(predicate::str::contains("--ask"))
        .stdout(predicate::str::contains("--socket"))
        .stdout(predicate::str::contains("--timeout"));
}

#[test]
fn version_output() {
    wrist_query_bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wrist-query"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    wrist_query_bin()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrist-query"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_help() {
    wrist_query_bin()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn invalid_timeout_is_a_usage_error() {
    wrist_query_bin()
        .args(["--timeout", "soon", "--ask", "hello"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn empty_question_is_a_usage_error() {
    wrist_query_bin()
        .args(["--ask", "  "])
        .assert()
        .code(2);
}

#[test]
fn interactive_mode_quits_on_q() {
    let dir = tempfile::tempdir().unwrap();

    wrist_query_bin()
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--socket")
        .arg(dir.path().join("missing.sock"))
        .write_stdin("q\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Press SELECT to speak"));
}

#[test]
fn interactive_mode_exits_on_end_of_input() {
    let dir = tempfile::tempdir().unwrap();

    wrist_query_bin()
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--socket")
        .arg(dir.path().join("missing.sock"))
        .write_stdin("")
        .assert()
        .success();
}

#[cfg(unix)]
mod host {
    use super::*;

    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::thread::JoinHandle;

    use wrist_query::domain::frame::{decode, encode, Frame, MessageKey};
    use wrist_query::infrastructure::channel::Packet;

    fn read_packet(stream: &mut impl Read) -> (u8, Vec<u8>) {
        let mut header = [0u8; 3];
        stream.read_exact(&mut header).unwrap();
        let len = u16::from_le_bytes([header[1], header[2]]) as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).unwrap();
        (header[0], payload)
    }

    /// Answer one question with `reply`, returning the question text
    fn fake_host(reply: Frame) -> (tempfile::TempDir, PathBuf, JoinHandle<String>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let (_, payload) = read_packet(&mut stream);
            let question = decode(&payload).unwrap();
            stream.write_all(&Packet::Ack.encode().unwrap()).unwrap();

            let data = Packet::Data(encode(&reply).unwrap()).encode().unwrap();
            stream.write_all(&data).unwrap();
            // The device may exit right after acknowledging
            let mut ack = [0u8; 3];
            let _ = stream.read_exact(&mut ack);

            question
                .get(MessageKey::Question)
                .map(|q| q.to_string())
                .unwrap_or_default()
        });

        (dir, path, handle)
    }

    #[test]
    fn ask_prints_answer() {
        let (dir, path, host) = fake_host(Frame::response("Sunny, 72 degrees"));

        wrist_query_bin()
            .env("XDG_CONFIG_HOME", dir.path())
            .args(["--ask", "what is the weather", "--timeout", "10s"])
            .arg("--socket")
            .arg(&path)
            .assert()
            .success()
            .stdout("Sunny, 72 degrees\n");

        assert_eq!(host.join().unwrap(), "what is the weather");
    }

    #[test]
    fn ask_reports_host_error() {
        let (dir, path, host) = fake_host(Frame::error("Network error"));

        wrist_query_bin()
            .env("XDG_CONFIG_HOME", dir.path())
            .args(["--ask", "hello", "--timeout", "10s"])
            .arg("--socket")
            .arg(&path)
            .assert()
            .code(1)
            .stdout("")
            .stderr(predicate::str::contains("Error: Network error"));

        host.join().unwrap();
    }

    #[test]
    fn socket_from_environment() {
        let (dir, path, host) = fake_host(Frame::response("pong"));

        wrist_query_bin()
            .env("XDG_CONFIG_HOME", dir.path())
            .env("WRIST_QUERY_SOCKET", &path)
            .args(["--ask", "ping", "--timeout", "10s"])
            .assert()
            .success()
            .stdout("pong\n");

        assert_eq!(host.join().unwrap(), "ping");
    }
}
