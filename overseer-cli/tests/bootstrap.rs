//! Exercises the same load-config → build-controller path `overseerd`'s
//! `main` takes, without going through the process boundary.

use std::io::Write;

use overseer_config::OverseerConfig;
use overseer_controller::Controller;
use overseer_scheduler::SchedulerHandle;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn loads_config_and_bootstraps_controller() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        r#"
run:
  logger: "info"
  httpserver:
    host: "127.0.0.1"
    port: 0
serviceconfig:
  controller:
    processes:
      process:
        - name: echo
          executable: /bin/echo
          root: {root}
          data: {root}
          args: []
"#,
        root = dir.path().display()
    );
    let file = write_config(&yaml);

    let config = OverseerConfig::load(file.path()).unwrap();
    let host: String = config.get_or("run.httpserver.host", "0.0.0.0".to_string());
    assert_eq!(host, "127.0.0.1");

    let scheduler = SchedulerHandle::start(1, 2);
    let controller = Controller::from_config(&config, scheduler).unwrap();
    assert_eq!(controller.get_processes().await, vec!["echo".to_string()]);
}

#[test]
fn missing_config_path_is_a_load_error() {
    let result = OverseerConfig::load(std::path::Path::new("/nonexistent/overseerd.yaml"));
    assert!(result.is_err());
}
