//! Registry of supervised processes and preset groups, with a uniform
//! validate → act-under-lock → typed-result action surface (§4.C6).
//!
//! The controller never invokes a completion handler itself — callers
//! (the web front-end) submit the whole action as a job on
//! `overseer_scheduler`, so nothing here ever blocks a request-handling
//! thread.

mod bootstrap;
mod controller;
mod results;

pub use bootstrap::{bootstrap, BootstrapError, Bootstrapped, OptionsSection, ProcessDefinition, SchemeDefinition};
pub use controller::Controller;
pub use results::{ControllerInfo, ProcessInfo, ProcessLog, ProcessOption, StopProcessResult};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use overseer_error::{ControllerError, OverseerError, ProcessError};
    use overseer_options::OptionValue;
    use overseer_process::ProcessState;
    use overseer_scheduler::SchedulerHandle;
    use tempfile::tempdir;

    use super::*;

    fn config_with_one_process(root: &std::path::Path) -> overseer_config::OverseerConfig {
        let yaml = format!(
            r#"
serviceconfig:
  controller:
    processes:
      process:
        - name: echo
          executable: /bin/echo
          root: {root}
          data: {root}
          args: []
          options:
            scheme:
              - name: cmdline
                option:
                  - name: arg
                    default: hi
                    required: true
    presets:
      preset:
        - name: loud
          process:
            - name: echo
              scheme:
                - name: cmdline
                  option:
                    - name: arg
                      value: ["bye"]
"#,
            root = root.display()
        );
        overseer_config::OverseerConfig::from_yaml_str(&yaml).unwrap()
    }

    async fn build_controller(root: &std::path::Path) -> Arc<Controller> {
        let config = config_with_one_process(root);
        let scheduler = SchedulerHandle::start(1, 2);
        Controller::from_config(&config, scheduler).unwrap()
    }

    #[tokio::test]
    async fn bootstrapped_process_is_visible_and_described() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        assert_eq!(controller.get_processes().await, vec!["echo".to_string()]);

        let info = controller.get_process_info("echo").await.unwrap();
        assert_eq!(info.name, "echo");
        assert_eq!(info.state, ProcessState::Stopped);
        assert_eq!(info.configs, vec!["cmdline".to_string()]);
    }

    #[tokio::test]
    async fn unknown_process_fails_process_not_found() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        let err = controller.get_process_info("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            OverseerError::Controller(ControllerError::ProcessNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn get_and_set_process_option_round_trip() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        let option = controller
            .get_process_option("echo", "cmdline", "arg")
            .await
            .unwrap();
        assert_eq!(option.value, Some(OptionValue::Single("hi".into())));

        let updated = controller
            .set_process_option(
                "echo",
                "cmdline",
                "arg",
                OptionValue::Single("there".into()),
            )
            .await
            .unwrap();
        assert_eq!(updated.value, Some(OptionValue::Single("there".into())));
    }

    #[tokio::test]
    async fn start_stop_transitions_process_state() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        controller.start_process("echo").await.unwrap();
        assert_eq!(
            controller.get_process_info("echo").await.unwrap().state,
            ProcessState::Running
        );

        controller.stop_process("echo").await.unwrap();
        for _ in 0..50 {
            if controller.get_process_info("echo").await.unwrap().state == ProcessState::Stopped {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(
            controller.get_process_info("echo").await.unwrap().state,
            ProcessState::Stopped
        );
    }

    #[tokio::test]
    async fn stopping_a_stopped_process_fails_process_not_running() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        let err = controller.stop_process("echo").await.unwrap_err();
        assert!(matches!(
            err,
            OverseerError::Process(ProcessError::ProcessNotRunning { .. })
        ));
    }

    #[tokio::test]
    async fn apply_preset_group_merges_without_touching_other_options() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        assert_eq!(controller.get_preset_groups().await, vec!["loud".to_string()]);

        controller.apply_preset_group("loud").await.unwrap();

        let option = controller
            .get_process_option("echo", "cmdline", "arg")
            .await
            .unwrap();
        assert_eq!(option.value, Some(OptionValue::Single("bye".into())));
    }

    #[tokio::test]
    async fn apply_preset_group_refuses_when_process_is_running() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        controller.start_process("echo").await.unwrap();
        let err = controller.apply_preset_group("loud").await.unwrap_err();
        assert!(matches!(
            err,
            OverseerError::Controller(ControllerError::ProcessIsRunning { .. })
        ));
        controller.stop_process("echo").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_preset_group_fails_presets_not_found() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;

        let err = controller.apply_preset_group("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            OverseerError::Controller(ControllerError::PresetsNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn controller_info_reports_own_pid() {
        let dir = tempdir().unwrap();
        let controller = build_controller(dir.path()).await;
        assert_eq!(controller.get_controller_info().pid, std::process::id());
    }

    #[tokio::test]
    async fn apply_preset_group_with_bare_entry_clears_the_default() {
        let dir = tempdir().unwrap();
        let yaml = format!(
            r#"
serviceconfig:
  controller:
    processes:
      process:
        - name: echo
          executable: /bin/echo
          root: {root}
          data: {root}
          args: []
          options:
            scheme:
              - name: cmdline
                option:
                  - name: arg
                    default: hi
                    required: false
    presets:
      preset:
        - name: quiet
          process:
            - name: echo
              scheme:
                - name: cmdline
                  option:
                    - name: arg
"#,
            root = dir.path().display()
        );
        let config = overseer_config::OverseerConfig::from_yaml_str(&yaml).unwrap();
        let scheduler = SchedulerHandle::start(1, 2);
        let controller = Controller::from_config(&config, scheduler).unwrap();

        let before = controller
            .get_process_option("echo", "cmdline", "arg")
            .await
            .unwrap();
        assert_eq!(before.value, Some(OptionValue::Single("hi".into())));

        controller.apply_preset_group("quiet").await.unwrap();

        let after = controller
            .get_process_option("echo", "cmdline", "arg")
            .await
            .unwrap();
        assert_eq!(after.value, None);
    }
}
