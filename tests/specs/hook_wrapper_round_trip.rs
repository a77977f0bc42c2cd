// SPDX-License-Identifier: MIT

//! Scenario 5: a real POSIX hook, run through the actual wrapper script
//! (not just by poking before/after env dumps), to exercise the whole
//! capture-and-diff round trip end to end.
//!
//! The wrapper shells out to `<agent-binary> env dump` before and after
//! the hook; a full agent binary is out of scope here, so this stands in
//! a tiny script implementing just that one subcommand.

use ja_hooks::{HookWrapper, TargetOs};
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;

fn fake_agent_binary(tmp: &tempfile::TempDir) -> std::path::PathBuf {
    let path = tmp.path().join("fake-agent");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "#!/bin/sh\n\
         if [ \"$1\" = env ] && [ \"$2\" = dump ]; then\n\
         python3 -c 'import os, json, sys; json.dump(dict(os.environ), sys.stdout)'\n\
         fi\n"
    )
    .unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700)).unwrap();
    path
}

#[test]
fn a_real_hook_run_through_the_wrapper_reports_its_env_and_cwd_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let subdir = tmp.path().join("subdir");
    std::fs::create_dir(&subdir).unwrap();
    let agent_binary = fake_agent_binary(&tmp);

    let hook_path = tmp.path().join("environment");
    std::fs::write(
        &hook_path,
        format!("#!/bin/sh\necho hello\nexport LLAMAS=rock\ncd \"{}\"\n", subdir.display()),
    )
    .unwrap();
    std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o700)).unwrap();

    let wrapper = HookWrapper::new(&hook_path, TargetOs::Unix, &agent_binary).unwrap();

    let output = std::process::Command::new(wrapper.wrapper_script())
        .output()
        .expect("the wrapper script should run as a normal POSIX shell script");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");

    let diff = wrapper.changes().unwrap();
    assert_eq!(diff.added.get("LLAMAS"), Some(&"rock".to_string()));
    assert_eq!(diff.after_working_dir, subdir.canonicalize().unwrap());

    for key in ["BUILDKITE_HOOK_EXIT_STATUS", "BUILDKITE_HOOK_WORKING_DIR", "_"] {
        assert!(!diff.added.contains_key(key));
        assert!(!diff.changed.contains_key(key));
        assert!(!diff.removed.contains(key));
    }

    wrapper.close().unwrap();
}
