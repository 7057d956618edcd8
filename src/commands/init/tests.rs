//! Tests for the init command.

use super::*;
use crate::exit_codes;
use std::path::PathBuf;

#[test]
fn test_every_supported_shell_has_a_script() {
    for shell in SUPPORTED_SHELLS {
        let script = init_script(shell, "/usr/bin/kitsch", None).unwrap();
        assert!(!script.contains(COMMAND_PLACEHOLDER), "{}", shell);
        assert!(
            script.contains(&format!("/usr/bin/kitsch prompt --shell {}", shell)),
            "{}",
            shell
        );
    }
}

#[test]
fn test_unknown_shell() {
    let err = init_script("tcsh", "kitsch", None).unwrap_err();
    assert!(matches!(err, KitschError::UnknownShell(ref s) if s == "tcsh"));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

    let err = cmd_init("tcsh", None).unwrap_err();
    assert!(err.to_string().contains("use one of: bash, zsh, fish"));
}

#[test]
fn test_paths_are_quoted() {
    let config = PathBuf::from("/home/me/my config.yaml");
    let script = init_script("bash", "/opt/my apps/kitsch", Some(&config)).unwrap();
    assert!(script.contains("'/opt/my apps/kitsch' --config '/home/me/my config.yaml' prompt"));
}

#[test]
fn test_scripts_pass_prompt_flags() {
    for shell in SUPPORTED_SHELLS {
        let script = init_script(shell, "kitsch", None).unwrap();
        for flag in ["--status", "--cmd-duration", "--jobs", "--terminal-width", "--logical-path"] {
            assert!(script.contains(flag), "{} script is missing {}", shell, flag);
        }
    }
}
