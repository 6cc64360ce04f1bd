//! Configuration read from environment variables.

use tracing::warn;

/// Interpret a string value such as "1" or "no" as a boolean.
pub fn str_as_bool(s: &str) -> bool {
    match s {
        "1" | "true" | "t" | "yes" | "y" => true,
        "0" | "false" | "f" | "no" | "n" => false,
        _ => {
            warn!(value = s, "unrecognized boolean value");
            false
        }
    }
}

/// Return whether a feature flag controlled by an environment variable is
/// enabled.
pub fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .as_ref()
        .map(|s| str_as_bool(s))
        .unwrap_or(default)
}

/// Read a positive integer from an environment variable.
///
/// Returns `None` if the variable is unset, and logs a warning and returns
/// `None` if it is not a positive integer.
pub fn env_usize(name: &str) -> Option<usize> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(var = name, value = value.as_str(), "ignoring invalid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use smet_testing::TestCases;

    use super::{env_flag, env_usize, str_as_bool};

    #[test]
    fn test_str_as_bool() {
        #[derive(Debug)]
        struct Case {
            value: &'static str,
            expected: bool,
        }

        let cases = [
            Case {
                value: "1",
                expected: true,
            },
            Case {
                value: "yes",
                expected: true,
            },
            Case {
                value: "n",
                expected: false,
            },
            Case {
                value: "maybe",
                expected: false,
            },
        ];

        cases.test_each(|case| assert_eq!(str_as_bool(case.value), case.expected))
    }

    #[test]
    fn test_unset_vars_use_default() {
        assert!(env_flag("SMET_TEST_UNSET_FLAG", true));
        assert!(!env_flag("SMET_TEST_UNSET_FLAG", false));
        assert_eq!(env_usize("SMET_TEST_UNSET_NUMBER"), None);
    }
}
