//! Host platform queries.

/// Returns true when the process runs with an effective uid of 0.
#[cfg(unix)]
pub fn is_elevated() -> bool {
  rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
  false
}

/// Returns the account name of the invoking operator, if known.
///
/// Reads `USER`; an unset or empty value yields `None`.
pub fn operator_name() -> Option<String> {
  std::env::var("USER").ok().filter(|user| !user.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn operator_name_reads_user() {
    temp_env::with_var("USER", Some("alice"), || {
      assert_eq!(operator_name().as_deref(), Some("alice"));
    });
  }

  #[test]
  #[serial]
  fn operator_name_ignores_blank_user() {
    temp_env::with_var("USER", Some("  "), || {
      assert_eq!(operator_name(), None);
    });
    temp_env::with_var("USER", None::<&str>, || {
      assert_eq!(operator_name(), None);
    });
  }
}
