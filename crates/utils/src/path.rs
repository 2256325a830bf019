use std::path::PathBuf;

/// Expand a leading `~` (and `$VAR` references) in a user supplied path.
///
/// Falls back to the raw string when expansion fails, e.g. for an unset variable.
pub fn expand_tilde(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde("/srv/mirror"), PathBuf::from("/srv/mirror"));
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_tilde("~/mirror");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
