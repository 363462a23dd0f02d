use serde::Serialize;

/// Build metadata reported by the `/version` endpoints and `--version`.
///
/// `NOMIOS_GIT_COMMIT` and `NOMIOS_BUILD_TIME` are read at compile time when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub semver: &'static str,
    pub git_commit: &'static str,
    pub build_time: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            semver: env!("CARGO_PKG_VERSION"),
            git_commit: option_env!("NOMIOS_GIT_COMMIT").unwrap_or("unknown"),
            build_time: option_env!("NOMIOS_BUILD_TIME").unwrap_or("unknown"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    pub fn human(&self) -> String {
        format!(
            "{}\n\tgit-commit: {}\n\tbuild-date: {}\n\tplatform: {} {}",
            self.semver, self.git_commit, self.build_time, self.os, self.arch
        )
    }
}
