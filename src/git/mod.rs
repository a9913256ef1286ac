mod repo;

pub use repo::{git_version, GitRepo, DEFAULT_ARCHIVE_TIMEOUT};
