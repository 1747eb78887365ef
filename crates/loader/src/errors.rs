/// Row-level load failures. Any of these aborts the remaining rows of the
/// collection being loaded; earlier collections stand.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Db(#[from] db::DbError),
    /// A referential gap: the row names a repository that never made it into
    /// the store.
    #[error("repository '{0}' is not loaded")]
    MissingRepository(String),
    #[error("branch '{branch}' of repository '{repository}' is not loaded")]
    MissingBranch { repository: String, branch: String },
}
