use std::collections::HashSet;

/// First-occurrence-wins dedup state for the cross-cutting entities that turn
/// up embedded in unrelated streams. Keys are lowercased at the boundary, so
/// `Bob` and `bob` collapse to one user. One accumulator lives for exactly
/// one transform run.
#[derive(Debug, Default)]
pub struct EntityAccumulator {
    logins: HashSet<String>,
    repositories: HashSet<String>,
    branches: HashSet<String>,
}

impl EntityAccumulator {
    /// Returns true when this login has not been seen before. The caller
    /// should only keep the fragment on a true return.
    pub fn insert_login(&mut self, login: &str) -> bool {
        self.logins.insert(login.to_lowercase())
    }

    pub fn insert_repository(&mut self, name: &str) -> bool {
        self.repositories.insert(name.to_lowercase())
    }

    pub fn insert_branch(&mut self, repository: &str, branch: &str) -> bool {
        self.branches
            .insert(format!("{}:{}", repository, branch).to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_dedup_is_case_insensitive() {
        let mut acc = EntityAccumulator::default();
        assert!(acc.insert_login("Bob"));
        assert!(!acc.insert_login("bob"));
        assert!(!acc.insert_login("BOB"));
    }

    #[test]
    fn branch_key_includes_repository() {
        let mut acc = EntityAccumulator::default();
        assert!(acc.insert_branch("repo-a", "main"));
        assert!(acc.insert_branch("repo-b", "main"));
        assert!(!acc.insert_branch("Repo-A", "Main"));
    }
}
