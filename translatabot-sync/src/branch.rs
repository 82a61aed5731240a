//! Collision-safe branch naming.
//!
//! Names are deterministic: `<app>/<scope>/<ref>` where scope is the
//! lowercased language for full translations or `partial` for delta runs,
//! and ref is `#<source pr>` when known, otherwise the short revision. A
//! taken name gets a `-yyyyMMddHHmm` suffix. The check is best-effort; a
//! suffixed name that is also taken is a [`SyncError::PublicationConflict`].

use chrono::{DateTime, Utc};

use translatabot_core::{LanguageName, RevisionId};

use crate::error::SyncError;
use crate::host::BranchNamespace;

/// Which publication a branch carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
    Language(LanguageName),
    Partial,
}

/// Branch used by the starter configuration pull request.
pub fn config_branch(app_name: &str) -> String {
    format!("{app_name}/config")
}

/// Deterministic first choice for a branch name.
pub fn proposed_name(
    app_name: &str,
    scope: &BranchScope,
    source_pr: Option<u64>,
    revision: &RevisionId,
) -> String {
    let scope = match scope {
        BranchScope::Language(language) => language.as_str().to_lowercase().replace(' ', "-"),
        BranchScope::Partial => "partial".to_string(),
    };
    let reference = match source_pr {
        Some(number) => format!("#{number}"),
        None => revision.short().to_string(),
    };
    format!("{app_name}/{scope}/{reference}")
}

/// `name` with a minute-resolution UTC timestamp appended.
pub fn suffixed_name(name: &str, now: DateTime<Utc>) -> String {
    format!("{name}-{}", now.format("%Y%m%d%H%M"))
}

/// A proposed branch name together with the existence check that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHandle {
    pub name: String,
    /// Whether the deterministic name was taken and a suffix was applied.
    pub renamed: bool,
}

/// Pick a free branch name, renaming once on collision.
pub async fn choose_branch<N: BranchNamespace + ?Sized>(
    namespace: &N,
    proposed: String,
    now: DateTime<Utc>,
) -> Result<BranchHandle, SyncError> {
    if !namespace.branch_exists(&proposed).await? {
        return Ok(BranchHandle {
            name: proposed,
            renamed: false,
        });
    }

    let renamed = suffixed_name(&proposed, now);
    tracing::info!(branch = %proposed, renamed = %renamed, "branch name taken");
    if namespace.branch_exists(&renamed).await? {
        return Err(SyncError::PublicationConflict {
            branch: renamed,
            message: "branch name taken even after timestamp suffix".to_string(),
        });
    }
    Ok(BranchHandle {
        name: renamed,
        renamed: true,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::memory::MemoryHost;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn proposed_names() {
        let rev = RevisionId::from("0123456789abcdef");
        let de = BranchScope::Language(LanguageName::from("German"));
        assert_eq!(
            proposed_name("translatabot", &de, None, &rev),
            "translatabot/german/0123456"
        );
        assert_eq!(
            proposed_name("translatabot", &BranchScope::Partial, Some(42), &rev),
            "translatabot/partial/#42"
        );
        let pt = BranchScope::Language(LanguageName::from("Brazilian Portuguese"));
        assert_eq!(
            proposed_name("translatabot", &pt, Some(7), &rev),
            "translatabot/brazilian-portuguese/#7"
        );
    }

    #[test]
    fn suffix_is_minute_timestamp() {
        assert_eq!(suffixed_name("a/b", at()), "a/b-202403091405");
    }

    #[tokio::test]
    async fn free_name_is_kept() {
        let host = MemoryHost::new("main", [("en.json", "{}")]);
        let handle = choose_branch(&host, "translatabot/partial/abc".to_string(), at())
            .await
            .unwrap();
        assert_eq!(handle.name, "translatabot/partial/abc");
        assert!(!handle.renamed);
    }

    #[tokio::test]
    async fn taken_name_gets_suffix() {
        let host = MemoryHost::new("main", [("en.json", "{}")]);
        host.create_branch("translatabot/partial/abc", "main").unwrap();
        let handle = choose_branch(&host, "translatabot/partial/abc".to_string(), at())
            .await
            .unwrap();
        assert_eq!(handle.name, "translatabot/partial/abc-202403091405");
        assert!(handle.renamed);
    }

    #[tokio::test]
    async fn second_collision_is_conflict() {
        let host = MemoryHost::new("main", [("en.json", "{}")]);
        host.create_branch("x", "main").unwrap();
        host.create_branch("x-202403091405", "main").unwrap();
        let err = choose_branch(&host, "x".to_string(), at()).await.unwrap_err();
        assert!(matches!(err, SyncError::PublicationConflict { .. }));
    }
}
