//! Domain tests for workspace names, statuses and archiving.

use crate::isolation::DataIsolation;
use crate::workspace::domain::{
    ArchiveStatus, Workspace, WorkspaceDomainError, WorkspaceName, WorkspaceStatus,
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[case("")]
#[case("   ")]
fn blank_names_are_rejected(#[case] raw: &str) {
    assert_eq!(WorkspaceName::new(raw), Err(WorkspaceDomainError::EmptyName));
}

#[rstest]
fn archived_workspace_refuses_new_work() {
    let isolation = DataIsolation::from_parts("usi_1", "DT001").expect("valid isolation");
    let mut workspace = Workspace::new(
        &isolation,
        WorkspaceName::new("Research").expect("valid name"),
        &DefaultClock,
    );
    assert!(workspace.ensure_accepts_new_work().is_ok());

    workspace.set_archive_status(ArchiveStatus::Archived, &DefaultClock);

    assert_eq!(
        workspace.ensure_accepts_new_work(),
        Err(WorkspaceDomainError::Archived(workspace.id()))
    );
    assert_eq!(workspace.status(), WorkspaceStatus::Active);
}

#[rstest]
#[case("not_archived", ArchiveStatus::NotArchived)]
#[case("archived", ArchiveStatus::Archived)]
fn archive_status_parses_storage_values(#[case] raw: &str, #[case] expected: ArchiveStatus) {
    assert_eq!(ArchiveStatus::try_from(raw), Ok(expected));
    assert_eq!(expected.as_str(), raw);
}

#[rstest]
fn unknown_workspace_status_is_rejected() {
    assert!(WorkspaceStatus::try_from("frozen").is_err());
}
