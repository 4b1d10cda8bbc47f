//! Tracking issue templates.

use chrono::{DateTime, Utc};

use crate::types::WorkflowRef;
use crate::webhooks::{EventKind, WorkflowEvent};

/// Label added to every tracking issue.
pub const NOT_VALID_LABEL: &str = "not-valid";

/// A tracking issue, ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueContent {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Renders the tracking issue for a workflow that failed validation.
///
/// `workflow` is the resolved reference that was disabled; for job events
/// it differs from the one in the event.
pub fn render_issue(
    kind: EventKind,
    event: &WorkflowEvent,
    workflow: &WorkflowRef,
    reason: &str,
    at: DateTime<Utc>,
) -> IssueContent {
    let repo = &event.repo;
    let body = format!(
        "## {heading}\n\
         \n\
         | Sender | Organization | Repository | Workflow Name | Workflow ID |\n\
         | --- | --- | --- | --- | --- |\n\
         | {sender} | {org} | {repo_name} | {name} | {workflow} |\n\
         \n\
         The workflow was disabled because the repository does not carry a valid policy file:\n\
         \n\
         > {reason}\n\
         \n\
         _Detected at {at}._\n",
        heading = heading(kind),
        sender = event.sender,
        org = repo.owner,
        repo_name = repo.repo,
        name = event.workflow_name,
        at = at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    IssueContent {
        title: format!("{repo} - {} ({workflow})", event.workflow_name),
        body,
        labels: vec![repo.full_name(), NOT_VALID_LABEL.to_string()],
    }
}

fn heading(kind: EventKind) -> &'static str {
    match kind {
        EventKind::WorkflowRun => "Workflow Run Event",
        EventKind::WorkflowDispatch => "Workflow Dispatch Event",
        EventKind::WorkflowJob => "Workflow Job Event",
        EventKind::IssueComment => "Issue Comment Event",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepoId;
    use chrono::TimeZone;

    fn event() -> WorkflowEvent {
        WorkflowEvent {
            repo: RepoId::new("acme", "svc"),
            sender: "octocat".to_string(),
            workflow: WorkflowRef::Id(7),
            workflow_name: "build".to_string(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn title_and_labels_name_the_repository() {
        let issue = render_issue(
            EventKind::WorkflowRun,
            &event(),
            &WorkflowRef::Id(7),
            "no valid policy file found",
            at(),
        );

        assert_eq!(issue.title, "acme/svc - build (7)");
        assert_eq!(issue.labels, vec!["acme/svc", "not-valid"]);
    }

    #[test]
    fn job_title_carries_the_resolved_workflow_id() {
        let job = WorkflowEvent {
            workflow: WorkflowRef::Run(4242),
            ..event()
        };
        let issue = render_issue(
            EventKind::WorkflowJob,
            &job,
            &WorkflowRef::Id(99),
            "no valid policy file found",
            at(),
        );

        assert_eq!(issue.title, "acme/svc - build (99)");
    }

    #[test]
    fn body_has_details_reason_and_time() {
        let issue = render_issue(
            EventKind::WorkflowJob,
            &event(),
            &WorkflowRef::Id(99),
            "policy validation timed out after 60s",
            at(),
        );

        assert!(issue.body.starts_with("## Workflow Job Event\n"), "{}", issue.body);
        assert!(issue.body.contains("| octocat | acme | svc | build | 99 |"));
        assert!(issue.body.contains("> policy validation timed out after 60s"));
        assert!(issue.body.contains("2024-05-01 12:30:00 UTC"));
    }

    #[test]
    fn heading_follows_event_kind() {
        for (kind, expected) in [
            (EventKind::WorkflowRun, "## Workflow Run Event"),
            (EventKind::WorkflowDispatch, "## Workflow Dispatch Event"),
        ] {
            let issue = render_issue(kind, &event(), &WorkflowRef::Id(7), "x", at());
            assert!(issue.body.starts_with(expected), "{kind}");
        }
    }
}
