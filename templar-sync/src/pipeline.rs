//! Shared action entrypoint used by the CLI.

use templar_core::{RecordStore, TemplateIdentity, TemplateName};

use crate::reconciler::Reconciler;
use crate::report::{Action, BatchReport};
use crate::SyncError;

/// Which templates an action operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every template in the record store.
    All,
    /// The named templates, in the given order.
    Named(Vec<TemplateName>),
}

impl Selection {
    /// An empty name list selects every template.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<TemplateName> = names.into_iter().map(|n| TemplateName(n.into())).collect();
        if names.is_empty() {
            Selection::All
        } else {
            Selection::Named(names)
        }
    }
}

/// Resolve bare names to identities through the record store.
///
/// Duplicate names are dropped, keeping the first occurrence.
pub fn resolve_identities(
    store: &dyn RecordStore,
    selection: &Selection,
) -> Result<Vec<TemplateIdentity>, SyncError> {
    match selection {
        Selection::All => Ok(store.list_all()?.iter().map(|r| r.identity()).collect()),
        Selection::Named(names) => {
            let mut identities: Vec<TemplateIdentity> = Vec::with_capacity(names.len());
            for name in names {
                if identities.iter().any(|i| &i.name == name) {
                    continue;
                }
                let record = store
                    .find_by_name(name)?
                    .ok_or_else(|| SyncError::UnknownTemplate {
                        name: name.0.clone(),
                    })?;
                identities.push(record.identity());
            }
            Ok(identities)
        }
    }
}

/// Run one action for a selection.
///
/// `inventory` ignores the selection; it always walks the full Lab listing.
pub fn run(
    reconciler: &mut Reconciler<'_>,
    action: Action,
    selection: &Selection,
) -> Result<BatchReport, SyncError> {
    let resolve = |r: &Reconciler<'_>| resolve_identities(r.records(), selection);
    match action {
        Action::Inventory => reconciler.rebuild_inventory(),
        Action::Status => {
            let identities = resolve(&*reconciler)?;
            Ok(reconciler.sync_status(&identities))
        }
        Action::Publish => {
            let identities = resolve(&*reconciler)?;
            Ok(reconciler.publish_branch(&identities))
        }
        Action::Push(env) => {
            let identities = resolve(&*reconciler)?;
            Ok(reconciler.push_to_controller(env, &identities))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use templar_core::{MemoryRecordStore, ProjectName, TemplateDetail};

    use super::*;

    fn store() -> MemoryRecordStore {
        let detail = |name: &str, project: &str| TemplateDetail {
            id: format!("id-{name}"),
            name: TemplateName::from(name),
            project: ProjectName::from(project),
            device_types: Vec::new(),
            software_type: "IOS-XE".to_string(),
            content: String::new(),
        };
        MemoryRecordStore::with_records([
            templar_core::TemplateRecord::discovered(&detail("acl-basic", "campus"), Utc::now()),
            templar_core::TemplateRecord::discovered(&detail("new-qos", "wan"), Utc::now()),
        ])
    }

    #[test]
    fn empty_name_list_selects_all() {
        assert_eq!(Selection::from_names(Vec::<String>::new()), Selection::All);
        let ids = resolve_identities(&store(), &Selection::All).expect("resolve");
        let names: Vec<String> = ids.iter().map(|i| i.name.0.clone()).collect();
        assert_eq!(names, vec!["acl-basic", "new-qos"]);
    }

    #[test]
    fn named_selection_recovers_project_and_dedupes() {
        let selection = Selection::from_names(["new-qos", "new-qos"]);
        let ids = resolve_identities(&store(), &selection).expect("resolve");
        assert_eq!(ids, vec![TemplateIdentity::new("wan", "new-qos")]);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = resolve_identities(&store(), &Selection::from_names(["ghost"])).unwrap_err();
        assert!(matches!(err, SyncError::UnknownTemplate { ref name } if name == "ghost"));
    }
}
