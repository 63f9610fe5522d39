//! Source resolution - computes the effective list of owner ids to poll

use crate::model::GroupIdentity;
use crate::ports::{WallClient, WallClientError};

/// How the set of polled sources is determined
#[derive(Debug, Clone)]
pub enum SourceSelection {
    /// Configured owner-identifier strings, used verbatim
    Explicit(Vec<String>),
    /// The account's subscription list minus an exclusion set
    FromSubscriptions { exclude: Vec<String> },
}

/// Sources for one cycle, plus the full group list when it was fetched
/// upfront (used as the owner-lookup fallback for pages that omit tables)
#[derive(Debug, Clone)]
pub struct ResolvedSources {
    pub owner_ids: Vec<String>,
    pub fallback_groups: Option<Vec<GroupIdentity>>,
}

/// Resolve the sources to poll this cycle. A subscription-list fetch
/// failure is fatal for the whole cycle.
pub async fn resolve_sources<W>(
    selection: &SourceSelection,
    client: &W,
) -> Result<ResolvedSources, WallClientError>
where
    W: WallClient + ?Sized,
{
    match selection {
        SourceSelection::Explicit(owner_ids) => Ok(ResolvedSources {
            owner_ids: owner_ids.clone(),
            fallback_groups: None,
        }),
        SourceSelection::FromSubscriptions { exclude } => {
            let groups = client.fetch_subscriptions().await?;

            // Subscriptions come back with positive group ids; the wall
            // owner id is the negated form.
            let owner_ids = groups
                .iter()
                .filter(|group| !is_excluded(group, exclude))
                .map(|group| (-group.id).to_string())
                .collect();

            Ok(ResolvedSources {
                owner_ids,
                fallback_groups: Some(groups),
            })
        }
    }
}

/// An exclusion entry matches a subscription by raw id, negated id, or handle
fn is_excluded(group: &GroupIdentity, exclude: &[String]) -> bool {
    exclude.iter().any(|entry| {
        *entry == group.id.to_string()
            || *entry == (-group.id).to_string()
            || group.screen_name.as_deref() == Some(entry.as_str())
    })
}
