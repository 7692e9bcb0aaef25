// Alias-as-host unification
//
// Concept: one star, one host string. When an alias of host H is used as the
// host of other rows, those rows are moved to H and every alias the two sets
// of rows know is shared by all of them, so the resolver sees a single,
// complete alias list for the star.

use crate::audit::{AuditCategory, AuditLog};
use crate::types::Row;
use std::collections::{BTreeMap, BTreeSet};

/// Rewrite hosts that appear as an alias of another host
///
/// Hosts are visited in sorted order; a host that has already been folded
/// into another one is skipped. Returns the number of rewrites.
pub fn unify_alias_hosts(rows: &mut [Row], audit: &mut AuditLog) -> usize {
    let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        index.entry(row.host.clone()).or_default().push(i);
    }

    let hosts: Vec<String> = index.keys().cloned().collect();
    let mut rewrites = 0usize;

    for host in hosts {
        let Some(members) = index.get(&host).cloned() else {
            continue;
        };

        let aliases: BTreeSet<String> = members
            .iter()
            .flat_map(|&i| rows[i].alias.iter().cloned())
            .filter(|a| !a.is_empty() && *a != host)
            .collect();

        let mut total = aliases.clone();
        let mut group = members;

        for alias in &aliases {
            let Some(moved) = index.remove(alias) else {
                continue;
            };
            rewrites += 1;
            audit.record(
                AuditCategory::AliasAsHost,
                host.as_str(),
                format!("alias {} used as host by {} rows", alias, moved.len()),
            );
            for &i in &moved {
                total.extend(rows[i].alias.iter().map(|a| a.trim().to_string()));
                rows[i].host = host.clone();
            }
            group.extend(moved);
        }

        total.remove(&host);
        total.remove("");
        for &i in &group {
            rows[i].alias = total.clone();
        }
        index.insert(host, group);
    }

    tracing::info!(
        "Aliases labeled as hosts in some other entry checked. It happens {} times.",
        rewrites
    );
    rewrites
}
