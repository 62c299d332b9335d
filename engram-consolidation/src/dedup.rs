//! Transitive duplicate grouping over similarity pairs.

use engram_core::models::DuplicateGroup;

/// Group claims whose pairwise similarity reached the threshold,
/// transitively: if a~b and b~c, all three share a group. The canonical
/// member is the earliest by transcript order.
pub fn group_duplicates(pairs: &[(usize, usize, f64)], claim_count: usize) -> Vec<DuplicateGroup> {
    let mut parent: Vec<usize> = (0..claim_count).collect();

    fn find(parent: &mut Vec<usize>, mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    let mut best_similarity = vec![0.0f64; claim_count];
    for &(a, b, similarity) in pairs {
        if a >= claim_count || b >= claim_count {
            continue;
        }
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            // The smaller root stays canonical.
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            parent[merge] = keep;
            best_similarity[keep] = best_similarity[keep].max(similarity);
        } else {
            best_similarity[ra] = best_similarity[ra].max(similarity);
        }
    }

    let mut members_by_root: Vec<Vec<usize>> = vec![Vec::new(); claim_count];
    for index in 0..claim_count {
        let root = find(&mut parent, index);
        members_by_root[root].push(index);
    }

    members_by_root
        .into_iter()
        .enumerate()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(root, mut members)| {
            members.sort_unstable();
            DuplicateGroup {
                members,
                similarity: best_similarity[root],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_chain_transitively() {
        // 0~1 and 1~2 puts all three in one group with 0 canonical.
        let groups = group_duplicates(&[(0, 1, 0.9), (1, 2, 0.88)], 4);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec![0, 1, 2]);
        assert_eq!(groups[0].canonical(), 0);
        assert_eq!(groups[0].merged_count(), 2);
    }

    #[test]
    fn disjoint_pairs_stay_separate() {
        let groups = group_duplicates(&[(0, 1, 0.9), (2, 3, 0.86)], 4);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec![0, 1]);
        assert_eq!(groups[1].members, vec![2, 3]);
    }

    #[test]
    fn no_pairs_no_groups() {
        assert!(group_duplicates(&[], 5).is_empty());
    }
}
