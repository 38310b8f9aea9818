//! Intersects the three inverted maps to produce a deterministic,
//! offset-ordered slice plan over a catalog's blob file.

use std::collections::BTreeSet;

use crate::model::{Index, Section};

/// Produces the ordered list of sections matching `schema`/`package`/`name`,
/// each of which may be empty to mean "any".
///
/// `Section` orders by `(offset, length)` and offsets are unique by
/// construction, so collecting through a `BTreeSet` yields the plan already
/// sorted ascending by offset — no separate sort step is needed.
pub fn plan(index: &Index, schema: &str, package: &str, name: &str) -> Vec<Section> {
    let mut candidates: BTreeSet<Section> = if schema.is_empty() {
        index.by_schema.values().flatten().copied().collect()
    } else {
        index
            .by_schema
            .get(schema)
            .into_iter()
            .flatten()
            .copied()
            .collect()
    };

    if !package.is_empty() {
        let matches: BTreeSet<Section> = index
            .by_package
            .get(package)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        candidates = candidates.intersection(&matches).copied().collect();
    }

    if !name.is_empty() {
        let matches: BTreeSet<Section> = index
            .by_name
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        candidates = candidates.intersection(&matches).copied().collect();
    }

    candidates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index_all;
    use crate::model::Meta;

    fn sample() -> Index {
        index_all(vec![
            Meta::new("olm.package", "", "webhook_operator_test", b"aaaa\n".to_vec()),
            Meta::new(
                "olm.channel",
                "webhook_operator_test",
                "preview_test",
                b"bbb\n".to_vec(),
            ),
            Meta::new(
                "olm.bundle",
                "webhook_operator_test",
                "bundle.v0.0.1",
                b"cc\n".to_vec(),
            ),
        ])
    }

    #[test]
    fn empty_params_cover_everything_in_file_order() {
        let index = sample();
        let all = plan(&index, "", "", "");
        assert_eq!(
            all,
            vec![Section::new(0, 5), Section::new(5, 4), Section::new(9, 3)]
        );
    }

    #[test]
    fn schema_narrows_to_matching_sections() {
        let index = sample();
        assert_eq!(plan(&index, "olm.bundle", "", ""), vec![Section::new(9, 3)]);
    }

    #[test]
    fn combined_predicates_intersect() {
        let index = sample();
        let got = plan(&index, "olm.bundle", "webhook_operator_test", "bundle.v0.0.1");
        assert_eq!(got, vec![Section::new(9, 3)]);

        let got = plan(&index, "", "webhook_operator_test", "bundle.v0.0.1");
        assert_eq!(got, vec![Section::new(9, 3)]);
    }

    #[test]
    fn no_match_yields_empty_plan() {
        let index = sample();
        assert!(plan(&index, "does.not.exist", "", "").is_empty());
        assert!(plan(&index, "olm.bundle", "other-package", "").is_empty());
    }
}
