use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::element::TreeElement;
use super::model::compare_ratio_desc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageSortOrder {
    #[default]
    Location,
    Name,
    Coverage,
}

impl CoverageSortOrder {
    pub fn label(self) -> &'static str {
        match self {
            Self::Location => "Sort by Location",
            Self::Name => "Sort by Name",
            Self::Coverage => "Sort by Coverage",
        }
    }
}

fn kind_rank(element: &TreeElement) -> u8 {
    match element {
        TreeElement::Filter(_) => 0,
        TreeElement::File(_) => 1,
        TreeElement::Declaration(_) => 2,
        TreeElement::Loading(_) => 3,
    }
}

/// Sibling order. The filter pseudo-node always leads, and elements of
/// different kinds never interleave.
pub fn compare_elements(order: CoverageSortOrder, a: &TreeElement, b: &TreeElement) -> Ordering {
    match (a, b) {
        (TreeElement::File(a), TreeElement::File(b)) => match order {
            CoverageSortOrder::Location => a.value.path.cmp(&b.value.path),
            CoverageSortOrder::Name => a.label.cmp(&b.label),
            CoverageSortOrder::Coverage => compare_ratio_desc(a.total_ratio(), b.total_ratio()),
        },
        (TreeElement::Declaration(a), TreeElement::Declaration(b)) => match order {
            CoverageSortOrder::Location => a.data.location.start().cmp(&b.data.location.start()),
            CoverageSortOrder::Name => a.data.name.cmp(&b.data.name),
            CoverageSortOrder::Coverage => {
                // declarations with a ratio lead those without one
                let by_ratio = match (a.attributable_coverage(), b.attributable_coverage()) {
                    (Some(x), Some(y)) => compare_ratio_desc(x.ratio(), y.ratio()),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                by_ratio
                    .then_with(|| b.hits().cmp(&a.hits()))
                    .then_with(|| a.data.name.cmp(&b.data.name))
            }
        },
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/coverage/sort.rs"]
mod tests;
