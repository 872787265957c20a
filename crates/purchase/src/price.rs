//! The fixed point-package price list.

use std::collections::HashMap;

use pulse_primitives::Points;

/// Known point packages: store package name to point count.
///
/// Fixed at construction; the payment collaborator's package names must
/// match exactly or the purchase fails closed.
#[derive(Debug, Clone)]
pub struct PriceList {
    packages: HashMap<String, Points>,
}

impl PriceList {
    /// Build a price list from (package name, point count) pairs.
    pub fn new(packages: impl IntoIterator<Item = (String, Points)>) -> Self {
        Self { packages: packages.into_iter().collect() }
    }

    /// Point count for a package, `None` if unknown.
    pub fn points_for(&self, package: &str) -> Option<Points> {
        self.packages.get(package).copied()
    }

    /// Known package names.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

impl Default for PriceList {
    /// The store's standard packages.
    fn default() -> Self {
        Self::new([
            ("500_points".to_string(), Points(500)),
            ("1200_points".to_string(), Points(1_200)),
            ("3000_points".to_string(), Points(3_000)),
        ])
    }
}
