//! Retention selection: which indices of a prefix are deleted.

/// Split of one prefix's indices into deletions and survivors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Indices to delete, oldest first.
    pub deletions: Vec<String>,
    /// Indices kept, oldest first.
    pub retained: Vec<String>,
}

impl Selection {
    /// Number of indices that matched the prefix.
    pub fn matched(&self) -> usize {
        self.deletions.len() + self.retained.len()
    }
}

/// Select the indices to delete for `prefix`.
///
/// Names are matched with a literal, case-sensitive prefix and sorted
/// ascending byte-wise, which stands in for creation order on date-suffixed
/// index names. The newest `keep + 1` indices are retained and everything
/// older is returned for deletion, oldest first.
pub fn select_victims(names: &[String], prefix: &str, keep: u32) -> Selection {
    let mut victims: Vec<String> = names
        .iter()
        .filter(|name| name.starts_with(prefix))
        .cloned()
        .collect();
    victims.sort_unstable();

    let keep = usize::try_from(keep).unwrap_or(usize::MAX).saturating_add(1);
    let cut = victims.len().saturating_sub(keep);
    let retained = victims.split_off(cut);

    Selection {
        deletions: victims,
        retained,
    }
}
