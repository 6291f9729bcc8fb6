// src/report.rs

//! Per-item statuses and the end-of-run summary.
//!
//! The report is purely derived state, built and returned by the apply and
//! revert engines for the current run only. It holds no authority and no
//! process-wide lifecycle.

use strum::Display;

/// Final status of one (target, item) pair. Produced once, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ItemStatus {
    /// Whole-file copy or patch application succeeded.
    Applied,
    /// Gated out (binary, conflict declined, critical declined).
    Skipped,
    /// The step itself failed; the run continues.
    Failed,
    /// Whole-file backup copied back over the live path.
    Restored,
    /// Repository patch reverse-applied.
    Reverted,
}

#[derive(Debug, Clone)]
pub struct ItemResult {
    pub repo: String,
    pub item: String,
    pub status: ItemStatus,
    pub detail: String,
}

impl ItemResult {
    pub fn new(repo: &str, item: &str, status: ItemStatus, detail: impl Into<String>) -> Self {
        Self {
            repo: repo.to_string(),
            item: item.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// Collected results for one run.
#[derive(Debug, Default)]
pub struct RunReport {
    results: Vec<ItemResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ItemResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Render the final aggregated table.
    pub fn render(&self) -> String {
        if self.results.is_empty() {
            return "nothing to report".to_string();
        }

        let repo_width = self
            .results
            .iter()
            .map(|r| r.repo.len())
            .chain(std::iter::once("TARGET".len()))
            .max()
            .unwrap_or(0);
        let item_width = self
            .results
            .iter()
            .map(|r| r.item.len())
            .chain(std::iter::once("ITEM".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(&format!(
            "{:<repo_width$}  {:<item_width$}  {:<8}  DETAIL\n",
            "TARGET", "ITEM", "STATUS"
        ));
        for r in &self.results {
            out.push_str(&format!(
                "{:<repo_width$}  {:<item_width$}  {:<8}  {}\n",
                r.repo,
                r.item,
                r.status.to_string(),
                r.detail
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_render_uppercase() {
        assert_eq!(ItemStatus::Applied.to_string(), "APPLIED");
        assert_eq!(ItemStatus::Skipped.to_string(), "SKIPPED");
        assert_eq!(ItemStatus::Reverted.to_string(), "REVERTED");
    }

    #[test]
    fn counts_by_status() {
        let mut report = RunReport::new();
        report.push(ItemResult::new("api", "a.txt", ItemStatus::Applied, ""));
        report.push(ItemResult::new("api", "b.txt", ItemStatus::Skipped, "binary"));
        report.push(ItemResult::new("web", "a.txt", ItemStatus::Applied, ""));
        assert_eq!(report.count(ItemStatus::Applied), 2);
        assert_eq!(report.count(ItemStatus::Skipped), 1);
        assert_eq!(report.count(ItemStatus::Failed), 0);
    }

    #[test]
    fn render_includes_every_row() {
        let mut report = RunReport::new();
        report.push(ItemResult::new("api", "routes/web.php", ItemStatus::Failed, "copy failed"));
        let table = report.render();
        assert!(table.contains("routes/web.php"));
        assert!(table.contains("FAILED"));
        assert!(table.contains("copy failed"));
    }
}
