use crate::models::{JobApplication, Status};

/// Count of applications per status, in `Status::ALL` order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBreakdown {
    pub total: usize,
    pub counts: [(Status, usize); 3],
}

impl StatusBreakdown {
    pub fn from_records(records: &[JobApplication]) -> Self {
        let mut counts = Status::ALL.map(|s| (s, 0usize));
        for record in records {
            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == record.status) {
                slot.1 += 1;
            }
        }
        Self {
            total: records.len(),
            counts,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }

    /// Share of `status` in percent; 0 when there are no applications.
    pub fn percent(&self, status: Status) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(status) as f64 / self.total as f64 * 100.0
    }
}

/// One point per application, in insertion order, labelled "Job N".
pub fn ctc_series(records: &[JobApplication]) -> Vec<(String, Option<f64>)> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| (format!("Job {}", i + 1), r.ctc))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtcSummary {
    pub reported: usize,
    pub mean: f64,
    pub max: f64,
}

/// Mean and max over applications that have a compensation entered.
pub fn ctc_summary(records: &[JobApplication]) -> Option<CtcSummary> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.ctc).collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    Some(CtcSummary {
        reported: values.len(),
        mean: sum / values.len() as f64,
        max,
    })
}
