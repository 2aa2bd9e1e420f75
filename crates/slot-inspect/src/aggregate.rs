use serde::{Deserialize, Serialize};
use slot_inspect_eval::InspectionResult;
use std::fmt;

/// Overall verdict over all slot results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Every slot passed. Vacuously true with no slots.
    pub passed: bool,
    pub passed_count: usize,
    pub total: usize,
    /// `[slot <id>] <message>` lines, in slot order.
    pub log: Vec<String>,
}

pub fn aggregate(results: &[InspectionResult]) -> Summary {
    let passed_count = results.iter().filter(|r| r.passed).count();
    let log = results
        .iter()
        .flat_map(|r| {
            let verdict = format!(
                "[slot {}] {} (score {:.3}, {})",
                r.slot_id,
                if r.passed { "PASS" } else { "FAIL" },
                r.score,
                r.method
            );
            std::iter::once(verdict).chain(
                r.diagnostics
                    .iter()
                    .map(move |d| format!("[slot {}] {d}", r.slot_id)),
            )
        })
        .collect();
    Summary {
        passed: passed_count == results.len(),
        passed_count,
        total: results.len(),
        log,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} slots passed)",
            if self.passed { "PASS" } else { "FAIL" },
            self.passed_count,
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_inspect_core::Rect;
    use slot_inspect_eval::Slot;

    fn result(id: u32, passed: bool, diagnostics: &[&str]) -> InspectionResult {
        let mut r = InspectionResult::failed(&Slot::new(id, Rect::new(0, 0, 10, 10)));
        r.passed = passed;
        r.score = if passed { 0.9 } else { 0.1 };
        r.diagnostics = diagnostics.iter().map(|s| s.to_string()).collect();
        r
    }

    #[test]
    fn empty_list_passes() {
        let s = aggregate(&[]);
        assert!(s.passed);
        assert_eq!((s.passed_count, s.total), (0, 0));
        assert!(s.log.is_empty());
        assert_eq!(s.to_string(), "PASS (0/0 slots passed)");
    }

    #[test]
    fn one_failure_fails_the_whole() {
        let s = aggregate(&[
            result(1, true, &["a"]),
            result(2, false, &["b", "c"]),
            result(3, true, &[]),
        ]);
        assert!(!s.passed);
        assert_eq!((s.passed_count, s.total), (2, 3));
        assert_eq!(s.log.len(), 6);
        assert!(s.log[0].starts_with("[slot 1] PASS"));
        assert_eq!(s.log[1], "[slot 1] a");
        assert_eq!(s.log[4], "[slot 2] c");
        assert!(s.log[5].starts_with("[slot 3] PASS"));
        assert_eq!(s.to_string(), "FAIL (2/3 slots passed)");
    }
}
